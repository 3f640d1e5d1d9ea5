use crate::ClassDecl;

/// The result of parsing a declaration manifest.
#[derive(Debug)]
pub struct ParsedManifest {
    pub classes: Vec<ClassDecl>,
}
