//! Declaration manifest parsing.
//!
//! A manifest lists classes, the handler names they serve, and the rules
//! declared on each class, method and property:
//!
//! ```text
//! # comments run to the end of the line
//! class ArticlePresenter (handler "Article"):
//!     rule LoggedIn
//!     method actionEdit:
//!         rule Allowed(resource: "article", privilege: "edit")
//!     method renderDefault
//!     persistent property privilege:
//!         rule Enabled("$privilege")
//! ```
//!
//! Class-level rules come before the first member; every `rule` after a
//! member belongs to that member. A bare argument is stored under `value`.

mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::ParsedManifest;

/// Parse a manifest string into class declarations.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid manifest.
pub fn parse(input: &str) -> Result<ParsedManifest, ParseError> {
    use winnow::Parser;
    grammar::parse_manifest
        .parse(input)
        .map_err(|e| ParseError::at(input, e.offset(), e.inner().to_string()))
}
