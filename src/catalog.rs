use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::{CatalogError, ClassDescriptor, ClassLocator, Rule, RuleProvider, Target};

/// What kind of class member a [`MemberDecl`] declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemberKind {
    Method,
    Property { persistent: bool },
}

/// A method or property declaration with its rules.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberDecl {
    pub kind: MemberKind,
    pub name: String,
    pub rules: Vec<Rule>,
}

/// A class declaration: optional handler name, class-level rules, members.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassDecl {
    pub name: String,
    pub handler: Option<String>,
    pub rules: Vec<Rule>,
    pub members: Vec<MemberDecl>,
}

/// Builder for a [`Catalog`].
///
/// # Example
///
/// ```
/// use gatehouse::{CatalogBuilder, Rule, Target};
///
/// let catalog = CatalogBuilder::new()
///     .class("ArticlePresenter", |c| {
///         c.handler("Article")
///             .rule(Rule::new("LoggedIn"))
///             .method("actionEdit", |m| m.rule(Rule::new("Allowed").param("privilege", "edit")))
///             .method("renderDefault", |m| m)
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(catalog.rules_for(&Target::class("ArticlePresenter")).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    classes: Vec<ClassDecl>,
}

/// Collects the declarations of one class.
#[derive(Debug)]
pub struct ClassBuilder {
    decl: ClassDecl,
}

/// Collects the rules of one member.
#[derive(Debug, Default)]
pub struct RulesBuilder {
    rules: Vec<Rule>,
}

impl CatalogBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class. The closure adds its handler name, rules and members.
    #[must_use]
    pub fn class(mut self, name: &str, f: impl FnOnce(ClassBuilder) -> ClassBuilder) -> Self {
        let builder = f(ClassBuilder {
            decl: ClassDecl {
                name: name.to_owned(),
                handler: None,
                rules: Vec::new(),
                members: Vec::new(),
            },
        });
        self.classes.push(builder.decl);
        self
    }

    /// Add an already assembled declaration.
    #[must_use]
    pub fn declaration(mut self, decl: ClassDecl) -> Self {
        self.classes.push(decl);
        self
    }

    /// # Errors
    ///
    /// Returns [`CatalogError`] on duplicate classes, handler names or members.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        Catalog::assemble(self.classes)
    }
}

impl ClassBuilder {
    /// Bind the class to a handler name requests can address it by.
    #[must_use]
    pub fn handler(mut self, name: &str) -> Self {
        self.decl.handler = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.decl.rules.push(rule);
        self
    }

    #[must_use]
    pub fn method(self, name: &str, f: impl FnOnce(RulesBuilder) -> RulesBuilder) -> Self {
        self.member(MemberKind::Method, name, f)
    }

    #[must_use]
    pub fn property(self, name: &str, f: impl FnOnce(RulesBuilder) -> RulesBuilder) -> Self {
        self.member(MemberKind::Property { persistent: false }, name, f)
    }

    #[must_use]
    pub fn persistent(self, name: &str, f: impl FnOnce(RulesBuilder) -> RulesBuilder) -> Self {
        self.member(MemberKind::Property { persistent: true }, name, f)
    }

    fn member(
        mut self,
        kind: MemberKind,
        name: &str,
        f: impl FnOnce(RulesBuilder) -> RulesBuilder,
    ) -> Self {
        self.decl.members.push(MemberDecl {
            kind,
            name: name.to_owned(),
            rules: f(RulesBuilder::default()).rules,
        });
        self
    }
}

impl RulesBuilder {
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Static registration table of classes and their declared rules.
///
/// Serves as both the [`RuleProvider`] and the [`ClassLocator`] of a
/// verifier. Immutable once built.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) declarations: Vec<ClassDecl>,
    classes: HashMap<String, Arc<ClassDescriptor>>,
    handlers: HashMap<String, String>,
    rules: HashMap<Target, Vec<Rule>>,
}

impl Catalog {
    /// Parse a declaration manifest and build a catalog from it.
    ///
    /// # Errors
    ///
    /// Returns [`GatehouseError`](crate::GatehouseError) on parse or catalog errors.
    pub fn from_manifest(input: &str) -> Result<Self, crate::GatehouseError> {
        let parsed = crate::parse::parse(input)?;
        Ok(Self::assemble(parsed.classes)?)
    }

    /// Read a manifest file and build a catalog from it.
    ///
    /// # Errors
    ///
    /// Returns [`GatehouseError`](crate::GatehouseError) on I/O, parse, or
    /// catalog errors.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::GatehouseError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_manifest(&input)
    }

    pub(crate) fn assemble(declarations: Vec<ClassDecl>) -> Result<Self, CatalogError> {
        let mut classes = HashMap::new();
        let mut handlers = HashMap::new();
        let mut rules = HashMap::new();

        for decl in &declarations {
            if classes.contains_key(&decl.name) {
                return Err(CatalogError::DuplicateClass {
                    name: decl.name.clone(),
                });
            }
            if let Some(handler) = &decl.handler {
                if let Some(bound) = handlers.insert(handler.clone(), decl.name.clone()) {
                    return Err(CatalogError::DuplicateHandler {
                        name: handler.clone(),
                        class: bound,
                    });
                }
            }

            let mut class = ClassDescriptor::new(decl.name.as_str());
            let mut seen = HashSet::new();
            if !decl.rules.is_empty() {
                rules.insert(Target::class(decl.name.as_str()), decl.rules.clone());
            }
            for member in &decl.members {
                if !seen.insert(member.name.to_ascii_lowercase()) {
                    return Err(CatalogError::DuplicateMember {
                        class: decl.name.clone(),
                        member: member.name.clone(),
                    });
                }
                let target = match member.kind {
                    MemberKind::Method => {
                        class.add_method(&member.name);
                        Target::method(decl.name.as_str(), member.name.as_str())
                    }
                    MemberKind::Property { persistent } => {
                        class.add_property(&member.name, persistent);
                        Target::property(decl.name.as_str(), member.name.as_str())
                    }
                };
                if !member.rules.is_empty() {
                    rules.insert(target, member.rules.clone());
                }
            }
            classes.insert(decl.name.clone(), Arc::new(class));
        }

        Ok(Self {
            declarations,
            classes,
            handlers,
            rules,
        })
    }

    /// Class descriptor by class name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    /// Declared rules of `target`, empty when nothing is declared.
    #[must_use]
    pub fn rules_for(&self, target: &Target) -> &[Rule] {
        self.rules.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Declarations in the order they were added.
    #[must_use]
    pub fn declarations(&self) -> &[ClassDecl] {
        &self.declarations
    }

    /// Number of declared classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

impl RuleProvider for Catalog {
    fn rules(&self, target: &Target) -> Vec<Rule> {
        self.rules_for(target).to_vec()
    }
}

impl ClassLocator for Catalog {
    fn class_of(&self, handler: &str) -> Option<Arc<ClassDescriptor>> {
        let class = self.handlers.get(handler)?;
        self.classes.get(class).cloned()
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Catalog({} classes, {} handlers, {} rules)",
            self.classes.len(),
            self.handlers.len(),
            self.rule_count(),
        )
    }
}

#[cfg(feature = "binary-cache")]
impl Catalog {
    /// Serialize the catalog's declarations to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) into the payload so
    /// callers can tell when the manifest changed and the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Rebuild a catalog from bytes produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
