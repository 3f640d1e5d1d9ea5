/// A property declared on a handler or component class.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyDescriptor {
    pub name: String,
    /// Persistent properties survive across requests and are the ones
    /// [`Verifier::verify_properties`](crate::Verifier::verify_properties) flags.
    pub persistent: bool,
}

/// Reflection metadata for a handler or component class: its callable
/// methods and its properties, both in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassDescriptor {
    name: String,
    methods: Vec<String>,
    properties: Vec<PropertyDescriptor>,
}

impl ClassDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Declare a callable method.
    #[must_use]
    pub fn method(mut self, name: &str) -> Self {
        self.add_method(name);
        self
    }

    /// Declare a property.
    #[must_use]
    pub fn property(mut self, name: &str, persistent: bool) -> Self {
        self.add_property(name, persistent);
        self
    }

    pub(crate) fn add_method(&mut self, name: &str) {
        if self.find_method(name).is_none() {
            self.methods.push(name.to_owned());
        }
    }

    pub(crate) fn add_property(&mut self, name: &str, persistent: bool) {
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.persistent |= persistent,
            None => self.properties.push(PropertyDescriptor {
                name: name.to_owned(),
                persistent,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Look up a callable method, ignoring ASCII case. Returns the declared
    /// spelling.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<&str> {
        self.methods
            .iter()
            .find(|m| m.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Persistent properties in declaration order.
    pub fn persistent_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.persistent)
    }
}
