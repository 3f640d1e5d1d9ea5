use std::collections::BTreeMap;

use super::value::Value;

/// A dispatch request as seen by the verifier.
///
/// The verifier reads only the target handler name and the action and signal
/// parameters; everything else is payload for rule handlers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    handler: String,
    params: BTreeMap<String, Value>,
}

impl Request {
    /// Create a request for the named target handler.
    #[must_use]
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            params: BTreeMap::new(),
        }
    }

    /// Set an arbitrary parameter.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_owned(), value.into());
        self
    }

    /// Set the action under the default `"action"` key.
    #[must_use]
    pub fn action(self, action: &str) -> Self {
        self.param("action", action)
    }

    /// Set the signal under the default `"do"` key.
    #[must_use]
    pub fn signal(self, signal: &str) -> Self {
        self.param("do", signal)
    }

    /// Name of the handler the request is dispatched to.
    #[must_use]
    pub fn handler(&self) -> &str {
        &self.handler
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_reserved_keys() {
        let req = Request::new("Article")
            .action("edit")
            .signal("poll-vote")
            .param("id", 7_i64);
        assert_eq!(req.handler(), "Article");
        assert_eq!(req.get("action"), Some(&Value::from("edit")));
        assert_eq!(req.get("do"), Some(&Value::from("poll-vote")));
        assert_eq!(req.get("id"), Some(&Value::Int(7)));
        assert_eq!(req.params().len(), 3);
    }

    #[test]
    fn later_param_overwrites() {
        let req = Request::new("Article").action("view").action("edit");
        assert_eq!(req.get("action"), Some(&Value::from("edit")));
    }
}
