/// Naming conventions the verifier uses to map a request onto handler
/// methods and component paths.
///
/// The defaults match the request layout produced by
/// [`Request::action()`](crate::Request::action) and
/// [`Request::signal()`](crate::Request::signal).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Conventions {
    /// Request parameter holding the action name.
    pub action_key: String,
    /// Request parameter holding the (possibly component-qualified) signal name.
    pub signal_key: String,
    /// Action assumed when the request carries none.
    pub default_action: String,
    pub action_prefix: String,
    /// Methods with this prefix must not carry rules.
    pub render_prefix: String,
    pub signal_prefix: String,
    pub factory_prefix: String,
    /// Joins component names into a unique path and qualifies signals.
    pub separator: char,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            action_key: "action".to_owned(),
            signal_key: "do".to_owned(),
            default_action: "default".to_owned(),
            action_prefix: "action".to_owned(),
            render_prefix: "render".to_owned(),
            signal_prefix: "handle".to_owned(),
            factory_prefix: "createComponent".to_owned(),
            separator: '-',
        }
    }
}

impl Conventions {
    #[must_use]
    pub fn action_method(&self, action: &str) -> String {
        prefixed(&self.action_prefix, action)
    }

    #[must_use]
    pub fn render_method(&self, action: &str) -> String {
        prefixed(&self.render_prefix, action)
    }

    #[must_use]
    pub fn signal_method(&self, signal: &str) -> String {
        prefixed(&self.signal_prefix, signal)
    }

    #[must_use]
    pub fn factory_method(&self, component: &str) -> String {
        prefixed(&self.factory_prefix, component)
    }

    /// Whether `method` is a render-phase method.
    #[must_use]
    pub fn is_render_method(&self, method: &str) -> bool {
        method.starts_with(self.render_prefix.as_str())
    }

    /// Split a signal at the last separator into `(receiver, signal)`.
    ///
    /// Returns `None` for signals addressed to the target handler itself,
    /// including those whose receiver or signal part would be empty.
    #[must_use]
    pub fn split_signal<'a>(&self, signal: &'a str) -> Option<(&'a str, &'a str)> {
        signal
            .rsplit_once(self.separator)
            .filter(|(receiver, name)| !receiver.is_empty() && !name.is_empty())
    }
}

/// `prefix` followed by `name` with its first letter uppercased.
fn prefixed(prefix: &str, name: &str) -> String {
    let mut chars = name.chars();
    let mut out = String::with_capacity(prefix.len() + name.len());
    out.push_str(prefix);
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_uppercase_first_letter() {
        let c = Conventions::default();
        assert_eq!(c.action_method("edit"), "actionEdit");
        assert_eq!(c.render_method("default"), "renderDefault");
        assert_eq!(c.signal_method("vote"), "handleVote");
        assert_eq!(c.factory_method("commentForm"), "createComponentCommentForm");
    }

    #[test]
    fn render_prefix_detection() {
        let c = Conventions::default();
        assert!(c.is_render_method("renderView"));
        assert!(!c.is_render_method("actionView"));
    }

    #[test]
    fn split_signal_at_last_separator() {
        let c = Conventions::default();
        assert_eq!(c.split_signal("vote"), None);
        assert_eq!(c.split_signal("poll-vote"), Some(("poll", "vote")));
        assert_eq!(
            c.split_signal("sidebar-poll-vote"),
            Some(("sidebar-poll", "vote"))
        );
    }

    #[test]
    fn split_signal_needs_both_parts() {
        let c = Conventions::default();
        assert_eq!(c.split_signal("-vote"), None);
        assert_eq!(c.split_signal("poll-"), None);
        assert_eq!(c.split_signal("-"), None);
        assert_eq!(c.split_signal("poll--vote"), Some(("poll-", "vote")));
    }

    #[test]
    fn split_signal_uses_configured_separator() {
        let c = Conventions {
            separator: ':',
            ..Conventions::default()
        };
        assert_eq!(c.split_signal("poll-vote"), None);
        assert_eq!(c.split_signal("sidebar:poll:vote"), Some(("sidebar:poll", "vote")));
    }

    #[test]
    fn empty_name_yields_bare_prefix() {
        let c = Conventions::default();
        assert_eq!(c.signal_method(""), "handle");
    }
}
