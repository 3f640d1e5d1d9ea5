use std::collections::BTreeMap;
use std::sync::Arc;

use super::class::ClassDescriptor;
use super::conventions::Conventions;

/// A node of the handler's component tree, as far as verification needs it.
pub trait Component {
    /// Path of this component within its tree, names joined by the
    /// configured [`separator`](crate::Conventions::separator).
    /// The root handler has an empty id.
    fn unique_id(&self) -> &str;

    fn class(&self) -> &ClassDescriptor;

    /// Whether the component has a parent, i.e. is not the root handler.
    fn is_attached(&self) -> bool;

    /// Store the verification outcome for a persistent property.
    fn set_flag(&mut self, property: &str, value: bool);

    /// Component path handed to rule handlers: the unique id for attached
    /// components, nothing for the root handler.
    fn component_path(&self) -> Option<&str> {
        if self.is_attached() {
            Some(self.unique_id())
        } else {
            None
        }
    }
}

/// A plain [`Component`] that records property flags in a map.
#[derive(Debug, Clone)]
pub struct ComponentNode {
    path: String,
    separator: char,
    class: Arc<ClassDescriptor>,
    attached: bool,
    flags: BTreeMap<String, bool>,
}

impl ComponentNode {
    /// The root of a tree: the target handler itself. Paths below it are
    /// joined by the default separator `-`.
    #[must_use]
    pub fn root(class: Arc<ClassDescriptor>) -> Self {
        Self {
            path: String::new(),
            separator: '-',
            class,
            attached: false,
            flags: BTreeMap::new(),
        }
    }

    /// The root of a tree whose paths are joined by `conventions.separator`,
    /// so they line up with the verifier's signal addressing.
    #[must_use]
    pub fn root_with(class: Arc<ClassDescriptor>, conventions: &Conventions) -> Self {
        Self {
            separator: conventions.separator,
            ..Self::root(class)
        }
    }

    /// A child component named `name` below this node. Children inherit the
    /// node's separator.
    #[must_use]
    pub fn child(&self, name: &str, class: Arc<ClassDescriptor>) -> Self {
        let path = if self.path.is_empty() {
            name.to_owned()
        } else {
            format!("{}{}{name}", self.path, self.separator)
        };
        Self {
            path,
            separator: self.separator,
            class,
            attached: true,
            flags: BTreeMap::new(),
        }
    }

    /// The flag last written for `property`, if any.
    #[must_use]
    pub fn flag(&self, property: &str) -> Option<bool> {
        self.flags.get(property).copied()
    }

    #[must_use]
    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }
}

impl Component for ComponentNode {
    fn unique_id(&self) -> &str {
        &self.path
    }

    fn class(&self) -> &ClassDescriptor {
        &self.class
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_flag(&mut self, property: &str, value: bool) {
        self.flags.insert(property.to_owned(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> Arc<ClassDescriptor> {
        Arc::new(ClassDescriptor::new(name))
    }

    #[test]
    fn root_has_no_component_path() {
        let root = ComponentNode::root(class("ArticlePresenter"));
        assert_eq!(root.unique_id(), "");
        assert!(!root.is_attached());
        assert_eq!(root.component_path(), None);
    }

    #[test]
    fn child_paths_join_names() {
        let root = ComponentNode::root(class("ArticlePresenter"));
        let sidebar = root.child("sidebar", class("Sidebar"));
        let poll = sidebar.child("poll", class("PollControl"));
        assert_eq!(sidebar.unique_id(), "sidebar");
        assert_eq!(poll.unique_id(), "sidebar-poll");
        assert_eq!(poll.component_path(), Some("sidebar-poll"));
        assert_eq!(poll.class().name(), "PollControl");
    }

    #[test]
    fn child_paths_follow_configured_separator() {
        let conventions = Conventions {
            separator: ':',
            ..Conventions::default()
        };
        let root = ComponentNode::root_with(class("ArticlePresenter"), &conventions);
        let poll = root
            .child("sidebar", class("Sidebar"))
            .child("poll", class("PollControl"));
        assert_eq!(poll.unique_id(), "sidebar:poll");
        assert_eq!(
            conventions.split_signal("sidebar:poll:vote"),
            Some((poll.unique_id(), "vote"))
        );
    }

    #[test]
    fn flags_are_recorded() {
        let mut node = ComponentNode::root(class("Block"));
        assert_eq!(node.flag("privilege"), None);
        node.set_flag("privilege", false);
        node.set_flag("privilege", true);
        assert_eq!(node.flag("privilege"), Some(true));
        assert_eq!(node.flags().len(), 1);
    }
}
