//! Render-tree boundary.
//!
//! Components never touch a concrete document; they go through
//! [`RenderSurface`], whose operations report a missing element by returning
//! `false` so callers can skip the update instead of failing. [`RenderTree`]
//! is the in-memory implementation used by the service and by tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Id of the implicit root every tree starts with.
pub const ROOT_ID: &str = "body";

/// Element to insert under an existing parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewElement {
    pub id: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub markup: String,
}

impl NewElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = markup.into();
        self
    }
}

pub trait RenderSurface: Send + Sync {
    fn contains(&self, id: &str) -> bool;

    /// Appends `element` as the last child of `parent_id`. Fails when the
    /// parent is missing or the id is already taken.
    fn append(&self, parent_id: &str, element: NewElement) -> bool;

    /// Removes the element and its whole subtree.
    fn remove(&self, id: &str) -> bool;

    fn set_class(&self, id: &str, class: &str, enabled: bool) -> bool;

    fn focus(&self, id: &str) -> bool;

    fn children(&self, id: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Default)]
struct Node {
    parent: Option<String>,
    children: Vec<String>,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
    markup: String,
}

#[derive(Debug, Default)]
struct TreeState {
    nodes: HashMap<String, Node>,
    focused: Option<String>,
}

/// Thread-safe in-memory document.
#[derive(Debug)]
pub struct RenderTree {
    state: Mutex<TreeState>,
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTree {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(ROOT_ID.to_string(), Node::default());
        Self {
            state: Mutex::new(TreeState {
                nodes,
                focused: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TreeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn classes(&self, id: &str) -> Vec<String> {
        self.lock()
            .nodes
            .get(id)
            .map(|node| node.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.lock()
            .nodes
            .get(id)
            .is_some_and(|node| node.classes.contains(class))
    }

    pub fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.lock()
            .nodes
            .get(id)
            .and_then(|node| node.attributes.get(name).cloned())
    }

    pub fn markup(&self, id: &str) -> Option<String> {
        self.lock().nodes.get(id).map(|node| node.markup.clone())
    }

    pub fn focused(&self) -> Option<String> {
        self.lock().focused.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl RenderSurface for RenderTree {
    fn contains(&self, id: &str) -> bool {
        self.lock().nodes.contains_key(id)
    }

    fn append(&self, parent_id: &str, element: NewElement) -> bool {
        let mut state = self.lock();
        if state.nodes.contains_key(&element.id) {
            return false;
        }
        let Some(parent) = state.nodes.get_mut(parent_id) else {
            return false;
        };
        parent.children.push(element.id.clone());

        state.nodes.insert(
            element.id,
            Node {
                parent: Some(parent_id.to_string()),
                children: Vec::new(),
                classes: element.classes.into_iter().collect(),
                attributes: element.attributes.into_iter().collect(),
                markup: element.markup,
            },
        );
        true
    }

    fn remove(&self, id: &str) -> bool {
        if id == ROOT_ID {
            return false;
        }

        let mut state = self.lock();
        let Some(node) = state.nodes.remove(id) else {
            return false;
        };

        if let Some(parent) = node.parent.as_ref().and_then(|p| state.nodes.get_mut(p)) {
            parent.children.retain(|child| child != id);
        }

        let mut stack = node.children;
        let mut removed = vec![id.to_string()];
        while let Some(child_id) = stack.pop() {
            if let Some(child) = state.nodes.remove(&child_id) {
                stack.extend(child.children);
            }
            removed.push(child_id);
        }

        if state
            .focused
            .as_ref()
            .is_some_and(|focused| removed.contains(focused))
        {
            state.focused = None;
        }
        true
    }

    fn set_class(&self, id: &str, class: &str, enabled: bool) -> bool {
        let mut state = self.lock();
        let Some(node) = state.nodes.get_mut(id) else {
            return false;
        };
        if enabled {
            node.classes.insert(class.to_string());
        } else {
            node.classes.remove(class);
        }
        true
    }

    fn focus(&self, id: &str) -> bool {
        let mut state = self.lock();
        if !state.nodes.contains_key(id) {
            return false;
        }
        state.focused = Some(id.to_string());
        true
    }

    fn children(&self, id: &str) -> Vec<String> {
        self.lock()
            .nodes
            .get(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_requires_existing_parent() {
        let tree = RenderTree::new();
        assert!(!tree.append("missing", NewElement::new("child")));
        assert!(tree.append(ROOT_ID, NewElement::new("child")));
        assert!(!tree.append(ROOT_ID, NewElement::new("child")));
        assert_eq!(tree.children(ROOT_ID), vec!["child".to_string()]);
    }

    #[test]
    fn test_remove_drops_subtree_and_focus() {
        let tree = RenderTree::new();
        tree.append(ROOT_ID, NewElement::new("panel"));
        tree.append("panel", NewElement::new("button"));
        assert!(tree.focus("button"));

        assert!(tree.remove("panel"));
        assert!(!tree.contains("button"));
        assert_eq!(tree.focused(), None);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let tree = RenderTree::new();
        assert!(!tree.remove(ROOT_ID));
    }

    #[test]
    fn test_set_class_on_missing_element_is_reported() {
        let tree = RenderTree::new();
        tree.append(ROOT_ID, NewElement::new("item").class("a"));
        assert!(tree.set_class("item", "b", true));
        assert!(tree.set_class("item", "a", false));
        assert_eq!(tree.classes("item"), vec!["b".to_string()]);
        assert!(!tree.set_class("ghost", "b", true));
    }
}
