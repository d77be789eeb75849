//! Document tree capability
//!
//! [`Dom`] is the minimal surface the renderers need from a live page. Node
//! handles may go stale when the host mutates the page behind our back; every
//! operation on a stale handle is a no-op and every query returns nothing.

/// Opaque handle to a node of a document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a host-specific node key
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Host-specific node key
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Mutable document tree
///
/// Required methods are the primitive operations a host must provide; the
/// provided methods (class handling, scoped lookups) are built on them.
pub trait Dom {
    /// Root element of the document (the page body)
    fn root(&self) -> NodeId;

    /// Create a detached element
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Create a detached text node
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Element tag, `None` for text nodes and stale handles
    fn tag(&self, node: NodeId) -> Option<String>;

    /// Parent node
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Child nodes in order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Attribute value
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Set an attribute, replacing any previous value
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Remove an attribute
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Concatenated text of the subtree
    fn text_content(&self, node: NodeId) -> String;

    /// Replace all children with a single text node
    fn set_text(&mut self, node: NodeId, text: &str);

    /// Move `child` to the end of `parent`'s children
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Move `child` to the front of `parent`'s children
    fn prepend_child(&mut self, parent: NodeId, child: NodeId);

    /// Detach and discard a subtree
    fn remove(&mut self, node: NodeId);

    /// Discard every child subtree
    fn clear_children(&mut self, node: NodeId);

    /// Set the node's visibility style
    fn set_visible(&mut self, node: NodeId, visible: bool);

    /// Visibility style of the node itself (ancestors are not considered)
    fn is_visible(&self, node: NodeId) -> bool;

    /// Whether the handle is live
    fn contains(&self, node: NodeId) -> bool;

    /// Element id
    fn id_of(&self, node: NodeId) -> Option<String> {
        self.attribute(node, "id")
    }

    /// Set element id
    fn set_id(&mut self, node: NodeId, id: &str) {
        self.set_attribute(node, "id", id);
    }

    /// Whether the node is reachable from the root
    fn is_attached(&self, node: NodeId) -> bool {
        let root = self.root();
        let mut current = Some(node);
        while let Some(n) = current {
            if n == root {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Pre-order list of `scope` and every node below it
    fn subtree(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(node) = stack.pop() {
            if !self.contains(node) {
                continue;
            }
            out.push(node);
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    /// First attached element carrying `id`
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_by_id_within(self.root(), id)
    }

    /// First element carrying `id` inside `scope` (inclusive)
    fn find_by_id_within(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.subtree(scope)
            .into_iter()
            .find(|&node| self.id_of(node).as_deref() == Some(id))
    }

    /// Whether the element has `class`
    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Add `class` unless already present
    fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.contains(node) || self.has_class(node, class) {
            return;
        }
        let classes = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &classes);
    }

    /// Remove `class` if present
    fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(existing) = self.attribute(node, "class") else {
            return;
        };
        let kept: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        if kept.is_empty() {
            self.remove_attribute(node, "class");
        } else {
            self.set_attribute(node, "class", &kept.join(" "));
        }
    }

    /// First element with `class` inside `scope` (inclusive)
    fn find_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.subtree(scope)
            .into_iter()
            .find(|&node| self.has_class(node, class))
    }

    /// Every element with `class` inside `scope` (inclusive)
    fn find_all_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.subtree(scope)
            .into_iter()
            .filter(|&node| self.has_class(node, class))
            .collect()
    }

    /// Create an element with a class and optional text
    fn build(&mut self, tag: &str, class: Option<&str>, text: Option<&str>) -> NodeId {
        let node = self.create_element(tag);
        if let Some(class) = class {
            self.set_attribute(node, "class", class);
        }
        if let Some(text) = text {
            self.set_text(node, text);
        }
        node
    }
}
