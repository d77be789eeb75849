//! In-memory document tree
//!
//! [`MemoryDom`] stores nodes in an arena. Removed slots go on a free list
//! and are reused, so rebuilding the same widgets run after run keeps the
//! arena at its high-water mark. Every slot carries a generation that is
//! bumped on removal and baked into the handle, so a handle to a removed node
//! stays stale instead of aliasing the newer node in its slot.

use crate::dom::{Dom, NodeId};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        hidden: bool,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// Arena-backed [`Dom`]
#[derive(Debug, Clone)]
pub struct MemoryDom {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Empty document with a `body` root
    #[must_use]
    pub fn new() -> Self {
        let mut dom = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::from_raw(0),
        };
        dom.root = dom.alloc(NodeKind::Element {
            tag: "body".to_string(),
            attributes: IndexMap::new(),
            hidden: false,
        });
        dom
    }

    /// Number of live nodes, attached or not
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|slot| slot.data.is_some()).count()
    }

    /// Number of arena slots, live or free
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.slots.len()
    }

    /// Serialize a subtree as HTML
    ///
    /// Attributes keep insertion order and hidden elements carry
    /// `style="display: none"`, so two structurally identical trees always
    /// produce identical markup.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialize the whole document
    #[must_use]
    pub fn document_html(&self) -> String {
        self.outer_html(self.root)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.data = Some(data);
                return handle(index, slot.generation);
            }
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            data: Some(data),
        });
        handle(index, 0)
    }

    fn live_slot(&self, node: NodeId) -> Option<&Slot> {
        let (index, generation) = split(node);
        self.slots
            .get(index as usize)
            .filter(|slot| slot.generation == generation)
    }

    fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.live_slot(node).and_then(|slot| slot.data.as_ref())
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        let (index, generation) = split(node);
        self.slots
            .get_mut(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.data.as_mut())
    }

    fn is_element(&self, node: NodeId) -> bool {
        matches!(self.get(node).map(|n| &n.kind), Some(NodeKind::Element { .. }))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.get(n).and_then(|d| d.parent);
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.get(node).and_then(|d| d.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(n) = self.get_mut(node) {
            n.parent = None;
        }
    }

    fn can_adopt(&self, parent: NodeId, child: NodeId) -> bool {
        self.is_element(parent)
            && self.contains(child)
            && child != self.root
            && !self.is_ancestor_or_self(child, parent)
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let (index, generation) = split(n);
            let Some(slot) = self
                .slots
                .get_mut(index as usize)
                .filter(|slot| slot.generation == generation)
            else {
                continue;
            };
            if let Some(data) = slot.data.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index);
                stack.extend(data.children);
            }
        }
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(&escape(text, false)),
            NodeKind::Element {
                tag,
                attributes,
                hidden,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(r#" {name}="{}""#, escape(value, true)));
                }
                if *hidden {
                    out.push_str(r#" style="display: none""#);
                }
                out.push('>');
                for &child in &data.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Handle layout: generation in the high half, slot index in the low half
fn handle(index: u32, generation: u32) -> NodeId {
    NodeId::from_raw((u64::from(generation) << 32) | u64::from(index))
}

fn split(node: NodeId) -> (u32, u32) {
    let raw = node.raw();
    let index = u32::try_from(raw & u64::from(u32::MAX)).unwrap_or(u32::MAX);
    let generation = u32::try_from(raw >> 32).unwrap_or(u32::MAX);
    (index, generation)
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

impl Dom for MemoryDom {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attributes: IndexMap::new(),
            hidden: false,
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        match &self.get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node).map(|d| d.children.clone()).unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.get(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(NodeKind::Element { attributes, .. }) = self.get_mut(node).map(|d| &mut d.kind) {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(NodeKind::Element { attributes, .. }) = self.get_mut(node).map(|d| &mut d.kind) {
            attributes.shift_remove(name);
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        self.subtree(node)
            .into_iter()
            .filter_map(|n| match &self.get(n)?.kind {
                NodeKind::Text(text) => Some(text.as_str()),
                NodeKind::Element { .. } => None,
            })
            .collect()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if !self.contains(node) {
            return;
        }
        if let Some(NodeKind::Text(existing)) = self.get_mut(node).map(|d| &mut d.kind) {
            *existing = text.to_string();
            return;
        }
        self.clear_children(node);
        let text_node = self.create_text(text);
        self.append_child(node, text_node);
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.can_adopt(parent, child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.can_adopt(parent, child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.get_mut(parent) {
            p.children.insert(0, child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.root || !self.contains(node) {
            return;
        }
        self.detach(node);
        self.free_subtree(node);
    }

    fn clear_children(&mut self, node: NodeId) {
        for child in self.children(node) {
            self.remove(child);
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(NodeKind::Element { hidden, .. }) = self.get_mut(node).map(|d| &mut d.kind) {
            *hidden = !visible;
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        match self.get(node).map(|d| &d.kind) {
            Some(NodeKind::Element { hidden, .. }) => !hidden,
            Some(NodeKind::Text(_)) => true,
            None => false,
        }
    }

    fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }
}
