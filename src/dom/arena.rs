//! Arena-based DOM for rendered reading markup.
//!
//! Nodes live in one contiguous vector and link to each other by index, so
//! a [`ArenaNodeId`] stays valid for the lifetime of the tree no matter how
//! nodes are moved around. Verse extraction relies on that: it records node
//! ids for verse owners and later moves content under new wrapper spans
//! without invalidating anything it already handed out.

use std::collections::HashMap;

use html5ever::{LocalName, QualName, ns};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaNodeId(pub u32);

impl ArenaNodeId {
    /// Sentinel value for no node.
    pub const NONE: ArenaNodeId = ArenaNodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    fn into_option(self) -> Option<ArenaNodeId> {
        self.is_some().then_some(self)
    }
}

/// Node type in the arena DOM.
#[derive(Debug, Clone)]
pub enum ArenaNodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-extracted id, kept in sync with the `id` attribute.
        id: Option<String>,
        /// Pre-extracted classes, kept in sync with the `class` attribute.
        classes: Vec<String>,
    },
    Text(String),
    Comment(String),
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Build an attribute in the null namespace, as the HTML parser does.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }
}

/// A node in the arena DOM.
#[derive(Debug)]
pub struct ArenaNode {
    pub data: ArenaNodeData,
    pub parent: ArenaNodeId,
    pub first_child: ArenaNodeId,
    pub last_child: ArenaNodeId,
    pub prev_sibling: ArenaNodeId,
    pub next_sibling: ArenaNodeId,
}

impl ArenaNode {
    fn new(data: ArenaNodeData) -> Self {
        Self {
            data,
            parent: ArenaNodeId::NONE,
            first_child: ArenaNodeId::NONE,
            last_child: ArenaNodeId::NONE,
            prev_sibling: ArenaNodeId::NONE,
            next_sibling: ArenaNodeId::NONE,
        }
    }
}

/// Arena-based DOM tree.
///
/// Detached nodes stay allocated; only their links are cleared. Counting
/// nodes reachable from the document (see [`ArenaDom::attached_len`]) is
/// therefore the way to observe structural changes.
#[derive(Debug)]
pub struct ArenaDom {
    nodes: Vec<ArenaNode>,
    document: ArenaNodeId,
    /// Map from id attribute to node ID for fast lookup.
    id_map: HashMap<String, ArenaNodeId>,
}

impl ArenaDom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: ArenaNodeId::NONE,
            id_map: HashMap::new(),
        };
        dom.document = dom.alloc(ArenaNode::new(ArenaNodeData::Document));
        dom
    }

    fn alloc(&mut self, node: ArenaNode) -> ArenaNodeId {
        let id = ArenaNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn document(&self) -> ArenaNodeId {
        self.document
    }

    pub fn get(&self, id: ArenaNodeId) -> Option<&ArenaNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ArenaNodeId) -> Option<&mut ArenaNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a new element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> ArenaNodeId {
        let mut id = None;
        let mut classes = Vec::new();

        for attr in &attrs {
            if attr.name.local.as_ref() == "id" {
                id = Some(attr.value.clone());
            } else if attr.name.local.as_ref() == "class" {
                classes = split_classes(&attr.value);
            }
        }

        let node_id = self.alloc(ArenaNode::new(ArenaNodeData::Element {
            name,
            attrs,
            id: id.clone(),
            classes,
        }));

        if let Some(id_str) = id {
            self.id_map.entry(id_str).or_insert(node_id);
        }

        node_id
    }

    /// Create an unattached HTML element by tag name.
    pub fn create_html_element(&mut self, tag: &str, attrs: Vec<Attribute>) -> ArenaNodeId {
        self.create_element(QualName::new(None, ns!(html), LocalName::from(tag)), attrs)
    }

    pub fn create_text(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Comment(text)))
    }

    pub fn create_doctype(
        &mut self,
        name: String,
        public_id: String,
        system_id: String,
    ) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Append a child to a parent node, detaching it from any old position.
    pub fn append(&mut self, parent: ArenaNodeId, child: ArenaNodeId) {
        self.detach(child);

        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(ArenaNodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling, detaching it from any old position.
    pub fn insert_before(&mut self, sibling: ArenaNodeId, new_node: ArenaNodeId) {
        self.detach(new_node);

        let Some((parent, prev)) = self.get(sibling).map(|n| (n.parent, n.prev_sibling)) else {
            return;
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Insert a node immediately after a sibling.
    pub fn insert_after(&mut self, sibling: ArenaNodeId, new_node: ArenaNodeId) {
        match self.next_sibling(sibling) {
            Some(next) => self.insert_before(next, new_node),
            None => {
                if let Some(parent) = self.parent(sibling) {
                    self.append(parent, new_node);
                }
            }
        }
    }

    /// Unlink a node from its parent and siblings. Its subtree stays intact.
    pub fn detach(&mut self, target: ArenaNodeId) {
        let Some((parent, prev, next)) = self
            .get(target)
            .map(|n| (n.parent, n.prev_sibling, n.next_sibling))
        else {
            return;
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent)
            && p.first_child == target
        {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent)
            && p.last_child == target
        {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = ArenaNodeId::NONE;
            node.prev_sibling = ArenaNodeId::NONE;
            node.next_sibling = ArenaNodeId::NONE;
        }
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: ArenaNodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(ArenaNodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let ArenaNodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Get node by id attribute.
    pub fn get_by_id(&self, id: &str) -> Option<ArenaNodeId> {
        self.id_map.get(id).copied()
    }

    /// Number of allocated nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Number of nodes reachable from the document root, root included.
    pub fn attached_len(&self) -> usize {
        1 + self.descendants(self.document).count()
    }

    pub fn parent(&self, id: ArenaNodeId) -> Option<ArenaNodeId> {
        self.get(id).and_then(|n| n.parent.into_option())
    }

    pub fn next_sibling(&self, id: ArenaNodeId) -> Option<ArenaNodeId> {
        self.get(id).and_then(|n| n.next_sibling.into_option())
    }

    pub fn prev_sibling(&self, id: ArenaNodeId) -> Option<ArenaNodeId> {
        self.get(id).and_then(|n| n.prev_sibling.into_option())
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: ArenaNodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(ArenaNodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Iterate over all descendants of `root` in document order, excluding `root`.
    pub fn descendants(&self, root: ArenaNodeId) -> Descendants<'_> {
        let first = self
            .get(root)
            .map(|n| n.first_child)
            .unwrap_or(ArenaNodeId::NONE);
        Descendants {
            dom: self,
            root,
            next: first,
        }
    }

    /// Whether `node` is `ancestor` or lies somewhere beneath it.
    pub fn contains(&self, ancestor: ArenaNodeId, node: ArenaNodeId) -> bool {
        let mut current = node.into_option();
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nearest node, starting at `id` itself and walking up, that matches.
    ///
    /// The walk stops after `limit` (inclusive) so lookups never escape the
    /// content root they were scoped to.
    pub fn closest<F>(&self, id: ArenaNodeId, limit: ArenaNodeId, predicate: F) -> Option<ArenaNodeId>
    where
        F: Fn(&ArenaDom, ArenaNodeId) -> bool,
    {
        let mut current = id.into_option();
        while let Some(node) = current {
            if predicate(self, node) {
                return Some(node);
            }
            if node == limit {
                return None;
            }
            current = self.parent(node);
        }
        None
    }

    /// Find the first node matching a predicate (DFS from the document).
    pub fn find<F>(&self, predicate: F) -> Option<ArenaNodeId>
    where
        F: Fn(&ArenaNode) -> bool,
    {
        self.descendants(self.document)
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    /// Find element by tag name (first match).
    pub fn find_by_tag(&self, tag: &str) -> Option<ArenaNodeId> {
        self.find(|node| {
            if let ArenaNodeData::Element { name, .. } = &node.data {
                name.local.as_ref() == tag
            } else {
                false
            }
        })
    }

    /// Find the first element carrying `class` (DFS from the document).
    pub fn find_by_class(&self, class: &str) -> Option<ArenaNodeId> {
        self.descendants(self.document)
            .find(|&id| self.has_class(id, class))
    }
}

impl Default for ArenaDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a ArenaDom,
    current: ArenaNodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(ArenaNodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over a subtree, without allocating a stack.
pub struct Descendants<'a> {
    dom: &'a ArenaDom,
    root: ArenaNodeId,
    next: ArenaNodeId,
}

impl Iterator for Descendants<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.into_option()?;
        let node = self.dom.get(current)?;

        self.next = if node.first_child.is_some() {
            node.first_child
        } else {
            let mut climb = current;
            loop {
                if climb == self.root {
                    break ArenaNodeId::NONE;
                }
                let Some(n) = self.dom.get(climb) else {
                    break ArenaNodeId::NONE;
                };
                if n.next_sibling.is_some() {
                    break n.next_sibling;
                }
                climb = n.parent;
                if climb.is_none() {
                    break ArenaNodeId::NONE;
                }
            }
        };

        Some(current)
    }
}

/// Convenience methods for element nodes.
impl ArenaDom {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: ArenaNodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Whether the node is an element with the given tag.
    pub fn is_tag(&self, id: ArenaNodeId, tag: &str) -> bool {
        self.element_name(id).is_some_and(|n| n.as_ref() == tag)
    }

    pub fn get_attr(&self, id: ArenaNodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Set (or overwrite) an attribute, keeping the id/class caches in sync.
    pub fn set_attr(&mut self, id: ArenaNodeId, attr_name: &str, value: &str) {
        let mut new_id = None;
        if let Some(node) = self.get_mut(id)
            && let ArenaNodeData::Element {
                attrs,
                id: cached_id,
                classes,
                ..
            } = &mut node.data
        {
            match attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
                Some(existing) => existing.value = value.to_string(),
                None => attrs.push(Attribute::new(attr_name, value)),
            }
            match attr_name {
                "class" => *classes = split_classes(value),
                "id" => {
                    *cached_id = Some(value.to_string());
                    new_id = Some(value.to_string());
                }
                _ => {}
            }
        }
        if let Some(key) = new_id {
            self.id_map.insert(key, id);
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, id: ArenaNodeId, attr_name: &str) {
        if let Some(node) = self.get_mut(id)
            && let ArenaNodeData::Element { attrs, classes, .. } = &mut node.data
        {
            attrs.retain(|a| a.name.local.as_ref() != attr_name);
            if attr_name == "class" {
                classes.clear();
            }
        }
    }

    pub fn element_id(&self, id: ArenaNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { id, .. } => id.as_deref(),
            _ => None,
        })
    }

    pub fn element_classes(&self, id: ArenaNodeId) -> &[String] {
        static EMPTY: &[String] = &[];
        self.get(id)
            .and_then(|n| match &n.data {
                ArenaNodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(EMPTY)
    }

    pub fn has_class(&self, id: ArenaNodeId, class: &str) -> bool {
        self.element_classes(id).iter().any(|c| c == class)
    }

    /// Whether the element carries any of the given classes.
    pub fn has_any_class(&self, id: ArenaNodeId, classes: &[String]) -> bool {
        self.element_classes(id)
            .iter()
            .any(|c| classes.iter().any(|wanted| wanted == c))
    }

    /// Add a class. Returns `false` if the node is not an element or already had it.
    pub fn add_class(&mut self, id: ArenaNodeId, class: &str) -> bool {
        if !self.is_element(id) || self.has_class(id, class) {
            return false;
        }
        let mut classes = self.element_classes(id).to_vec();
        classes.push(class.to_string());
        self.set_attr(id, "class", &classes.join(" "));
        true
    }

    /// Remove a class. Returns `false` if the node did not carry it.
    pub fn remove_class(&mut self, id: ArenaNodeId, class: &str) -> bool {
        if !self.has_class(id, class) {
            return false;
        }
        let classes: Vec<_> = self
            .element_classes(id)
            .iter()
            .filter(|c| *c != class)
            .cloned()
            .collect();
        if classes.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", &classes.join(" "));
        }
        true
    }

    pub fn is_element(&self, id: ArenaNodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, ArenaNodeData::Element { .. }))
    }

    pub fn is_text(&self, id: ArenaNodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, ArenaNodeData::Text(_)))
    }

    /// Get text content of a text node.
    pub fn text_content(&self, id: ArenaNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of a subtree, like the DOM's `textContent`.
    pub fn subtree_text(&self, id: ArenaNodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out, &|_, _| false);
        out
    }

    /// Append the subtree's text to `out`, skipping every subtree whose
    /// root satisfies `skip`. The tree itself is left untouched.
    pub fn collect_text<F>(&self, id: ArenaNodeId, out: &mut String, skip: &F)
    where
        F: Fn(&ArenaDom, ArenaNodeId) -> bool,
    {
        if skip(self, id) {
            return;
        }
        if let Some(text) = self.text_content(id) {
            out.push_str(text);
            return;
        }
        for child in self.children(id) {
            self.collect_text(child, out, skip);
        }
    }
}

fn split_classes(value: &str) -> Vec<String> {
    value.split_whitespace().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn div(dom: &mut ArenaDom, attrs: Vec<Attribute>) -> ArenaNodeId {
        dom.create_html_element("div", attrs)
    }

    #[test]
    fn test_create_elements() {
        let mut dom = ArenaDom::new();
        let node = div(&mut dom, vec![Attribute::new("id", "main")]);
        let document = dom.document();
        dom.append(document, node);

        assert_eq!(dom.element_name(node).unwrap().as_ref(), "div");
        assert_eq!(dom.element_id(node), Some("main"));
        assert_eq!(dom.get_by_id("main"), Some(node));
    }

    #[test]
    fn test_text_merging() {
        let mut dom = ArenaDom::new();
        let p = dom.create_html_element("p", vec![]);
        let document = dom.document();
        dom.append(document, p);

        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World!");

        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(dom.text_content(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_insert_after_and_move() {
        let mut dom = ArenaDom::new();
        let p = dom.create_html_element("p", vec![]);
        let document = dom.document();
        dom.append(document, p);
        let a = dom.create_text("a".into());
        let b = dom.create_text("b".into());
        let c = dom.create_text("c".into());
        dom.append(p, a);
        dom.append(p, b);

        dom.insert_after(a, c);
        assert_eq!(dom.children(p).collect::<Vec<_>>(), vec![a, c, b]);

        // Moving an attached node unlinks it from its old position first.
        dom.append(p, a);
        assert_eq!(dom.children(p).collect::<Vec<_>>(), vec![c, b, a]);
        assert_eq!(dom.subtree_text(p), "cba");
    }

    #[test]
    fn test_detach_first_and_last() {
        let mut dom = ArenaDom::new();
        let p = dom.create_html_element("p", vec![]);
        let a = dom.create_text("a".into());
        let b = dom.create_text("b".into());
        dom.append(p, a);
        dom.append(p, b);

        dom.detach(a);
        assert_eq!(dom.children(p).collect::<Vec<_>>(), vec![b]);
        dom.detach(b);
        assert_eq!(dom.children(p).count(), 0);
        assert!(dom.parent(b).is_none());
    }

    #[test]
    fn test_class_toggles_keep_attribute_in_sync() {
        let mut dom = ArenaDom::new();
        let span = dom.create_html_element("span", vec![Attribute::new("class", "line")]);

        assert!(dom.add_class(span, "selected"));
        assert!(!dom.add_class(span, "selected"));
        assert_eq!(dom.get_attr(span, "class"), Some("line selected"));

        assert!(dom.remove_class(span, "selected"));
        assert_eq!(dom.get_attr(span, "class"), Some("line"));
        assert!(dom.remove_class(span, "line"));
        assert_eq!(dom.get_attr(span, "class"), None);
        assert!(!dom.remove_class(span, "line"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut dom = ArenaDom::new();
        let root = div(&mut dom, vec![]);
        let p1 = dom.create_html_element("p", vec![]);
        let p2 = dom.create_html_element("p", vec![]);
        let t1 = dom.create_text("one".into());
        let t2 = dom.create_text("two".into());
        dom.append(root, p1);
        dom.append(p1, t1);
        dom.append(root, p2);
        dom.append(p2, t2);

        let order: Vec<_> = dom.descendants(root).collect();
        assert_eq!(order, vec![p1, t1, p2, t2]);
        // A subtree walk never escapes its root.
        assert_eq!(dom.descendants(p1).collect::<Vec<_>>(), vec![t1]);
    }

    #[test]
    fn test_closest_respects_limit() {
        let mut dom = ArenaDom::new();
        let outer = dom.create_html_element("div", vec![Attribute::new("class", "line")]);
        let root = div(&mut dom, vec![]);
        let span = dom.create_html_element("span", vec![]);
        dom.append(outer, root);
        dom.append(root, span);

        let is_line = |d: &ArenaDom, id| d.has_class(id, "line");
        assert_eq!(dom.closest(span, root, is_line), None);
        assert_eq!(dom.closest(span, outer, is_line), Some(outer));
    }
}
