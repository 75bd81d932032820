use super::*;

/// Handle to a node in a [`Dom`] arena.
///
/// Handles stay valid for the lifetime of the arena; detaching a node only
/// clears its parent link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) disabled: bool,
    // Checkedness of checkbox/radio inputs, selectedness of options.
    pub(crate) checked: bool,
    pub(crate) selected: bool,
}

#[derive(Debug, Clone)]
pub struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let disabled = attrs.contains_key("disabled");
        let checked = attrs.contains_key("checked");
        let selected = attrs.contains_key("selected");
        let element = Element {
            tag_name,
            attrs,
            value,
            disabled,
            checked,
            selected,
        };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(id_attr) = self.attr(id, "id") {
            self.id_index.entry(id_attr).or_insert(id);
        }
        id
    }

    pub fn create_detached_element(&mut self, tag_name: &str) -> NodeId {
        let element = Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: HashMap::new(),
            value: String::new(),
            disabled: false,
            checked: false,
            selected: false,
        };
        self.create_node(None, NodeType::Element(element))
    }

    pub fn create_detached_text(&mut self, text: &str) -> NodeId {
        self.create_node(None, NodeType::Text(text.to_string()))
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some()
    }

    pub fn is_text(&self, node_id: NodeId) -> bool {
        matches!(
            self.nodes.get(node_id.0).map(|node| &node.node_type),
            Some(NodeType::Text(_))
        )
    }

    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn has_tag(&self, node_id: NodeId, tag: &str) -> bool {
        self.tag_name(node_id)
            .map(|name| name.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0).and_then(|node| node.parent)
    }

    pub fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes
            .get(node_id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element children only, in document order.
    pub fn child_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        self.children(node_id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    pub(crate) fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    pub fn is_connected(&self, node_id: NodeId) -> bool {
        node_id == self.root || self.is_descendant_of(node_id, self.root)
    }

    pub(crate) fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn can_have_children(&self, node_id: NodeId) -> bool {
        self.nodes
            .get(node_id.0)
            .map(|node| !matches!(node.node_type, NodeType::Text(_)))
            .unwrap_or(false)
    }

    /// First connected element with the given `id`, in document order.
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn rebuild_id_index(&mut self) {
        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);
        self.id_index.clear();
        for node in ids {
            if let Some(id_attr) = self.attr(node, "id") {
                if !id_attr.is_empty() {
                    self.id_index.entry(id_attr).or_insert(node);
                }
            }
        }
    }

    fn id_of(&self, node_id: NodeId) -> Option<String> {
        self.attr(node_id, "id").filter(|id| !id.is_empty())
    }

    fn subtree_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.is_element(root) {
            out.push(root);
        }
        self.collect_elements_dfs(root, &mut out);
        out
    }

    /// Indexes `id` at `node` unless an element earlier in document order
    /// already holds it.
    fn index_id(&mut self, id: String, node: NodeId) {
        let earlier = match self.id_index.get(&id) {
            Some(existing) => self.precedes(node, *existing),
            None => true,
        };
        if earlier {
            self.id_index.insert(id, node);
        }
    }

    /// Points `id` at its first connected holder, or drops it.
    fn reindex_id(&mut self, id: &str) {
        self.id_index.remove(id);
        let holder = self
            .all_element_nodes()
            .into_iter()
            .find(|node| self.attr(*node, "id").as_deref() == Some(id));
        if let Some(node) = holder {
            self.id_index.insert(id.to_string(), node);
        }
    }

    // Call after `root` was attached to the document.
    fn index_subtree(&mut self, root: NodeId) {
        for node in self.subtree_elements(root) {
            if let Some(id) = self.id_of(node) {
                self.index_id(id, node);
            }
        }
    }

    // Call after `root` was detached from the document.
    fn unindex_subtree(&mut self, root: NodeId) {
        let stale = self
            .subtree_elements(root)
            .into_iter()
            .filter_map(|node| {
                let id = self.id_of(node)?;
                (self.id_index.get(&id) == Some(&node)).then_some(id)
            })
            .collect::<Vec<_>>();
        for id in stale {
            self.reindex_id(&id);
        }
    }

    /// Index path from the root, used to compare document order.
    fn tree_position(&self, node_id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node_id;
        while let Some(parent) = self.parent(current) {
            let index = self
                .children(parent)
                .iter()
                .position(|child| *child == current)
                .unwrap_or(0);
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    pub(crate) fn precedes(&self, a: NodeId, b: NodeId) -> bool {
        self.tree_position(a) < self.tree_position(b)
    }

    pub fn text_content(&self, node_id: NodeId) -> String {
        let Some(node) = self.nodes.get(node_id.0) else {
            return String::new();
        };
        match &node.node_type {
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &node.children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
        }
    }

    /// Replaces all children with a single text node (none for `""`).
    pub fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("textContent target is not an element".into()));
        }
        let connected = self.is_connected(node_id);
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
            if connected {
                self.unindex_subtree(child);
            }
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        Ok(())
    }

    /// The live value. A select reports its selected option's value, and a
    /// checkbox or radio without a `value` attribute reports `"on"`.
    pub fn value(&self, node_id: NodeId) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::Dom("value target is not an element".into()))?;
        if element.tag_name == "select" {
            return Ok(self
                .selected_options(node_id)
                .first()
                .map(|option| self.option_value(*option))
                .unwrap_or_default());
        }
        if crate::form::is_checkable_element(element) && !element.attrs.contains_key("value") {
            return Ok("on".into());
        }
        Ok(element.value.clone())
    }

    /// Sets the live value. On a select this selects the first option
    /// carrying `value`, and fails when there is none.
    pub fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.has_tag(node_id, "select") {
            return self.set_select_value(node_id, value);
        }
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("value target is not an element".into()))?;
        element.value = value.to_string();
        Ok(())
    }

    pub fn disabled(&self, node_id: NodeId) -> bool {
        self.element(node_id).map(|e| e.disabled).unwrap_or(false)
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attrs.get(name).cloned())
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("setAttribute target is not an element".into()))?;
        let previous = element.attrs.insert(lowered.clone(), value.to_string());
        match lowered.as_str() {
            "value" => element.value = value.to_string(),
            "disabled" => element.disabled = true,
            "checked" => element.checked = true,
            "selected" => element.selected = true,
            _ => {}
        }

        if lowered == "id" && self.is_connected(node_id) {
            if let Some(old_id) = previous.filter(|old| !old.is_empty()) {
                if self.id_index.get(&old_id) == Some(&node_id) {
                    self.reindex_id(&old_id);
                }
            }
            if !value.is_empty() {
                self.index_id(value.to_string(), node_id);
            }
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("removeAttribute target is not an element".into()))?;
        let previous = element.attrs.remove(&lowered);
        match lowered.as_str() {
            "value" => element.value.clear(),
            "disabled" => element.disabled = false,
            "checked" => element.checked = false,
            "selected" => element.selected = false,
            _ => {}
        }

        if lowered == "id" && self.is_connected(node_id) {
            if let Some(old_id) = previous {
                if self.id_index.get(&old_id) == Some(&node_id) {
                    self.reindex_id(&old_id);
                }
            }
        }
        Ok(())
    }

    pub fn has_class(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id)
            .map(|element| has_class(element, class_name))
            .unwrap_or(false)
    }

    pub fn class_add(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("classList target is not an element".into()))?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        if !classes.iter().any(|name| name == class_name) {
            classes.push(class_name.to_string());
        }
        set_class_attr(element, &classes);
        Ok(())
    }

    pub fn class_remove(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("classList target is not an element".into()))?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        classes.retain(|name| name != class_name);
        set_class_attr(element, &classes);
        Ok(())
    }

    /// Adds `class_name` when `on`, removes it otherwise.
    pub fn class_set(&mut self, node_id: NodeId, class_name: &str, on: bool) -> Result<()> {
        if on {
            self.class_add(node_id, class_name)
        } else {
            self.class_remove(node_id, class_name)
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::Dom("appendChild target cannot have children".into()));
        }
        if child == self.root || child == parent {
            return Err(Error::Dom("invalid appendChild node".into()));
        }
        if !self.is_valid_node(child) {
            return Err(Error::Dom("appendChild node is invalid".into()));
        }

        // Prevent cycles: parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::Dom("appendChild would create a cycle".into()));
            }
            cursor = self.parent(node);
        }

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child)?;
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        if self.is_connected(parent) {
            self.index_subtree(child);
        }
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::Dom("removeChild target is not a direct child".into()));
        }
        let was_connected = self.is_connected(parent);
        self.nodes[parent.0].children.retain(|id| *id != child);
        self.nodes[child.0].parent = None;
        if was_connected {
            self.unindex_subtree(child);
        }
        Ok(())
    }

    /// Detaches `node` from its parent. Already detached nodes are left alone.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(Error::Dom("cannot remove document root".into()));
        }
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        self.remove_child(parent, node)
    }

    pub(crate) fn find_ancestor_by_tag(&self, node_id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if self.has_tag(current, tag) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub(crate) fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(node_id) {
            if self.is_element(*child) {
                out.push(*child);
            }
            self.collect_elements_dfs(*child, out);
        }
    }

    pub(crate) fn all_element_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements_dfs(self.root, &mut out);
        out
    }

    /// Serializes a subtree. Attributes are emitted in name order so the
    /// output is stable across runs.
    pub fn dump_node(&self, node_id: NodeId) -> String {
        let Some(node) = self.nodes.get(node_id.0) else {
            return String::new();
        };
        match &node.node_type {
            NodeType::Document => {
                let mut out = String::new();
                for child in &node.children {
                    out.push_str(&self.dump_node(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
            NodeType::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort();
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(v);
                    out.push('"');
                }
                out.push('>');
                if crate::html::is_void_tag(&element.tag_name) {
                    return out;
                }
                for child in &node.children {
                    out.push_str(&self.dump_node(*child));
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|value| {
            value
                .split_whitespace()
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

fn set_class_attr(element: &mut Element, classes: &[String]) {
    if classes.is_empty() {
        element.attrs.remove("class");
    } else {
        element.attrs.insert("class".to_string(), classes.join(" "));
    }
}
