//! Arena-backed XML document
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`], so
//! the tree can be walked with (node, parent) pairs and mutated in place
//! without shared ownership. Parsing is driven by `quick-xml` events;
//! whitespace-only text is dropped and the printer re-indents with tabs,
//! which makes serialization deterministic for textual comparison.

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::{Error, Result};

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The invisible document node that owns the prolog and root element.
    Document,
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    CData(String),
    Comment(String),
    Declaration(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_error(e: impl std::fmt::Display) -> Error {
    Error::XmlParse {
        message: e.to_string(),
    }
}

impl Document {
    /// An empty document with no root element.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse XML text. Fails on malformed input or a missing root element.
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = Self::new();
        let mut open = vec![doc.document_node()];
        let mut reader = Reader::from_str(text);

        loop {
            let parent = *open.last().unwrap_or(&NodeId(0));
            match reader.read_event().map_err(parse_error)? {
                Event::Start(e) => {
                    let id = doc.push_element(&e)?;
                    doc.append_child(parent, id);
                    open.push(id);
                }
                Event::Empty(e) => {
                    let id = doc.push_element(&e)?;
                    doc.append_child(parent, id);
                }
                Event::End(_) => {
                    if open.len() <= 1 {
                        return Err(parse_error("unexpected closing tag"));
                    }
                    open.pop();
                }
                Event::Text(e) => {
                    let value = e.unescape().map_err(parse_error)?;
                    if !value.trim().is_empty() {
                        let id = doc.push(NodeKind::Text(value.into_owned()));
                        doc.append_child(parent, id);
                    }
                }
                Event::CData(e) => {
                    let id = doc.push(NodeKind::CData(lossy(&e)));
                    doc.append_child(parent, id);
                }
                Event::Comment(e) => {
                    let id = doc.push(NodeKind::Comment(lossy(&e)));
                    doc.append_child(parent, id);
                }
                Event::Decl(e) => {
                    let id = doc.push(NodeKind::Declaration(lossy(&e)));
                    doc.append_child(parent, id);
                }
                Event::PI(e) => {
                    let id = doc.push(NodeKind::ProcessingInstruction(lossy(&e)));
                    doc.append_child(parent, id);
                }
                Event::DocType(e) => {
                    let id = doc.push(NodeKind::DocType(lossy(&e).trim().to_string()));
                    doc.append_child(parent, id);
                }
                Event::Eof => break,
            }
        }

        if open.len() != 1 {
            return Err(parse_error("unclosed element at end of document"));
        }
        if doc.root_element().is_none() {
            return Err(parse_error("document has no root element"));
        }
        Ok(doc)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn push_element(&mut self, start: &BytesStart<'_>) -> Result<NodeId> {
        let name = lossy(start.name().as_ref());
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(parse_error)?;
            let value = attr.unescape_value().map_err(parse_error)?;
            attributes.push((lossy(attr.key.as_ref()), value.into_owned()));
        }
        Ok(self.push(NodeKind::Element { name, attributes }))
    }

    pub fn document_node(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.first_child_element(self.document_node())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element children of `id` in document order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.name(*child).is_some())
    }

    pub fn first_child_element(&self, id: NodeId) -> Option<NodeId> {
        self.child_elements(id).next()
    }

    /// Tag name of an element, `None` for other node kinds.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            match attributes.iter_mut().find(|(k, _)| k == key) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attributes.push((key.to_string(), value.to_string())),
            }
        }
    }

    fn first_text_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).iter().copied().find(|child| {
            matches!(
                self.nodes[child.0].kind,
                NodeKind::Text(_) | NodeKind::CData(_)
            )
        })
    }

    /// Content of the first text or CDATA child.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let child = self.first_text_child(id)?;
        match &self.nodes[child.0].kind {
            NodeKind::Text(t) | NodeKind::CData(t) => Some(t),
            _ => None,
        }
    }

    /// Replace the content of the first text or CDATA child, keeping its
    /// kind; append a plain text child when there is none.
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        match self.first_text_child(id) {
            Some(child) => match &mut self.nodes[child.0].kind {
                NodeKind::Text(t) | NodeKind::CData(t) => *t = value.to_string(),
                _ => {}
            },
            None => {
                let text = self.push(NodeKind::Text(value.to_string()));
                self.append_child(id, text);
            }
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached CDATA section.
    pub fn create_cdata(&mut self, value: &str) -> NodeId {
        self.push(NodeKind::CData(value.to_string()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.nodes[parent.0].children.len();
        self.insert_child(parent, index, child);
    }

    /// Insert `child` at `index` among the children of `parent`, detaching
    /// it from any previous parent first. `index` is clamped.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        let siblings = &mut self.nodes[parent.0].children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Serialize the whole document.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_node(&mut out, self.document_node(), 0);
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId, depth: usize) {
        let node = &self.nodes[id.0];
        let indent = "\t".repeat(depth);
        match &node.kind {
            NodeKind::Document => {
                for child in &node.children {
                    self.write_node(out, *child, 0);
                }
            }
            NodeKind::Element { name, attributes } => {
                out.push_str(&indent);
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
                }

                if node.children.is_empty() {
                    out.push_str(" />\n");
                    return;
                }

                if let [only] = node.children.as_slice()
                    && let Some(inline) = self.inline_text(*only)
                {
                    out.push('>');
                    out.push_str(&inline);
                    out.push_str(&format!("</{}>\n", name));
                    return;
                }

                out.push_str(">\n");
                for child in &node.children {
                    self.write_node(out, *child, depth + 1);
                }
                out.push_str(&format!("{}</{}>\n", indent, name));
            }
            NodeKind::Text(_) | NodeKind::CData(_) => {
                if let Some(inline) = self.inline_text(id) {
                    out.push_str(&format!("{}{}\n", indent, inline));
                }
            }
            NodeKind::Comment(c) => out.push_str(&format!("{}<!--{}-->\n", indent, c)),
            NodeKind::Declaration(d) | NodeKind::ProcessingInstruction(d) => {
                out.push_str(&format!("{}<?{}?>\n", indent, d))
            }
            NodeKind::DocType(d) => out.push_str(&format!("<!DOCTYPE {}>\n", d)),
        }
    }

    fn inline_text(&self, id: NodeId) -> Option<String> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(partial_escape(t.as_str()).into_owned()),
            NodeKind::CData(t) => Some(format!("<![CDATA[{}]]>", t)),
            _ => None,
        }
    }
}
