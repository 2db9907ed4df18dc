//! In-memory document.
//!
//! A small arena-backed element tree implementing [`Document`]. It backs the
//! test suite and the CLI, and renders itself back to HTML so injected tags
//! can be inspected. Element markup is parsed with html5ever, so scripts,
//! links and ids inside it are real nodes.

use std::sync::{Arc, RwLock};

use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, LocalName, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::{Document, Location};

/// Elements that never get a closing tag when rendered.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Elements whose text content is rendered without escaping.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Handle to a node in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Node {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    /// Decoded text, escaped on render.
    Text(String),
    /// Raw markup (script bodies, comments), rendered verbatim.
    Markup(String),
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    cookie: String,
    location: Location,
    alerts: Vec<String>,
}

impl Tree {
    fn new(location: Location) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            cookie: String::new(),
            location,
            alerts: Vec::new(),
        };
        tree.root = tree.push_element("html");
        tree.head = tree.push_element("head");
        tree.body = tree.push_element("body");
        tree.append(tree.root, tree.head);
        tree.append(tree.root, tree.body);
        tree
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn push_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        })
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        if let Some(Node::Element { children, .. }) = self.nodes.get_mut(parent.0) {
            children.push(child);
        }
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(id.0) {
            Some(Node::Element { attributes, .. }) => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(Node::Element { attributes, .. }) = self.nodes.get_mut(id.0) {
            match attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn classes(&self, id: NodeId) -> Vec<String> {
        self.attribute(id, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn matches(&self, id: NodeId, selector: &str) -> bool {
        let Some(Node::Element { tag, .. }) = self.nodes.get(id.0) else {
            return false;
        };
        if let Some(wanted) = selector.strip_prefix('#') {
            self.attribute(id, "id") == Some(wanted)
        } else if let Some(wanted) = selector.strip_prefix('.') {
            self.classes(id).iter().any(|c| c == wanted)
        } else {
            tag.eq_ignore_ascii_case(selector)
        }
    }

    /// Pre-order walk of everything attached under `from`.
    fn walk(&self, from: NodeId, out: &mut Vec<NodeId>) {
        out.push(from);
        if let Some(Node::Element { children, .. }) = self.nodes.get(from.0) {
            for child in children {
                self.walk(*child, out);
            }
        }
    }

    fn render(&self, id: NodeId, out: &mut String) {
        match self.nodes.get(id.0) {
            Some(Node::Markup(markup)) => out.push_str(markup),
            Some(Node::Text(text)) => out.push_str(&escape_text(text)),
            Some(Node::Element {
                tag,
                attributes,
                children,
            }) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    self.render(*child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
            None => {}
        }
    }

    /// Parse `markup` as the content of `parent` and attach the result.
    fn append_markup(&mut self, parent: NodeId, markup: &str) {
        let context = match self.nodes.get(parent.0) {
            Some(Node::Element { tag, .. }) => tag.clone(),
            _ => return,
        };
        let dom = html5ever::parse_fragment(
            RcDom::default(),
            Default::default(),
            QualName::new(None, ns!(html), LocalName::from(context.as_str())),
            Vec::new(),
        )
        .one(markup);

        // The fragment parser wraps its output in a synthetic <html> root.
        let document_children = dom.document.children.borrow();
        for root in document_children.iter() {
            if let NodeData::Element { name, .. } = &root.data {
                if name.local == local_name!("html") {
                    for child in root.children.borrow().iter() {
                        self.import(parent, child, RAW_TEXT_TAGS.contains(&context.as_str()));
                    }
                }
            }
        }
    }

    fn import(&mut self, parent: NodeId, handle: &Handle, raw_text: bool) {
        let node = match &handle.data {
            NodeData::Element { name, attrs, .. } => {
                let tag: &str = &name.local;
                let element = self.push_element(tag);
                for attr in attrs.borrow().iter() {
                    self.set_attribute(element, &attr.name.local, &attr.value);
                }
                self.append(parent, element);
                let raw = RAW_TEXT_TAGS.contains(&tag);
                for child in handle.children.borrow().iter() {
                    self.import(element, child, raw);
                }
                return;
            }
            NodeData::Text { contents } => {
                let contents = contents.borrow();
                let text: &str = &contents;
                let text = text.to_string();
                if raw_text {
                    Node::Markup(text)
                } else {
                    Node::Text(text)
                }
            }
            NodeData::Comment { contents } => {
                let contents: &str = contents;
                Node::Markup(format!("<!--{}-->", contents))
            }
            _ => return,
        };
        let id = self.push(node);
        self.append(parent, id);
    }

    fn render_children(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(Node::Element { children, .. }) = self.nodes.get(id.0) {
            for child in children {
                self.render(*child, &mut out);
            }
        }
        out
    }
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// MemoryDocument
// ---------------------------------------------------------------------------

/// Thread-safe in-memory document. Clones share the same tree.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    tree: Arc<RwLock<Tree>>,
}

impl MemoryDocument {
    /// An empty `<html><head></head><body></body></html>` page.
    pub fn new(location: Location) -> Self {
        Self {
            tree: Arc::new(RwLock::new(Tree::new(location))),
        }
    }

    pub fn with_cookie(self, cookie: impl Into<String>) -> Self {
        self.set_cookie(cookie);
        self
    }

    /// Add an already-present `<script src>` to the head.
    pub fn with_script(self, src: &str) -> Self {
        let script = self.create_element("script");
        self.set_attribute(&script, "src", src);
        self.append_child(&self.head(), &script);
        self
    }

    /// Add an already-present stylesheet `<link>` to the head.
    pub fn with_stylesheet(self, href: &str) -> Self {
        let link = self.create_element("link");
        self.set_attribute(&link, "rel", "stylesheet");
        self.set_attribute(&link, "href", href);
        self.append_child(&self.head(), &link);
        self
    }

    /// Add `<tag id=id>markup</tag>` to the body.
    pub fn with_element(self, tag: &str, id: &str, markup: &str) -> Self {
        self.insert_element(tag, id, markup);
        self
    }

    /// Add `<tag id=id>markup</tag>` to the body and return its handle.
    /// `markup` is parsed the way `innerHTML` would parse it inside `tag`.
    pub fn insert_element(&self, tag: &str, id: &str, markup: &str) -> NodeId {
        let mut tree = self.tree.write().expect("document tree poisoned");
        let element = tree.push_element(tag);
        tree.set_attribute(element, "id", id);
        if !markup.is_empty() {
            tree.append_markup(element, markup);
        }
        let body = tree.body;
        tree.append(body, element);
        element
    }

    pub fn set_cookie(&self, cookie: impl Into<String>) {
        let mut tree = self.tree.write().expect("document tree poisoned");
        tree.cookie = cookie.into();
    }

    /// Every message passed to [`Document::alert`], oldest first.
    pub fn alerts(&self) -> Vec<String> {
        let tree = self.tree.read().expect("document tree poisoned");
        tree.alerts.clone()
    }

    pub fn classes(&self, element: &NodeId) -> Vec<String> {
        let tree = self.tree.read().expect("document tree poisoned");
        tree.classes(*element)
    }

    pub fn has_class(&self, element: &NodeId, class: &str) -> bool {
        self.classes(element).iter().any(|c| c == class)
    }

    /// Serialize the whole page.
    pub fn to_html(&self) -> String {
        let tree = self.tree.read().expect("document tree poisoned");
        let mut out = String::from("<!DOCTYPE html>");
        tree.render(tree.root, &mut out);
        out
    }
}

impl Document for MemoryDocument {
    type Element = NodeId;

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let tree = self.tree.read().expect("document tree poisoned");
        let selector = selector.trim();
        let mut all = Vec::new();
        tree.walk(tree.root, &mut all);
        all.into_iter()
            .filter(|id| tree.matches(*id, selector))
            .collect()
    }

    fn head(&self) -> NodeId {
        self.tree.read().expect("document tree poisoned").head
    }

    fn body(&self) -> NodeId {
        self.tree.read().expect("document tree poisoned").body
    }

    fn create_element(&self, tag: &str) -> NodeId {
        let mut tree = self.tree.write().expect("document tree poisoned");
        tree.push_element(tag)
    }

    fn set_attribute(&self, element: &NodeId, name: &str, value: &str) {
        let mut tree = self.tree.write().expect("document tree poisoned");
        tree.set_attribute(*element, name, value);
    }

    fn get_attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        let tree = self.tree.read().expect("document tree poisoned");
        tree.attribute(*element, name).map(str::to_string)
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        let mut tree = self.tree.write().expect("document tree poisoned");
        tree.append(*parent, *child);
    }

    fn inner_html(&self, element: &NodeId) -> String {
        let tree = self.tree.read().expect("document tree poisoned");
        tree.render_children(*element)
    }

    fn add_class(&self, element: &NodeId, class: &str) {
        let mut tree = self.tree.write().expect("document tree poisoned");
        let mut classes = tree.classes(*element);
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            tree.set_attribute(*element, "class", &classes.join(" "));
        }
    }

    fn remove_class(&self, element: &NodeId, class: &str) {
        let mut tree = self.tree.write().expect("document tree poisoned");
        if tree.attribute(*element, "class").is_none() {
            return;
        }
        let remaining: Vec<String> = tree
            .classes(*element)
            .into_iter()
            .filter(|c| c != class)
            .collect();
        tree.set_attribute(*element, "class", &remaining.join(" "));
    }

    fn cookie(&self) -> String {
        self.tree.read().expect("document tree poisoned").cookie.clone()
    }

    fn location(&self) -> Location {
        self.tree
            .read()
            .expect("document tree poisoned")
            .location
            .clone()
    }

    fn alert(&self, message: &str) {
        let mut tree = self.tree.write().expect("document tree poisoned");
        tree.alerts.push(message.to_string());
    }
}
