//! Owned, mutable XML element tree.
//!
//! `roxmltree` gives a fast read-only view of a part; the cascade needs to rewrite
//! properties in place, so every part is converted into this tree on load and
//! serialized back to text on save.

use std::fmt::Write as _;

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

/// Prefixes used when a namespace has to be declared that the source part never declared.
const WELL_KNOWN_PREFIXES: &[(&str, &str)] = &[
    (
        "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
        "w",
    ),
    (
        "http://schemas.openxmlformats.org/markup-compatibility/2006",
        "mc",
    ),
    ("http://schemas.microsoft.com/office/word/2010/wordml", "w14"),
    (crate::docx::FORMAT_NS, crate::docx::FORMAT_PREFIX),
];

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XName {
    pub ns: String,
    pub local: String,
}

impl XName {
    pub fn new(ns: &str, local: &str) -> Self {
        Self {
            ns: ns.to_string(),
            local: local.to_string(),
        }
    }

    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.local == local && self.ns == ns
    }
}

impl std::fmt::Display for XName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ns.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.ns, self.local)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: XName,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub name: XName,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: XName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Same name and attributes, no children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: XName, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.name.is(ns, local)
    }

    pub fn attribute(&self, ns: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(ns, local))
            .map(|a| a.value.as_str())
    }

    pub fn attr_by_name(&self, name: &XName) -> Option<&Attribute> {
        self.attributes.iter().find(|a| &a.name == name)
    }

    pub fn set_attr(&mut self, name: XName, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(a) => a.value = value.to_string(),
            None => self.attributes.push(Attribute {
                name,
                value: value.to_string(),
            }),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, ns: &str, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(ns, local))
    }

    pub fn child_mut(&mut self, ns: &str, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(ns, local))
    }

    pub fn has_elements(&self) -> bool {
        self.elements().next().is_some()
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn insert_first(&mut self, child: Element) {
        self.children.insert(0, Node::Element(child));
    }

    /// Replace the first child with the given name, or insert `child` first when absent.
    pub fn replace_or_insert_first(&mut self, child: Element) {
        let name = child.name.clone();
        match self.child_mut(&name.ns, &name.local) {
            Some(existing) => *existing = child,
            None => self.insert_first(child),
        }
    }

    /// Keep only element children for which `keep` is true; text nodes are kept.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.children.retain(|n| match n {
            Node::Element(e) => keep(e),
            Node::Text(_) => true,
        });
    }

    pub fn remove_children(&mut self, ns: &str, local: &str) {
        self.retain_elements(|e| !e.is(ns, local));
    }

    /// Concatenated text of the direct children named `ns:local`.
    pub fn child_text(&self, ns: &str, local: &str) -> String {
        let mut out = String::new();
        for e in self.elements().filter(|e| e.is(ns, local)) {
            for n in &e.children {
                if let Node::Text(t) = n {
                    out.push_str(t);
                }
            }
        }
        out
    }

    /// Pre-order search over this element and all descendants.
    pub fn any(&self, pred: &impl Fn(&Element) -> bool) -> bool {
        pred(self) || self.elements().any(|e| e.any(pred))
    }

    /// Visit this element and every descendant element, pre-order.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in self.elements_mut() {
            child.walk_mut(f);
        }
    }

    fn from_node(node: roxmltree::Node) -> Self {
        let tag = node.tag_name();
        let mut el = Element::new(XName::new(tag.namespace().unwrap_or(""), tag.name()));
        for a in node.attributes() {
            el.attributes.push(Attribute {
                name: XName::new(a.namespace().unwrap_or(""), a.name()),
                value: a.value().to_string(),
            });
        }
        for child in node.children() {
            if child.is_element() {
                el.children.push(Node::Element(Element::from_node(child)));
            } else if child.is_text()
                && let Some(text) = child.text()
            {
                el.children.push(Node::Text(text.to_string()));
            }
        }
        el
    }
}

/// Namespace URI to prefix bindings; `None` is the default namespace.
#[derive(Clone, Debug, Default)]
pub struct Namespaces {
    bindings: Vec<(Option<String>, String)>,
}

impl Namespaces {
    fn add(&mut self, prefix: Option<&str>, uri: &str) {
        if uri.is_empty() || uri == XML_NS || uri == XMLNS_NS {
            return;
        }
        // a prefix (or the default namespace) rebound to another URI deeper in the tree
        // keeps its first binding; the other URI gets a generated prefix on write
        if self.bindings.iter().any(|(p, _)| p.as_deref() == prefix) {
            return;
        }
        self.bindings
            .push((prefix.map(|p| p.to_string()), uri.to_string()));
    }

    fn prefix_for(&self, uri: &str, for_attribute: bool) -> Option<Option<&str>> {
        if uri == XML_NS {
            return Some(Some("xml"));
        }
        let mut default = None;
        for (p, u) in &self.bindings {
            if u != uri {
                continue;
            }
            match p {
                Some(p) => return Some(Some(p.as_str())),
                None => default = Some(None),
            }
        }
        if for_attribute { None } else { default }
    }

    fn ensure(&mut self, uri: &str, for_attribute: bool) {
        if uri.is_empty() || self.prefix_for(uri, for_attribute).is_some() {
            return;
        }
        let taken = |p: &str, b: &[(Option<String>, String)]| {
            b.iter().any(|(bp, _)| bp.as_deref() == Some(p))
        };
        let preferred = WELL_KNOWN_PREFIXES
            .iter()
            .find(|(u, _)| *u == uri)
            .map(|(_, p)| *p)
            .filter(|p| !taken(p, &self.bindings));
        let prefix = match preferred {
            Some(p) => p.to_string(),
            None => (0..)
                .map(|i| format!("ns{i}"))
                .find(|p| !taken(p, &self.bindings))
                .unwrap_or_default(),
        };
        self.bindings.push((Some(prefix), uri.to_string()));
    }

    fn collect_used(&mut self, el: &Element) {
        self.ensure(&el.name.ns, false);
        for a in &el.attributes {
            self.ensure(&a.name.ns, true);
        }
        for child in el.elements() {
            self.collect_used(child);
        }
    }
}

/// A parsed XML part: its root element plus the namespace prefixes it declared.
#[derive(Clone, Debug)]
pub struct XmlPart {
    pub root: Element,
    pub namespaces: Namespaces,
}

impl XmlPart {
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let doc = roxmltree::Document::parse(text)?;
        let mut namespaces = Namespaces::default();
        for node in doc.descendants().filter(|n| n.is_element()) {
            for ns in node.namespaces() {
                namespaces.add(ns.name(), ns.uri());
            }
        }
        Ok(Self {
            root: Element::from_node(doc.root_element()),
            namespaces,
        })
    }

    pub fn to_xml(&self) -> String {
        let mut namespaces = self.namespaces.clone();
        // unqualified elements would fall into a default namespace hoisted to the root
        if self.root.any(&|e: &Element| e.name.ns.is_empty()) {
            namespaces.bindings.retain(|(p, _)| p.is_some());
        }
        namespaces.collect_used(&self.root);
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECL);
        write_element(&self.root, &namespaces, true, &mut out);
        out
    }
}

fn qualified(name: &XName, namespaces: &Namespaces, for_attribute: bool) -> String {
    if name.ns.is_empty() {
        return name.local.clone();
    }
    match namespaces.prefix_for(&name.ns, for_attribute) {
        Some(Some(p)) => format!("{p}:{}", name.local),
        _ => name.local.clone(),
    }
}

fn write_element(el: &Element, namespaces: &Namespaces, is_root: bool, out: &mut String) {
    let tag = qualified(&el.name, namespaces, false);
    out.push('<');
    out.push_str(&tag);
    if is_root {
        for (prefix, uri) in &namespaces.bindings {
            match prefix {
                Some(p) => {
                    let _ = write!(out, " xmlns:{p}=\"{}\"", escape_attr(uri));
                }
                None => {
                    let _ = write!(out, " xmlns=\"{}\"", escape_attr(uri));
                }
            }
        }
    }
    for a in &el.attributes {
        let _ = write!(
            out,
            " {}=\"{}\"",
            qualified(&a.name, namespaces, true),
            escape_attr(&a.value)
        );
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            Node::Element(e) => write_element(e, namespaces, false, out),
            Node::Text(t) => out.push_str(&escape_text(t)),
        }
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}
