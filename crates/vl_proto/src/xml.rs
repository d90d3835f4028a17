//! Minimal owned XML tree.
//!
//! The envelope pipeline needs to build small subtrees (`<header>`,
//! `<payload>`), parse a caller-supplied message body, pull one element out
//! of a tree, and serialize the result. Parsing goes through `roxmltree`;
//! the owned tree exists because `roxmltree` documents are read-only views
//! over the input string.

use std::fmt;

use crate::error::ProtoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value.into();
        } else {
            self.attrs.push((name, value.into()));
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// First direct child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|n| match n {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Direct child elements with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter_map(move |n| match n {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Remove and return the first direct child element with the given name.
    pub fn remove_child(&mut self, name: &str) -> Option<Element> {
        let idx = self.children.iter().position(
            |n| matches!(n, Node::Element(el) if el.name == name),
        )?;
        match self.children.remove(idx) {
            Node::Element(el) => Some(el),
            Node::Text(_) => unreachable!(),
        }
    }

    /// Depth-first search for an element with the given name, starting at
    /// (and including) `self`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|n| match n {
            Node::Element(el) => el.find(name),
            Node::Text(_) => None,
        })
    }

    /// Remove and return the first descendant element with the given name.
    /// Does not match `self`.
    pub fn take_descendant(&mut self, name: &str) -> Option<Element> {
        if let Some(el) = self.remove_child(name) {
            return Some(el);
        }
        for node in &mut self.children {
            if let Node::Element(el) = node {
                if let Some(found) = el.take_descendant(name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Concatenated text content of the direct text children, or `None`
    /// if the element holds no text at all.
    pub fn text(&self) -> Option<String> {
        let mut out = String::new();
        let mut any = false;
        for node in &self.children {
            if let Node::Text(t) = node {
                out.push_str(t);
                any = true;
            }
        }
        any.then_some(out)
    }

    /// Parse a well-formed XML document into an owned tree.
    pub fn parse(xml: &str) -> Result<Element, ProtoError> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| ProtoError::MalformedXml(e.to_string()))?;
        Ok(convert(doc.root_element()))
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let mut el = Element::new(node.tag_name().name());
    for attr in node.attributes() {
        el.set_attr(attr.name(), attr.value());
    }
    for child in node.children() {
        if child.is_element() {
            el.push_element(convert(child));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            // Drop inter-element whitespace, keep real content.
            if !text.trim().is_empty() {
                el.push_text(text);
            }
        }
    }
    el
}

fn escape_text(s: &str, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    for c in s.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            _ => fmt::Write::write_char(out, c)?,
        }
    }
    Ok(())
}

fn escape_attr(s: &str, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    for c in s.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '\'' => out.write_str("&apos;")?,
            '"' => out.write_str("&quot;")?,
            _ => fmt::Write::write_char(out, c)?,
        }
    }
    Ok(())
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attrs {
            write!(f, " {name}='")?;
            escape_attr(value, f)?;
            write!(f, "'")?;
        }
        if self.children.is_empty() {
            return write!(f, "/>");
        }
        write!(f, ">")?;
        for node in &self.children {
            match node {
                Node::Element(el) => write!(f, "{el}")?,
                Node::Text(t) => escape_text(t, f)?,
            }
        }
        write!(f, "</{}>", self.name)
    }
}
