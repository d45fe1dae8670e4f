//! In-memory XML tree.

use std::io::Write;

use crate::error::{Result, XmlError};
use crate::reader::parse_document;
use crate::writer::{WriteOptions, write_document};

/// An XML element: name, ordered attributes, optional text and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// First child with the given name, appended when missing.
    pub fn ensure_child(&mut self, name: &str) -> &mut Element {
        let idx = match self.children.iter().position(|child| child.name == name) {
            Some(idx) => idx,
            None => {
                self.children.push(Element::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    /// Remove every child with the given name.
    ///
    /// Returns the index the first removed child occupied.
    pub fn remove_children(&mut self, name: &str) -> Option<usize> {
        let first = self.children.iter().position(|child| child.name == name)?;
        self.children.retain(|child| child.name != name);
        Some(first)
    }

    /// Follow a chain of child names, taking the first match at each level.
    pub fn descendant(&self, path: &[&str]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |current, segment| current.child(segment))
    }

    pub fn descendant_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for segment in path {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Like [`Element::descendant_mut`], creating missing elements.
    pub fn ensure_descendant(&mut self, path: &[&str]) -> &mut Element {
        let mut current = self;
        for segment in path {
            current = current.ensure_child(segment);
        }
        current
    }

    /// True when the element has no attributes, text or children.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.text.is_none() && self.children.is_empty()
    }
}

/// A document: exactly one root element.
///
/// A new document is "empty but present": it has its root and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root: Element::new(root_name),
        }
    }

    pub fn from_root(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    pub fn root_name(&self) -> &str {
        self.root.name()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn parse(input: &str) -> Result<Self> {
        parse_document(input)
    }

    /// Parse UTF-8 bytes, ignoring a leading byte order mark.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        parse_document(text.strip_prefix('\u{feff}').unwrap_or(text))
    }

    /// Parse and require a specific root element name.
    pub fn parse_with_root(input: &str, root_name: &str) -> Result<Self> {
        let document = parse_document(input)?;
        if document.root_name() != root_name {
            return Err(XmlError::RootMismatch {
                expected: root_name.to_string(),
                found: document.root_name().to_string(),
            });
        }
        Ok(document)
    }

    pub fn write_to<W: Write>(&self, out: W, options: &WriteOptions) -> Result<()> {
        write_document(self, out, options)
    }

    pub fn to_bytes(&self, options: &WriteOptions) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        write_document(self, &mut buffer, options)?;
        Ok(buffer)
    }

    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        let bytes = self.to_bytes(options)?;
        String::from_utf8(bytes).map_err(|err| XmlError::Utf8(err.utf8_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_is_empty_but_present() {
        let document = Document::new("environment-config");
        assert_eq!(document.root_name(), "environment-config");
        assert!(document.is_empty());
        assert!(document.root().children().is_empty());
    }

    #[test]
    fn ensure_descendant_reuses_existing_elements() {
        let mut root = Element::new("root");
        root.ensure_descendant(&["a", "b"]).set_text(Some("1".into()));
        root.ensure_descendant(&["a", "c"]);
        assert_eq!(root.children().len(), 1);
        let a = root.child("a").unwrap();
        assert_eq!(a.children().len(), 2);
        assert_eq!(root.descendant(&["a", "b"]).unwrap().text(), Some("1"));
    }

    #[test]
    fn remove_children_reports_first_position() {
        let mut root = Element::new("root");
        root.push_child(Element::new("keep"));
        root.push_child(Element::new("x"));
        root.push_child(Element::new("keep"));
        root.push_child(Element::new("x"));
        assert_eq!(root.remove_children("x"), Some(1));
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.remove_children("x"), None);
    }

    #[test]
    fn set_attribute_keeps_order() {
        let mut element = Element::new("server");
        element.set_attribute("a", "1");
        element.set_attribute("b", "2");
        element.set_attribute("a", "3");
        assert_eq!(
            element.attributes(),
            &[("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
        assert_eq!(element.remove_attribute("a").as_deref(), Some("3"));
        assert_eq!(element.attribute("a"), None);
    }

    #[test]
    fn parse_with_root_rejects_other_roots() {
        let err = Document::parse_with_root("<other/>", "expected").unwrap_err();
        assert!(matches!(err, XmlError::RootMismatch { .. }));
    }
}
