//! XML text to [`Document`] using `quick_xml::Reader`.

use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

use crate::document::{Document, Element};
use crate::error::{Result, XmlError};

/// Element being built while its content is streamed.
struct OpenElement {
    element: Element,
    text: String,
}

impl OpenElement {
    fn new(element: Element) -> Self {
        Self {
            element,
            text: String::new(),
        }
    }

    /// Leaf text is kept as written, whitespace included. Around children,
    /// whitespace is layout and mixed text is trimmed.
    fn finish(mut self) -> Element {
        if self.element.children().is_empty() {
            if !self.text.is_empty() {
                self.element.set_text(Some(self.text));
            }
        } else if !self.text.trim().is_empty() {
            self.element.set_text(Some(self.text.trim().to_string()));
        }
        self.element
    }
}

/// Parse a complete document.
///
/// Comments, processing instructions and the doctype are skipped. CDATA
/// sections become text.
pub fn parse_document(input: &str) -> Result<Document> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(source) => {
                return Err(XmlError::Parse {
                    position: reader.buffer_position() as u64,
                    source,
                });
            }
        };
        match event {
            Event::Start(start) => {
                stack.push(OpenElement::new(element_from_start(&start)?));
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                close_element(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let open = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected closing tag".to_string()))?;
                close_element(&mut stack, &mut root, open.finish())?;
            }
            Event::Text(text) => {
                let raw = std::str::from_utf8(&text)?;
                push_text(&mut stack, &unescape(raw)?)?;
            }
            Event::CData(data) => {
                let raw = std::str::from_utf8(&data)?;
                push_text(&mut stack, raw)?;
            }
            Event::GeneralRef(reference) => {
                let name = std::str::from_utf8(&reference)?;
                push_text(&mut stack, &resolve_reference(name)?)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Malformed(format!(
            "element <{}> is never closed",
            open.element.name()
        )));
    }
    let root =
        root.ok_or_else(|| XmlError::Malformed("document has no root element".to_string()))?;
    trace!(root = root.name(), children = root.children().len(), "parsed xml document");
    Ok(Document::from_root(root))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let qname = start.name();
    let mut element = Element::new(std::str::from_utf8(qname.as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = std::str::from_utf8(attribute.key.as_ref())?;
        let raw = std::str::from_utf8(&attribute.value)?;
        element.set_attribute(key, unescape(raw)?.into_owned());
    }
    Ok(element)
}

fn close_element(
    stack: &mut [OpenElement],
    root: &mut Option<Element>,
    element: Element,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.element.push_child(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(XmlError::Malformed(format!(
            "second root element <{}>",
            element.name()
        ))),
    }
}

fn push_text(stack: &mut [OpenElement], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(open) => {
            open.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError::Malformed(
            "text outside the root element".to_string(),
        )),
    }
}

/// Resolve `&name;` where `name` is a predefined entity or a character
/// reference (`#65`, `#x41`).
fn resolve_reference(name: &str) -> Result<String> {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        return parsed
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| XmlError::UnknownEntity(name.to_string()));
    }
    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| XmlError::UnknownEntity(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_leaf_text_and_drops_layout_whitespace() {
        let document = parse_document(
            "<?xml version=\"1.0\"?>\n<root>\n    <name> spaced </name>\n    <empty/>\n</root>\n",
        )
        .unwrap();
        let root = document.root();
        assert_eq!(root.text(), None);
        assert_eq!(root.child("name").unwrap().text(), Some(" spaced "));
        assert!(root.child("empty").unwrap().is_empty());
    }

    #[test]
    fn whitespace_only_leaf_text_is_content() {
        let document =
            parse_document("<root>\n  <a>   </a>\n  <b>\t</b>\n  <c></c>\n</root>").unwrap();
        let root = document.root();
        assert_eq!(root.text(), None);
        assert_eq!(root.child("a").unwrap().text(), Some("   "));
        assert_eq!(root.child("b").unwrap().text(), Some("\t"));
        assert_eq!(root.child("c").unwrap().text(), None);
    }

    #[test]
    fn resolves_entities_and_cdata() {
        let document =
            parse_document("<r><a>x &amp; y &#65;&#x42;</a><b><![CDATA[<raw>]]></b></r>").unwrap();
        assert_eq!(document.root().child("a").unwrap().text(), Some("x & y AB"));
        assert_eq!(document.root().child("b").unwrap().text(), Some("<raw>"));
    }

    #[test]
    fn reads_attributes_in_order() {
        let document = parse_document(r#"<r b="2" a="&lt;1&gt;"/>"#).unwrap();
        assert_eq!(
            document.root().attributes(),
            &[
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "<1>".to_string())
            ]
        );
    }

    #[test]
    fn skips_comments() {
        let document = parse_document("<!-- head --><r><!-- inner --><a>1</a></r>").unwrap();
        assert_eq!(document.root().children().len(), 1);
    }

    #[test]
    fn rejects_unclosed_elements() {
        assert!(parse_document("<r><a>").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            parse_document("   "),
            Err(XmlError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_unknown_entities() {
        assert!(matches!(
            resolve_reference("nbsp"),
            Err(XmlError::UnknownEntity(_))
        ));
        assert_eq!(resolve_reference("#x263A").unwrap(), "\u{263A}");
    }
}
