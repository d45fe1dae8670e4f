//! Pretty printing of [`Document`]s with `quick_xml::Writer`.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::document::{Document, Element};
use crate::error::Result;

/// Default indentation, in spaces.
pub const DEFAULT_INDENT: usize = 4;

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per nesting level; 0 writes everything on one line.
    pub indent_width: usize,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>`.
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT,
            declaration: true,
        }
    }
}

/// Serialize a document, ending with a newline.
pub fn write_document<W: Write>(document: &Document, out: W, options: &WriteOptions) -> Result<()> {
    let mut xml = if options.indent_width == 0 {
        Writer::new(out)
    } else {
        Writer::new_with_indent(out, b' ', options.indent_width)
    };
    if options.declaration {
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    }
    write_element(&mut xml, document.root())?;
    xml.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_element<W: Write>(xml: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = element.text().filter(|text| !text.is_empty());
    if element.children().is_empty() && text.is_none() {
        xml.write_event(Event::Empty(start))?;
        return Ok(());
    }

    xml.write_event(Event::Start(start))?;
    if let Some(text) = text {
        xml.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in element.children() {
        write_element(xml, child)?;
    }
    xml.write_event(Event::End(BytesEnd::new(element.name())))?;
    Ok(())
}
