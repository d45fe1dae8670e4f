//! XML documents for tproj resources.
//!
//! A small owned element tree ([`Document`], [`Element`]) parsed with
//! `quick_xml::Reader` and pretty printed with `quick_xml::Writer`, plus
//! [`XmlFormat`], the [`tproj_mapping::DocumentFormat`] that places field
//! values at slash-separated paths inside that tree.

pub mod document;
pub mod error;
pub mod format;
pub mod path;
pub mod reader;
pub mod writer;

pub use document::{Document, Element};
pub use error::{Result, XmlError};
pub use format::{INNER_ITEM, XmlFormat};
pub use path::FieldPath;
pub use reader::parse_document;
pub use writer::{DEFAULT_INDENT, WriteOptions, write_document};
