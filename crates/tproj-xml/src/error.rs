//! XML parsing and printing errors.

use quick_xml::escape::EscapeError;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {source}")]
    Parse {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("invalid attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("invalid escape sequence: {0}")]
    Escape(#[from] EscapeError),

    #[error("unknown entity reference &{0};")]
    UnknownEntity(String),

    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("expected root element <{expected}>, found <{found}>")]
    RootMismatch { expected: String, found: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
}

pub type Result<T> = std::result::Result<T, XmlError>;
