//! Persistence error types.
//!
//! All persistence operations return structured errors that provide
//! user-friendly messages and optional remediation hints.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tproj_mapping::DiscoveryError;
use tproj_xml::XmlError;

/// Persistence operation error.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stream I/O error (archive readers and writers).
    #[error("Failed to {operation} document stream")]
    Stream {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a well-formed XML document.
    #[error("Invalid XML document{}", describe(.path.as_deref()))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: XmlError,
    },

    /// The document is XML but belongs to another kind of resource.
    #[error("Expected root element <{expected}>, found <{found}>{}", describe(.path.as_deref()))]
    RootMismatch {
        path: Option<PathBuf>,
        expected: String,
        found: String,
    },

    /// Serialization error.
    #[error("Failed to serialize document")]
    Serialization {
        #[source]
        source: XmlError,
    },

    /// A persisted type has a broken field registration.
    #[error("Invalid field registration")]
    Configuration {
        #[from]
        source: DiscoveryError,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe(path: Option<&Path>) -> String {
    path.map(|path| format!(": {}", path.display()))
        .unwrap_or_default()
}

impl PersistenceError {
    pub(crate) fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// True when the error means the backing file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::Stream { operation, .. } => {
                format!("Could not {operation} the document data")
            }
            Self::Parse { path, source } => match path {
                Some(path) => format!(
                    "The file at {} is not a valid XML document: {}",
                    path.display(),
                    source
                ),
                None => format!("The document is not valid XML: {source}"),
            },
            Self::RootMismatch {
                path,
                expected,
                found,
            } => {
                let subject = path
                    .as_ref()
                    .map_or_else(|| "The document".to_string(), |p| {
                        format!("The file at {}", p.display())
                    });
                format!("{subject} holds a <{found}> document, but a <{expected}> document was expected.")
            }
            Self::Serialization { .. } => {
                "An error occurred while writing the document.".to_string()
            }
            Self::Configuration { source } => {
                format!("A persisted type is registered incorrectly: {source}")
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the file to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::Stream { .. } => None,
            Self::Parse { .. } => Some(
                "Fix the XML syntax or restore the file from version control.".into(),
            ),
            Self::RootMismatch { .. } => {
                Some("Make sure you selected the right kind of file for this command.".into())
            }
            Self::Serialization { .. } => None,
            Self::Configuration { .. } => {
                Some("This is a bug in the field declarations; please report it.".into())
            }
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected() {
        let err = PersistenceError::io(
            "read",
            Path::new("missing.xml"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Could not read the file at missing.xml");
        assert!(err.suggestion().unwrap().contains("exists"));
    }

    #[test]
    fn root_mismatch_names_both_roots() {
        let err = PersistenceError::RootMismatch {
            path: Some(PathBuf::from("env.xml")),
            expected: "environment-config".into(),
            found: "project-document".into(),
        };
        assert_eq!(
            err.to_string(),
            "Expected root element <environment-config>, found <project-document>: env.xml"
        );
        assert_eq!(
            err.user_message(),
            "The file at env.xml holds a <project-document> document, but a <environment-config> document was expected."
        );
    }
}
