//! Discovery and mapping errors.

use thiserror::Error;

use crate::value::FieldType;

/// A field registration that cannot be persisted.
///
/// Raised while discovering a type's descriptors; the whole type is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("field {owner}.{field} carries both single and plural markers")]
    ConflictingMarkers {
        owner: &'static str,
        field: &'static str,
    },

    #[error("field {owner}.{field} is marked plural but has non-sequence type {field_type}")]
    PluralOnScalar {
        owner: &'static str,
        field: &'static str,
        field_type: FieldType,
    },

    #[error("field {owner}.{field} is marked single but has sequence type {field_type}")]
    SingleOnSequence {
        owner: &'static str,
        field: &'static str,
        field_type: FieldType,
    },

    #[error("field {owner}.{field} is a sequence with an unresolved element type")]
    UnresolvedElementType {
        owner: &'static str,
        field: &'static str,
    },

    #[error("fields {first} and {second} of {owner} both map to path {path:?}")]
    DuplicatePath {
        owner: &'static str,
        path: &'static str,
        first: String,
        second: String,
    },

    #[error("two distinct types are registered under the name {name}")]
    DuplicateTypeName { name: &'static str },
}

/// Failure to move a single field between an object and a document.
///
/// The mapper records these and keeps going with the remaining fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("cannot read {text:?} as {expected}")]
    InvalidText { expected: &'static str, text: String },

    #[error("invalid document path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unknown field {field}")]
    UnknownField { field: String },

    #[error("{0}")]
    Message(String),
}

impl MappingError {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }
}
