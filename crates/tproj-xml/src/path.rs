//! Field paths: `/`-separated element names with an optional trailing
//! `@attribute`.

use tproj_mapping::MappingError;

/// A parsed field path such as `servers/server`, `hosts/host` or `@active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath<'a> {
    segments: Vec<&'a str>,
    attribute: Option<&'a str>,
}

impl<'a> FieldPath<'a> {
    pub fn parse(path: &'a str) -> Result<Self, MappingError> {
        if path.is_empty() {
            return Err(MappingError::invalid_path(path, "path is empty"));
        }
        if path.starts_with('/') {
            return Err(MappingError::invalid_path(
                path,
                "absolute paths are not supported",
            ));
        }

        let mut parts: Vec<&'a str> = path.split('/').collect();
        let attribute = match parts.last().and_then(|last| last.strip_prefix('@')) {
            Some(attribute) => {
                parts.pop();
                Some(attribute)
            }
            None => None,
        };

        for part in parts.iter().chain(attribute.iter()) {
            if part.is_empty() {
                return Err(MappingError::invalid_path(path, "empty segment"));
            }
            if !is_valid_name(part) {
                return Err(MappingError::invalid_path(
                    path,
                    format!("{part:?} is not a valid XML name"),
                ));
            }
        }

        Ok(Self {
            segments: parts,
            attribute,
        })
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    pub fn attribute(&self) -> Option<&'a str> {
        self.attribute
    }

    /// Wrapper segments and the final element name.
    pub fn split_last(&self) -> Option<(&[&'a str], &'a str)> {
        self.segments
            .split_last()
            .map(|(last, wrappers)| (wrappers, *last))
    }
}

/// Conservative XML name check: a letter or `_` followed by letters, digits,
/// `-`, `_`, `.` or `:`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}
