//! Persistable values and the declared types of persistable fields.

use std::fmt;

use crate::error::MappingError;

/// A value copied between an object field and a document location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in type mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders a scalar value as document text. Lists have no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Text(text) => Some(text.clone()),
            Value::Integer(number) => Some(number.to_string()),
            Value::Boolean(flag) => Some(flag.to_string()),
            Value::List(_) => None,
        }
    }

    /// Parses document text into a value of the given scalar type.
    pub fn parse_text(text: &str, field_type: FieldType) -> Result<Value, MappingError> {
        match field_type {
            FieldType::Text => Ok(Value::Text(text.to_string())),
            FieldType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| MappingError::InvalidText {
                    expected: "integer",
                    text: text.to_string(),
                }),
            FieldType::Boolean => match text.trim() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(MappingError::InvalidText {
                    expected: "boolean",
                    text: text.to_string(),
                }),
            },
            FieldType::Sequence(_) | FieldType::Opaque => Err(MappingError::TypeMismatch {
                expected: "scalar",
                found: field_type.kind_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{text}"),
            Value::Integer(number) => write!(f, "{number}"),
            Value::Boolean(flag) => write!(f, "{flag}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Declared type of a field.
///
/// `Opaque` stands for a sequence element whose type cannot be resolved; it is
/// only ever legal on fields that are not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Boolean,
    Sequence(&'static FieldType),
    Opaque,
}

impl FieldType {
    pub const fn is_sequence(&self) -> bool {
        matches!(self, FieldType::Sequence(_))
    }

    /// Element type of a sequence.
    pub const fn element(&self) -> Option<&'static FieldType> {
        match self {
            FieldType::Sequence(inner) => Some(*inner),
            _ => None,
        }
    }

    /// Innermost non-sequence type.
    pub fn leaf(&self) -> FieldType {
        let mut current = *self;
        while let FieldType::Sequence(inner) = current {
            current = *inner;
        }
        current
    }

    /// Number of sequence layers wrapping the leaf type.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = *self;
        while let FieldType::Sequence(inner) = current {
            depth += 1;
            current = *inner;
        }
        depth
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Sequence(_) => "sequence",
            FieldType::Opaque => "opaque",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Sequence(inner) => write!(f, "sequence<{inner}>"),
            other => write!(f, "{}", other.kind_name()),
        }
    }
}

/// Conversion of a field into a persistable value.
///
/// `None` means the field is absent (an unset optional).
pub trait ToValue {
    fn to_value(&self) -> Option<Value>;
}

/// Conversion of a persistable value back into a field.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, MappingError>;
}

fn mismatch(expected: &'static str, value: &Value) -> MappingError {
    MappingError::TypeMismatch {
        expected,
        found: value.kind_name(),
    }
}

impl ToValue for String {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Text(self.clone()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Integer(*self))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Integer(number) => Ok(number),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Option<Value> {
        Some(Value::Boolean(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Boolean(flag) => Ok(flag),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        T::from_value(value).map(Some)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Option<Value> {
        Some(Value::List(
            self.iter().filter_map(ToValue::to_value).collect(),
        ))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATRIX: FieldType = FieldType::Sequence(&FieldType::Sequence(&FieldType::Integer));

    #[test]
    fn nested_sequence_resolves_leaf_and_depth() {
        assert_eq!(MATRIX.leaf(), FieldType::Integer);
        assert_eq!(MATRIX.depth(), 2);
        assert_eq!(MATRIX.to_string(), "sequence<sequence<integer>>");
    }

    #[test]
    fn parse_text_rejects_malformed_numbers() {
        let err = Value::parse_text("12a", FieldType::Integer).unwrap_err();
        assert!(matches!(err, MappingError::InvalidText { expected: "integer", .. }));
        assert_eq!(
            Value::parse_text(" 42 ", FieldType::Integer).unwrap(),
            Value::Integer(42)
        );
    }

    #[test]
    fn nested_vectors_convert_both_ways() {
        let rows = vec![vec!["a".to_string()], vec![], vec!["b".to_string(), "c".to_string()]];
        let value = rows.to_value().unwrap();
        let back: Vec<Vec<String>> = FromValue::from_value(value).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn unset_option_has_no_value() {
        let unset: Option<String> = None;
        assert!(unset.to_value().is_none());
    }

    #[test]
    fn from_value_reports_mismatch() {
        let err = bool::from_value(Value::Text("yes".into())).unwrap_err();
        assert!(matches!(
            err,
            MappingError::TypeMismatch {
                expected: "boolean",
                found: "text"
            }
        ));
    }
}
