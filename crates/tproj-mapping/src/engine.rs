//! Format-agnostic mapping between objects and document nodes.
//!
//! [`Mapper`] walks the descriptors of an object and hands each field to a
//! [`DocumentFormat`], which knows how to place values in its own node type.
//! A field that fails is logged and recorded in the [`MappingReport`]; the
//! remaining fields are still processed. Only a broken type registration
//! ([`DiscoveryError`]) stops a save or load.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::descriptor::{FieldDescriptor, PersistenceKind, TypeInfo};
use crate::error::{DiscoveryError, MappingError};
use crate::registry::DescriptorRegistry;
use crate::value::{FieldType, Value};

/// An object whose fields can be copied to and from a document.
///
/// Types composed from a base delegate the base's fields to it:
///
/// ```ignore
/// fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
///     match field.name() {
///         "hosts" => self.hosts.to_value(),
///         _ => self.header.field_value(field),
///     }
/// }
/// ```
pub trait Mappable {
    fn type_info(&self) -> &'static TypeInfo;

    /// Current value of a field, `None` when unset.
    fn field_value(&self, field: &FieldDescriptor) -> Option<Value>;

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value)
    -> Result<(), MappingError>;
}

/// Document-specific placement of field values.
pub trait DocumentFormat {
    type Node;

    /// Write `value` at the field's path, replacing what is there.
    ///
    /// `None` is only passed for scalars and clears the location. Collection
    /// values are always `Value::List`.
    fn write_field(
        &self,
        node: &mut Self::Node,
        field: &FieldDescriptor,
        value: Option<&Value>,
    ) -> Result<(), MappingError>;

    /// Read the value at the field's path.
    ///
    /// Absent scalars are `None`; absent collections may be `None` or an empty
    /// list.
    fn read_field(
        &self,
        node: &Self::Node,
        field: &FieldDescriptor,
    ) -> Result<Option<Value>, MappingError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Save,
    Load,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Save => write!(f, "save"),
            Direction::Load => write!(f, "load"),
        }
    }
}

/// A field that could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub owner: &'static str,
    pub field: &'static str,
    pub path: &'static str,
    pub direction: Direction,
    pub error: MappingError,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{} at {:?}: {}",
            self.direction, self.owner, self.field, self.path, self.error
        )
    }
}

/// Outcome of a save or load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingReport {
    /// Fields copied successfully.
    pub mapped: usize,
    pub failures: Vec<FieldFailure>,
}

impl MappingReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: MappingReport) {
        self.mapped += other.mapped;
        self.failures.extend(other.failures);
    }
}

/// Copies objects to and from nodes of one document format.
#[derive(Debug, Default)]
pub struct Mapper<F> {
    format: F,
    registry: DescriptorRegistry,
}

impl<F: DocumentFormat> Mapper<F> {
    pub fn new(format: F) -> Self {
        Self {
            format,
            registry: DescriptorRegistry::new(),
        }
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    pub fn descriptors(
        &self,
        object: &dyn Mappable,
    ) -> Result<Arc<[FieldDescriptor]>, DiscoveryError> {
        self.registry.descriptors(object.type_info())
    }

    /// Write every persistable field of `object` into `node`.
    pub fn save(
        &self,
        object: &dyn Mappable,
        node: &mut F::Node,
    ) -> Result<MappingReport, DiscoveryError> {
        let descriptors = self.descriptors(object)?;
        let mut report = MappingReport::default();
        for field in descriptors.iter() {
            let outcome = outgoing(field, object.field_value(field))
                .and_then(|value| self.format.write_field(node, field, value.as_ref()));
            record(&mut report, field, Direction::Save, outcome);
        }
        Ok(report)
    }

    /// Populate every persistable field of `object` from `node`.
    ///
    /// Scalars missing from the node leave the field untouched; missing
    /// collections load as empty.
    pub fn load(
        &self,
        object: &mut dyn Mappable,
        node: &F::Node,
    ) -> Result<MappingReport, DiscoveryError> {
        let descriptors = self.descriptors(object)?;
        let mut report = MappingReport::default();
        for field in descriptors.iter() {
            let outcome = self
                .format
                .read_field(node, field)
                .and_then(|value| incoming(field, value))
                .and_then(|value| match value {
                    Some(value) => object.set_field_value(field, value),
                    None => Ok(()),
                });
            record(&mut report, field, Direction::Load, outcome);
        }
        Ok(report)
    }
}

fn record(
    report: &mut MappingReport,
    field: &FieldDescriptor,
    direction: Direction,
    outcome: Result<(), MappingError>,
) {
    match outcome {
        Ok(()) => report.mapped += 1,
        Err(error) => {
            warn!(
                owner = field.owner(),
                field = field.name(),
                path = field.path(),
                %direction,
                %error,
                "field mapping failed, continuing with remaining fields"
            );
            report.failures.push(FieldFailure {
                owner: field.owner(),
                field: field.name(),
                path: field.path(),
                direction,
                error,
            });
        }
    }
}

/// Normalize a field value before it is written.
fn outgoing(field: &FieldDescriptor, value: Option<Value>) -> Result<Option<Value>, MappingError> {
    match (field.kind(), value) {
        (PersistenceKind::Scalar, None) => Ok(None),
        (kind, None) if kind.is_collection() => Ok(Some(Value::List(Vec::new()))),
        (_, Some(value)) => {
            conforms(&value, field.field_type())?;
            Ok(Some(value))
        }
        (_, None) => Ok(None),
    }
}

/// Normalize a value read from the document before it reaches the object.
fn incoming(field: &FieldDescriptor, value: Option<Value>) -> Result<Option<Value>, MappingError> {
    match (field.kind(), value) {
        (kind, None) if kind.is_collection() => Ok(Some(Value::List(Vec::new()))),
        (_, Some(value)) => {
            conforms(&value, field.field_type())?;
            Ok(Some(value))
        }
        (_, None) => Ok(None),
    }
}

/// Check that a value has the shape of the declared field type.
pub fn conforms(value: &Value, field_type: FieldType) -> Result<(), MappingError> {
    let expected = field_type.kind_name();
    match (value, field_type) {
        (Value::Text(_), FieldType::Text)
        | (Value::Integer(_), FieldType::Integer)
        | (Value::Boolean(_), FieldType::Boolean) => Ok(()),
        (Value::List(items), FieldType::Sequence(element)) => items
            .iter()
            .try_for_each(|item| conforms(item, *element)),
        (other, _) => Err(MappingError::TypeMismatch {
            expected,
            found: other.kind_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT_LIST: FieldType = FieldType::Sequence(&FieldType::Text);

    #[test]
    fn conforms_checks_nested_elements() {
        let good = Value::List(vec![Value::Text("a".into())]);
        let bad = Value::List(vec![Value::Integer(1)]);
        assert!(conforms(&good, TEXT_LIST).is_ok());
        assert_eq!(
            conforms(&bad, TEXT_LIST),
            Err(MappingError::TypeMismatch {
                expected: "text",
                found: "integer"
            })
        );
    }

    #[test]
    fn report_merge_accumulates() {
        let mut report = MappingReport {
            mapped: 2,
            failures: Vec::new(),
        };
        report.merge(MappingReport {
            mapped: 1,
            failures: vec![FieldFailure {
                owner: "A",
                field: "b",
                path: "b",
                direction: Direction::Load,
                error: MappingError::unknown_field("b"),
            }],
        });
        assert_eq!(report.mapped, 3);
        assert!(!report.is_clean());
        assert_eq!(
            report.failures[0].to_string(),
            "load A.b at \"b\": unknown field b"
        );
    }
}
