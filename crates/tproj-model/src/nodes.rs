//! Concrete entity implementations.
//!
//! Every node composes an [`EntityHeader`] and declares its own persistable
//! fields on top of it.

use std::any::Any;

use tproj_mapping::{
    FieldDecl, FieldDescriptor, FieldType, FromValue, Mappable, MappingError, ToValue, TypeInfo,
    Value,
};

use crate::entity::{ENTITY_HEADER_INFO, Entity, EntityHeader};
use crate::kind::EntityKind;

const TEXT_LIST: FieldType = FieldType::Sequence(&FieldType::Text);

macro_rules! impl_entity {
    ($node:ty, $kind:expr) => {
        impl Entity for $node {
            fn kind(&self) -> EntityKind {
                $kind
            }

            fn header(&self) -> &EntityHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut EntityHeader {
                &mut self.header
            }

            fn implementation(&self) -> &'static str {
                stringify!($node)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

static PROJECT_INFO: TypeInfo = TypeInfo {
    name: "ProjectNode",
    fields: &[FieldDecl::new("version", FieldType::Text).single()],
    bases: &[&ENTITY_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectNode {
    pub header: EntityHeader,
    pub version: Option<String>,
}

impl ProjectNode {
    pub fn new(header: EntityHeader) -> Self {
        Self {
            header,
            version: None,
        }
    }
}

impl Mappable for ProjectNode {
    fn type_info(&self) -> &'static TypeInfo {
        &PROJECT_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "version" => self.version.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "version" => self.version = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl_entity!(ProjectNode, EntityKind::Project);

static TEMPLATE_PROJECT_INFO: TypeInfo = TypeInfo {
    name: "TemplateProjectNode",
    fields: &[FieldDecl::new("version", FieldType::Text).single()],
    bases: &[&ENTITY_HEADER_INFO],
};

/// A project that only holds reusable templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateProjectNode {
    pub header: EntityHeader,
    pub version: Option<String>,
}

impl TemplateProjectNode {
    pub fn new(header: EntityHeader) -> Self {
        Self {
            header,
            version: None,
        }
    }
}

impl Mappable for TemplateProjectNode {
    fn type_info(&self) -> &'static TypeInfo {
        &TEMPLATE_PROJECT_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "version" => self.version.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "version" => self.version = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl_entity!(TemplateProjectNode, EntityKind::TemplateProject);

static SUITE_INFO: TypeInfo = TypeInfo {
    name: "SuiteNode",
    fields: &[FieldDecl::new("tags", TEXT_LIST).plural().at("tags/tag")],
    bases: &[&ENTITY_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteNode {
    pub header: EntityHeader,
    pub tags: Vec<String>,
}

impl SuiteNode {
    pub fn new(header: EntityHeader) -> Self {
        Self {
            header,
            tags: Vec::new(),
        }
    }
}

impl Mappable for SuiteNode {
    fn type_info(&self) -> &'static TypeInfo {
        &SUITE_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "tags" => self.tags.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "tags" => self.tags = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl_entity!(SuiteNode, EntityKind::TestSuite);

static CASE_INFO: TypeInfo = TypeInfo {
    name: "CaseNode",
    fields: &[
        FieldDecl::new("priority", FieldType::Integer).single().at("@priority"),
        FieldDecl::new("tags", TEXT_LIST).plural().at("tags/tag"),
    ],
    bases: &[&ENTITY_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseNode {
    pub header: EntityHeader,
    pub priority: Option<i64>,
    pub tags: Vec<String>,
}

impl CaseNode {
    pub fn new(header: EntityHeader) -> Self {
        Self {
            header,
            priority: None,
            tags: Vec::new(),
        }
    }
}

impl Mappable for CaseNode {
    fn type_info(&self) -> &'static TypeInfo {
        &CASE_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "priority" => self.priority.to_value(),
            "tags" => self.tags.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "priority" => self.priority = FromValue::from_value(value)?,
            "tags" => self.tags = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl_entity!(CaseNode, EntityKind::TestCase);

static STEP_INFO: TypeInfo = TypeInfo {
    name: "StepNode",
    fields: &[FieldDecl::new("expected", FieldType::Text).single()],
    bases: &[&ENTITY_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepNode {
    pub header: EntityHeader,
    /// Expected outcome of the step.
    pub expected: Option<String>,
}

impl StepNode {
    pub fn new(header: EntityHeader) -> Self {
        Self {
            header,
            expected: None,
        }
    }
}

impl Mappable for StepNode {
    fn type_info(&self) -> &'static TypeInfo {
        &STEP_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "expected" => self.expected.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "expected" => self.expected = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl_entity!(StepNode, EntityKind::TestStep);

static ACTION_INFO: TypeInfo = TypeInfo {
    name: "ActionNode",
    fields: &[
        FieldDecl::new("keyword", FieldType::Text).single(),
        FieldDecl::new("arguments", TEXT_LIST)
            .plural()
            .at("arguments/argument"),
    ],
    bases: &[&ENTITY_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionNode {
    pub header: EntityHeader,
    pub keyword: Option<String>,
    pub arguments: Vec<String>,
}

impl ActionNode {
    pub fn new(header: EntityHeader) -> Self {
        Self {
            header,
            keyword: None,
            arguments: Vec::new(),
        }
    }
}

impl Mappable for ActionNode {
    fn type_info(&self) -> &'static TypeInfo {
        &ACTION_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "keyword" => self.keyword.to_value(),
            "arguments" => self.arguments.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "keyword" => self.keyword = FromValue::from_value(value)?,
            "arguments" => self.arguments = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl_entity!(ActionNode, EntityKind::TestAction);

static TEMPLATE_INFO: TypeInfo = TypeInfo {
    name: "TemplateNode",
    fields: &[FieldDecl::new("parameters", TEXT_LIST)
        .plural()
        .at("parameters/parameter")],
    bases: &[&ENTITY_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateNode {
    pub header: EntityHeader,
    pub parameters: Vec<String>,
}

impl TemplateNode {
    pub fn new(header: EntityHeader) -> Self {
        Self {
            header,
            parameters: Vec::new(),
        }
    }
}

impl Mappable for TemplateNode {
    fn type_info(&self) -> &'static TypeInfo {
        &TEMPLATE_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "parameters" => self.parameters.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "parameters" => self.parameters = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl_entity!(TemplateNode, EntityKind::Template);

static REFERENCE_INFO: TypeInfo = TypeInfo {
    name: "ReferenceNode",
    fields: &[
        FieldDecl::new("target", FieldType::Text).single().at("@target"),
        FieldDecl::new("target_kind", FieldType::Text)
            .single()
            .at("@target-kind"),
    ],
    bases: &[&ENTITY_HEADER_INFO],
};

/// A logical link to another entity by uid.
///
/// References do not own their target; the target may live anywhere in the
/// tree, or nowhere at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceNode {
    pub header: EntityHeader,
    /// Uid of the referenced entity.
    pub target: String,
    /// Kind the target must have; `None` accepts any kind.
    pub target_kind: Option<EntityKind>,
}

impl ReferenceNode {
    pub fn new(header: EntityHeader) -> Self {
        Self {
            header,
            target: String::new(),
            target_kind: None,
        }
    }

    pub fn pointing_at(mut self, target: impl Into<String>, kind: Option<EntityKind>) -> Self {
        self.target = target.into();
        self.target_kind = kind;
        self
    }
}

impl Mappable for ReferenceNode {
    fn type_info(&self) -> &'static TypeInfo {
        &REFERENCE_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "target" => self.target.to_value(),
            "target_kind" => self
                .target_kind
                .map(|kind| Value::Text(kind.tag().to_string())),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "target" => self.target = FromValue::from_value(value)?,
            "target_kind" => {
                let tag = String::from_value(value)?;
                let kind = tag.parse().map_err(|_| MappingError::InvalidText {
                    expected: "entity kind",
                    text: tag,
                })?;
                self.target_kind = Some(kind);
            }
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl_entity!(ReferenceNode, EntityKind::Reference);

static GENERIC_INFO: TypeInfo = TypeInfo {
    name: "GenericNode",
    fields: &[],
    bases: &[&ENTITY_HEADER_INFO],
};

/// Header-only node built when a kind has no registered implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericNode {
    pub kind: EntityKind,
    pub header: EntityHeader,
}

impl GenericNode {
    pub fn new(kind: EntityKind, header: EntityHeader) -> Self {
        Self { kind, header }
    }
}

impl Mappable for GenericNode {
    fn type_info(&self) -> &'static TypeInfo {
        &GENERIC_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        self.header.field_value(field)
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        self.header.set_field_value(field, value)
    }
}

impl Entity for GenericNode {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }

    fn implementation(&self) -> &'static str {
        "GenericNode"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use tproj_mapping::discover;

    use super::*;

    #[test]
    fn header_fields_come_first() {
        let names: Vec<&str> = discover(&CASE_INFO)
            .unwrap()
            .iter()
            .map(FieldDescriptor::name)
            .collect();
        assert_eq!(names, vec!["name", "uid", "description", "priority", "tags"]);
    }

    #[test]
    fn every_node_registration_is_valid() {
        for info in [
            &PROJECT_INFO,
            &TEMPLATE_PROJECT_INFO,
            &SUITE_INFO,
            &CASE_INFO,
            &STEP_INFO,
            &ACTION_INFO,
            &TEMPLATE_INFO,
            &REFERENCE_INFO,
            &GENERIC_INFO,
        ] {
            assert!(discover(info).is_ok(), "{} failed discovery", info.name);
        }
    }

    #[test]
    fn reference_kind_is_stored_as_tag() {
        let reference = ReferenceNode::new(EntityHeader::new("ref", "r1"))
            .pointing_at("t1", Some(EntityKind::Template));
        let kind_field = discover(&REFERENCE_INFO)
            .unwrap()
            .into_iter()
            .find(|field| field.name() == "target_kind")
            .unwrap();
        assert_eq!(
            reference.field_value(&kind_field),
            Some(Value::Text("template".into()))
        );

        let mut loaded = ReferenceNode::default();
        let err = loaded
            .set_field_value(&kind_field, Value::Text("folder".into()))
            .unwrap_err();
        assert!(matches!(err, MappingError::InvalidText { .. }));
    }
}
