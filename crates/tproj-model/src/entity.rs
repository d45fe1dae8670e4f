//! The entity capability shared by every tree node.

use std::any::Any;
use std::fmt;

use tproj_mapping::{
    FieldDecl, FieldDescriptor, FieldType, FromValue, Mappable, MappingError, ToValue, TypeInfo,
    Value,
};

use crate::kind::EntityKind;

/// A node of a test project tree.
///
/// Entities only know their own data; parent and child links live in the
/// [`EntityTree`](crate::tree::EntityTree) that owns them.
pub trait Entity: Mappable + fmt::Debug {
    fn kind(&self) -> EntityKind;

    fn header(&self) -> &EntityHeader;

    fn header_mut(&mut self) -> &mut EntityHeader;

    /// Name of the concrete type, as registered with the factory.
    fn implementation(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn name(&self) -> &str {
        &self.header().name
    }

    fn set_name(&mut self, name: String) {
        self.header_mut().name = name;
    }

    fn uid(&self) -> &str {
        &self.header().uid
    }

    fn description(&self) -> Option<&str> {
        self.header().description.as_deref()
    }
}

impl<'a> dyn Entity + 'a {
    pub fn downcast_ref<T: Entity + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Entity + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

pub static ENTITY_HEADER_INFO: TypeInfo = TypeInfo::new(
    "EntityHeader",
    &[
        FieldDecl::new("name", FieldType::Text).single().at("@name"),
        FieldDecl::new("uid", FieldType::Text).single().at("@uid"),
        FieldDecl::new("description", FieldType::Text).single(),
    ],
);

/// Identity fields composed into every concrete entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityHeader {
    pub name: String,
    pub uid: String,
    pub description: Option<String>,
}

impl EntityHeader {
    pub fn new(name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: uid.into(),
            description: None,
        }
    }
}

impl Mappable for EntityHeader {
    fn type_info(&self) -> &'static TypeInfo {
        &ENTITY_HEADER_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "name" => self.name.to_value(),
            "uid" => self.uid.to_value(),
            "description" => self.description.to_value(),
            _ => None,
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "name" => self.name = FromValue::from_value(value)?,
            "uid" => self.uid = FromValue::from_value(value)?,
            "description" => self.description = FromValue::from_value(value)?,
            other => return Err(MappingError::unknown_field(other)),
        }
        Ok(())
    }
}
