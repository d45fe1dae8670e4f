//! Environment configuration resource.
//!
//! ```text
//! <environment-config>
//!     <servers revision="..">..</servers>
//!     <server-types>..</server-types>
//!     <environments active="..">..</environments>
//!     <environment-links>..</environment-links>
//! </environment-config>
//! ```

use tproj_mapping::{
    FieldDecl, FieldDescriptor, FieldType, FromValue, Mappable, MappingError, ToValue, TypeInfo,
    Value,
};

use crate::resource::{Associable, Resource};

const TEXT_LIST: FieldType = FieldType::Sequence(&FieldType::Text);
const TEXT_TABLE: FieldType = FieldType::Sequence(&TEXT_LIST);

pub static SECTION_HEADER_INFO: TypeInfo = TypeInfo::new(
    "SectionHeader",
    &[
        FieldDecl::new("description", FieldType::Text).single(),
        FieldDecl::new("revision", FieldType::Integer)
            .single()
            .at("@revision"),
    ],
);

/// Fields shared by every environment section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionHeader {
    pub description: Option<String>,
    pub revision: Option<i64>,
}

impl Mappable for SectionHeader {
    fn type_info(&self) -> &'static TypeInfo {
        &SECTION_HEADER_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "description" => self.description.to_value(),
            "revision" => self.revision.to_value(),
            _ => None,
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "description" => self.description = FromValue::from_value(value)?,
            "revision" => self.revision = FromValue::from_value(value)?,
            other => return Err(MappingError::unknown_field(other)),
        }
        Ok(())
    }
}

static SERVERS_INFO: TypeInfo = TypeInfo {
    name: "ServersSection",
    fields: &[
        FieldDecl::new("name", FieldType::Text).single(),
        FieldDecl::new("server_type", FieldType::Text)
            .single()
            .at("server-type"),
        FieldDecl::new("hosts", TEXT_LIST).plural().at("hosts/host"),
        FieldDecl::new("port", FieldType::Integer).single(),
    ],
    bases: &[&SECTION_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServersSection {
    pub header: SectionHeader,
    pub name: Option<String>,
    pub server_type: Option<String>,
    pub hosts: Vec<String>,
    pub port: Option<i64>,
}

impl Mappable for ServersSection {
    fn type_info(&self) -> &'static TypeInfo {
        &SERVERS_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "name" => self.name.to_value(),
            "server_type" => self.server_type.to_value(),
            "hosts" => self.hosts.to_value(),
            "port" => self.port.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "name" => self.name = FromValue::from_value(value)?,
            "server_type" => self.server_type = FromValue::from_value(value)?,
            "hosts" => self.hosts = FromValue::from_value(value)?,
            "port" => self.port = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl Associable for ServersSection {
    fn section(&self) -> &'static str {
        "servers"
    }
}

static SERVER_TYPES_INFO: TypeInfo = TypeInfo {
    name: "ServerTypesSection",
    fields: &[FieldDecl::new("types", TEXT_LIST).plural().at("types/type")],
    bases: &[&SECTION_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerTypesSection {
    pub header: SectionHeader,
    pub types: Vec<String>,
}

impl Mappable for ServerTypesSection {
    fn type_info(&self) -> &'static TypeInfo {
        &SERVER_TYPES_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "types" => self.types.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "types" => self.types = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl Associable for ServerTypesSection {
    fn section(&self) -> &'static str {
        "server-types"
    }
}

static ENVIRONMENT_LIST_INFO: TypeInfo = TypeInfo {
    name: "EnvironmentListSection",
    fields: &[
        FieldDecl::new("active", FieldType::Text).single().at("@active"),
        FieldDecl::new("environments", TEXT_LIST)
            .plural()
            .at("environments/environment"),
    ],
    bases: &[&SECTION_HEADER_INFO],
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentListSection {
    pub header: SectionHeader,
    /// Name of the environment selected for runs.
    pub active: Option<String>,
    pub environments: Vec<String>,
}

impl Mappable for EnvironmentListSection {
    fn type_info(&self) -> &'static TypeInfo {
        &ENVIRONMENT_LIST_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "active" => self.active.to_value(),
            "environments" => self.environments.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "active" => self.active = FromValue::from_value(value)?,
            "environments" => self.environments = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl Associable for EnvironmentListSection {
    fn section(&self) -> &'static str {
        "environments"
    }
}

static ENVIRONMENT_LINKS_INFO: TypeInfo = TypeInfo {
    name: "EnvironmentLinksSection",
    fields: &[FieldDecl::new("links", TEXT_TABLE).plural().at("links/link")],
    bases: &[&SECTION_HEADER_INFO],
};

/// Which server an environment uses for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentLink {
    pub environment: String,
    pub item: String,
    pub server: String,
}

/// Links stored as `[environment, item, server]` rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentLinksSection {
    pub header: SectionHeader,
    pub links: Vec<Vec<String>>,
}

impl EnvironmentLinksSection {
    pub fn push(&mut self, link: EnvironmentLink) {
        self.links
            .push(vec![link.environment, link.item, link.server]);
    }

    /// Rows with exactly three cells; anything else is ignored.
    pub fn entries(&self) -> impl Iterator<Item = EnvironmentLink> + '_ {
        self.links.iter().filter_map(|row| match row.as_slice() {
            [environment, item, server] => Some(EnvironmentLink {
                environment: environment.clone(),
                item: item.clone(),
                server: server.clone(),
            }),
            _ => None,
        })
    }

    /// Server linked to `item` in `environment`.
    pub fn server_for(&self, environment: &str, item: &str) -> Option<String> {
        self.entries()
            .find(|link| link.environment == environment && link.item == item)
            .map(|link| link.server)
    }
}

impl Mappable for EnvironmentLinksSection {
    fn type_info(&self) -> &'static TypeInfo {
        &ENVIRONMENT_LINKS_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "links" => self.links.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "links" => self.links = FromValue::from_value(value)?,
            _ => return self.header.set_field_value(field, value),
        }
        Ok(())
    }
}

impl Associable for EnvironmentLinksSection {
    fn section(&self) -> &'static str {
        "environment-links"
    }
}

/// Servers, server types, environments and their links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentResource {
    pub servers: ServersSection,
    pub server_types: ServerTypesSection,
    pub environments: EnvironmentListSection,
    pub links: EnvironmentLinksSection,
}

impl Resource for EnvironmentResource {
    const ROOT: &'static str = "environment-config";

    fn sections(&self) -> Vec<&dyn Associable> {
        vec![
            &self.servers as &dyn Associable,
            &self.server_types,
            &self.environments,
            &self.links,
        ]
    }

    fn sections_mut(&mut self) -> Vec<&mut dyn Associable> {
        vec![
            &mut self.servers as &mut dyn Associable,
            &mut self.server_types,
            &mut self.environments,
            &mut self.links,
        ]
    }
}
