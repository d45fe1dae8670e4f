//! Mapper behaviour against a minimal in-memory document format.

use std::collections::BTreeMap;

use tproj_mapping::{
    DiscoveryError, Direction, DocumentFormat, FieldDecl, FieldDescriptor, FieldType, FromValue,
    Mappable, Mapper, MappingError, ToValue, TypeInfo, Value,
};

const TEXT_LIST: FieldType = FieldType::Sequence(&FieldType::Text);
const TEXT_TABLE: FieldType = FieldType::Sequence(&TEXT_LIST);

/// Stores each value under its path string.
#[derive(Debug, Default)]
struct FlatFormat;

type FlatNode = BTreeMap<String, Value>;

fn check_path(path: &str) -> Result<(), MappingError> {
    if path.split('/').any(str::is_empty) {
        return Err(MappingError::invalid_path(path, "empty segment"));
    }
    Ok(())
}

impl DocumentFormat for FlatFormat {
    type Node = FlatNode;

    fn write_field(
        &self,
        node: &mut FlatNode,
        field: &FieldDescriptor,
        value: Option<&Value>,
    ) -> Result<(), MappingError> {
        check_path(field.path())?;
        match value {
            Some(value) => {
                node.insert(field.path().to_string(), value.clone());
            }
            None => {
                node.remove(field.path());
            }
        }
        Ok(())
    }

    fn read_field(
        &self,
        node: &FlatNode,
        field: &FieldDescriptor,
    ) -> Result<Option<Value>, MappingError> {
        check_path(field.path())?;
        Ok(node.get(field.path()).cloned())
    }
}

static HEADER_INFO: TypeInfo = TypeInfo::new(
    "Header",
    &[FieldDecl::new("name", FieldType::Text).single()],
);

static SERVER_INFO: TypeInfo = TypeInfo {
    name: "Server",
    fields: &[
        FieldDecl::new("port", FieldType::Integer).single(),
        FieldDecl::new("hosts", TEXT_LIST).plural().at("hosts/host"),
        FieldDecl::new("aliases", TEXT_TABLE).plural(),
        FieldDecl::new("legacy", FieldType::Text).single().at("old//legacy"),
        FieldDecl::new("cache", FieldType::Text),
    ],
    bases: &[&HEADER_INFO],
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Header {
    name: Option<String>,
}

impl Mappable for Header {
    fn type_info(&self) -> &'static TypeInfo {
        &HEADER_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "name" => self.name.to_value(),
            _ => None,
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "name" => self.name = FromValue::from_value(value)?,
            other => return Err(MappingError::unknown_field(other)),
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Server {
    header: Header,
    port: i64,
    hosts: Vec<String>,
    aliases: Vec<Vec<String>>,
    legacy: Option<String>,
    cache: String,
}

impl Mappable for Server {
    fn type_info(&self) -> &'static TypeInfo {
        &SERVER_INFO
    }

    fn field_value(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name() {
            "port" => self.port.to_value(),
            "hosts" => self.hosts.to_value(),
            "aliases" => self.aliases.to_value(),
            "legacy" => self.legacy.to_value(),
            _ => self.header.field_value(field),
        }
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MappingError> {
        match field.name() {
            "port" => self.port = FromValue::from_value(value)?,
            "hosts" => self.hosts = FromValue::from_value(value)?,
            "aliases" => self.aliases = FromValue::from_value(value)?,
            "legacy" => self.legacy = FromValue::from_value(value)?,
            _ => self.header.set_field_value(field, value)?,
        }
        Ok(())
    }
}

fn sample_server() -> Server {
    Server {
        header: Header {
            name: Some("srv1".to_string()),
        },
        port: 8080,
        hosts: vec!["h1".to_string(), "h2".to_string()],
        aliases: vec![
            vec!["a".to_string(), "b".to_string()],
            vec![],
            vec!["c".to_string()],
        ],
        legacy: Some("ignored".to_string()),
        cache: "not persisted".to_string(),
    }
}

#[test]
fn save_then_load_reproduces_persisted_fields() {
    let mapper = Mapper::new(FlatFormat);
    let original = sample_server();
    let mut node = FlatNode::new();
    mapper.save(&original, &mut node).unwrap();

    let mut loaded = Server::default();
    mapper.load(&mut loaded, &node).unwrap();

    assert_eq!(loaded.header, original.header);
    assert_eq!(loaded.port, 8080);
    assert_eq!(loaded.hosts, vec!["h1", "h2"]);
    assert_eq!(loaded.aliases, original.aliases);
    assert_eq!(loaded.cache, "");
}

#[test]
fn broken_field_does_not_stop_the_rest() {
    let mapper = Mapper::new(FlatFormat);
    let mut node = FlatNode::new();
    let report = mapper.save(&sample_server(), &mut node).unwrap();

    assert_eq!(report.mapped, 4);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.owner, "Server");
    assert_eq!(failure.field, "legacy");
    assert_eq!(failure.direction, Direction::Save);
    assert!(matches!(failure.error, MappingError::InvalidPath { .. }));
    assert_eq!(node.get("port"), Some(&Value::Integer(8080)));
}

#[test]
fn empty_collections_round_trip_as_empty() {
    let mapper = Mapper::new(FlatFormat);
    let server = Server {
        header: Header::default(),
        ..Server::default()
    };
    let mut node = FlatNode::new();
    mapper.save(&server, &mut node).unwrap();
    assert_eq!(node.get("hosts/host"), Some(&Value::List(Vec::new())));
    assert!(!node.contains_key("name"));

    let mut from_empty = sample_server();
    let report = mapper.load(&mut from_empty, &FlatNode::new()).unwrap();
    assert!(from_empty.hosts.is_empty());
    assert!(from_empty.aliases.is_empty());
    // Absent scalars are left alone.
    assert_eq!(from_empty.port, 8080);
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn saving_twice_is_idempotent() {
    let mapper = Mapper::new(FlatFormat);
    let server = sample_server();
    let mut once = FlatNode::new();
    mapper.save(&server, &mut once).unwrap();
    let mut twice = once.clone();
    mapper.save(&server, &mut twice).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn loading_twice_leaves_object_unchanged() {
    let mapper = Mapper::new(FlatFormat);
    let mut node = FlatNode::new();
    mapper.save(&sample_server(), &mut node).unwrap();

    let mut loaded = Server::default();
    mapper.load(&mut loaded, &node).unwrap();
    let snapshot = loaded.clone();
    mapper.load(&mut loaded, &node).unwrap();
    assert_eq!(loaded, snapshot);
}

#[test]
fn mistyped_document_value_is_reported_on_load() {
    let mapper = Mapper::new(FlatFormat);
    let mut node = FlatNode::new();
    node.insert("port".to_string(), Value::Text("eighty".to_string()));
    node.insert("name".to_string(), Value::Text("srv2".to_string()));

    let mut server = Server::default();
    let report = mapper.load(&mut server, &node).unwrap();
    assert_eq!(server.header.name.as_deref(), Some("srv2"));
    assert_eq!(server.port, 0);
    assert!(report.failures.iter().any(|f| f.field == "port"
        && f.error
            == MappingError::TypeMismatch {
                expected: "integer",
                found: "text"
            }));
}

static CONFLICTED_INFO: TypeInfo = TypeInfo::new(
    "Conflicted",
    &[FieldDecl::new("value", FieldType::Text).single().plural()],
);

struct Conflicted;

impl Mappable for Conflicted {
    fn type_info(&self) -> &'static TypeInfo {
        &CONFLICTED_INFO
    }

    fn field_value(&self, _field: &FieldDescriptor) -> Option<Value> {
        None
    }

    fn set_field_value(&mut self, field: &FieldDescriptor, _value: Value) -> Result<(), MappingError> {
        Err(MappingError::unknown_field(field.name()))
    }
}

#[test]
fn configuration_errors_abort_the_type() {
    let mapper = Mapper::new(FlatFormat);
    let mut node = FlatNode::new();
    let err = mapper.save(&Conflicted, &mut node).unwrap_err();
    assert_eq!(
        err,
        DiscoveryError::ConflictingMarkers {
            owner: "Conflicted",
            field: "value"
        }
    );
    assert!(node.is_empty());
}

#[test]
fn descriptors_are_discovered_once_per_type() {
    let mapper = Mapper::new(FlatFormat);
    let server = sample_server();
    let first = mapper.descriptors(&server).unwrap();
    mapper.save(&server, &mut FlatNode::new()).unwrap();
    let names: Vec<&str> = first.iter().map(FieldDescriptor::name).collect();
    assert_eq!(names, vec!["name", "port", "hosts", "aliases", "legacy"]);
    assert_eq!(mapper.registry().len(), 1);
}
