//! Field registrations and descriptor discovery.
//!
//! Every persistable type publishes a static [`TypeInfo`]: its own field
//! declarations plus the `TypeInfo`s of the types it is composed from. Discovery
//! flattens that graph into an ordered list of [`FieldDescriptor`]s.
//!
//! # Ordering
//!
//! Discovery is depth-first with bases before the declaring type, bases in the
//! order they are listed and fields in declaration order. A type reached twice
//! (a shared ancestor) is only visited the first time, so each field appears
//! exactly once.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::DiscoveryError;
use crate::value::FieldType;

/// Declaration of one field of a persistable type.
///
/// Built in `const` context:
///
/// ```
/// use tproj_mapping::{FieldDecl, FieldType};
///
/// const HOSTS: FieldDecl = FieldDecl::new("hosts", FieldType::Sequence(&FieldType::Text))
///     .plural()
///     .at("hosts/host");
/// assert_eq!(HOSTS.path(), "hosts/host");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub field_type: FieldType,
    single: bool,
    plural: bool,
    path: Option<&'static str>,
}

impl FieldDecl {
    /// Create an unmarked (not persisted) declaration.
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            single: false,
            plural: false,
            path: None,
        }
    }

    /// Mark the field as a single persisted value.
    pub const fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Mark the field as a persisted sequence of values.
    pub const fn plural(mut self) -> Self {
        self.plural = true;
        self
    }

    /// Set the document path (defaults to the field name).
    pub const fn at(mut self, path: &'static str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn path(&self) -> &'static str {
        self.path.unwrap_or(self.name)
    }

    pub const fn is_marked(&self) -> bool {
        self.single || self.plural
    }
}

/// Static registration of a persistable type.
///
/// Types without bases use [`TypeInfo::new`]; composed types spell out the
/// struct so the base list lives in the static:
///
/// ```
/// use tproj_mapping::{FieldDecl, FieldType, TypeInfo};
///
/// static HEADER: TypeInfo =
///     TypeInfo::new("Header", &[FieldDecl::new("name", FieldType::Text).single()]);
/// static SERVER: TypeInfo = TypeInfo {
///     name: "Server",
///     fields: &[FieldDecl::new("port", FieldType::Integer).single()],
///     bases: &[&HEADER],
/// };
/// assert_eq!(SERVER.bases.len(), 1);
/// ```
#[derive(Debug)]
pub struct TypeInfo {
    pub name: &'static str,
    pub fields: &'static [FieldDecl],
    pub bases: &'static [&'static TypeInfo],
}

impl TypeInfo {
    pub const fn new(name: &'static str, fields: &'static [FieldDecl]) -> Self {
        Self {
            name,
            fields,
            bases: &[],
        }
    }
}

/// How a field is laid out in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistenceKind {
    Scalar,
    Collection,
    CollectionOfCollections,
}

impl PersistenceKind {
    pub fn is_collection(&self) -> bool {
        !matches!(self, PersistenceKind::Scalar)
    }
}

/// A discovered persistable field. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    owner: &'static str,
    name: &'static str,
    kind: PersistenceKind,
    path: &'static str,
    field_type: FieldType,
}

impl FieldDescriptor {
    /// Name of the type that declares the field.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> PersistenceKind {
        self.kind
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// `owner.name`, for messages.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }
}

/// Classify one declaration.
///
/// Returns `Ok(None)` for fields without a persistence marker.
pub fn classify(
    owner: &'static str,
    decl: &FieldDecl,
) -> Result<Option<FieldDescriptor>, DiscoveryError> {
    let kind = match (decl.single, decl.plural) {
        (false, false) => return Ok(None),
        (true, true) => {
            return Err(DiscoveryError::ConflictingMarkers {
                owner,
                field: decl.name,
            });
        }
        (true, false) => {
            if decl.field_type.is_sequence() {
                return Err(DiscoveryError::SingleOnSequence {
                    owner,
                    field: decl.name,
                    field_type: decl.field_type,
                });
            }
            if decl.field_type == FieldType::Opaque {
                return Err(DiscoveryError::UnresolvedElementType {
                    owner,
                    field: decl.name,
                });
            }
            PersistenceKind::Scalar
        }
        (false, true) => classify_plural(owner, decl)?,
    };
    Ok(Some(FieldDescriptor {
        owner,
        name: decl.name,
        kind,
        path: decl.path(),
        field_type: decl.field_type,
    }))
}

fn classify_plural(
    owner: &'static str,
    decl: &FieldDecl,
) -> Result<PersistenceKind, DiscoveryError> {
    let Some(element) = decl.field_type.element() else {
        return Err(DiscoveryError::PluralOnScalar {
            owner,
            field: decl.name,
            field_type: decl.field_type,
        });
    };
    if decl.field_type.leaf() == FieldType::Opaque {
        return Err(DiscoveryError::UnresolvedElementType {
            owner,
            field: decl.name,
        });
    }
    if element.is_sequence() {
        Ok(PersistenceKind::CollectionOfCollections)
    } else {
        Ok(PersistenceKind::Collection)
    }
}

/// Discover the ordered descriptor list of a type and everything it is
/// composed from.
pub fn discover(info: &'static TypeInfo) -> Result<Vec<FieldDescriptor>, DiscoveryError> {
    let mut visited: Vec<&'static TypeInfo> = Vec::new();
    let mut descriptors = Vec::new();
    visit(info, &mut visited, &mut descriptors)?;

    let mut paths: BTreeMap<&'static str, &FieldDescriptor> = BTreeMap::new();
    for descriptor in &descriptors {
        if let Some(first) = paths.insert(descriptor.path, descriptor) {
            return Err(DiscoveryError::DuplicatePath {
                owner: info.name,
                path: descriptor.path,
                first: first.qualified_name(),
                second: descriptor.qualified_name(),
            });
        }
    }

    debug!(
        type_name = info.name,
        descriptors = descriptors.len(),
        "discovered field descriptors"
    );
    Ok(descriptors)
}

fn visit(
    info: &'static TypeInfo,
    visited: &mut Vec<&'static TypeInfo>,
    out: &mut Vec<FieldDescriptor>,
) -> Result<(), DiscoveryError> {
    // Types are identified by their static, names only label them.
    if let Some(seen) = visited.iter().find(|seen| seen.name == info.name) {
        if std::ptr::eq(*seen, info) {
            return Ok(());
        }
        return Err(DiscoveryError::DuplicateTypeName { name: info.name });
    }
    visited.push(info);
    for base in info.bases {
        visit(base, visited, out)?;
    }
    for decl in info.fields {
        if let Some(descriptor) = classify(info.name, decl)? {
            out.push(descriptor);
        }
    }
    Ok(())
}
