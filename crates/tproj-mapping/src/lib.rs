//! Declarative field mapping for persisted objects.
//!
//! Types describe their persistable fields with static [`TypeInfo`]
//! registrations. [`discover`] turns a registration (and every type it is
//! composed from) into an ordered list of [`FieldDescriptor`]s, and a
//! [`Mapper`] uses those descriptors to copy field values to and from the node
//! type of a [`DocumentFormat`].
//!
//! The crate does not know any concrete document format; see `tproj-xml` for
//! the XML one.

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod registry;
pub mod value;

pub use descriptor::{FieldDecl, FieldDescriptor, PersistenceKind, TypeInfo, classify, discover};
pub use engine::{
    Direction, DocumentFormat, FieldFailure, Mappable, Mapper, MappingReport, conforms,
};
pub use error::{DiscoveryError, MappingError};
pub use registry::DescriptorRegistry;
pub use value::{FieldType, FromValue, ToValue, Value};
