//! Resources composed of fixed, ordered sections.

use std::path::{Path, PathBuf};

use tproj_mapping::{Mappable, MappingReport};
use tproj_xml::WriteOptions;
use tracing::info;

use crate::error::Result;
use crate::storer::XmlStorer;

/// A section of a resource document.
pub trait Associable: Mappable {
    /// Element under the resource root holding this section's fields.
    fn section(&self) -> &'static str;
}

/// A named root document made of sections.
///
/// The section list is fixed by the type: implementations return the same
/// sections, in the same order, on every call.
pub trait Resource: Default {
    /// Root element name of the resource's document.
    const ROOT: &'static str;

    fn sections(&self) -> Vec<&dyn Associable>;

    fn sections_mut(&mut self) -> Vec<&mut dyn Associable>;
}

/// A resource bound to its backing file.
#[derive(Debug)]
pub struct ResourceFile<R> {
    storer: XmlStorer,
    resource: R,
}

impl<R: Resource> ResourceFile<R> {
    /// Bind a default resource to `path` without touching the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            storer: XmlStorer::new(path, R::ROOT),
            resource: R::default(),
        }
    }

    /// Bind to `path` and load every section from it.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, MappingReport)> {
        let mut file = Self::new(path);
        let report = file.read()?;
        Ok((file, report))
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.storer = self.storer.with_options(options);
        self
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    pub fn into_resource(self) -> R {
        self.resource
    }

    pub fn storer(&self) -> &XmlStorer {
        &self.storer
    }

    pub fn storer_mut(&mut self) -> &mut XmlStorer {
        &mut self.storer
    }

    pub fn path(&self) -> &Path {
        self.storer.path()
    }

    /// Parse the backing file and load every section.
    ///
    /// Nothing is loaded if the file cannot be read or parsed.
    pub fn read(&mut self) -> Result<MappingReport> {
        self.storer.read()?;
        self.init_associations()
    }

    /// Load every section from the current document.
    pub fn init_associations(&mut self) -> Result<MappingReport> {
        let mut report = MappingReport::default();
        for section in self.resource.sections_mut() {
            let name = section.section();
            report.merge(self.storer.init_associations(name, section)?);
        }
        Ok(report)
    }

    /// Store every section into the current document.
    pub fn set_associations(&mut self) -> Result<MappingReport> {
        let mut report = MappingReport::default();
        for section in self.resource.sections() {
            report.merge(self.storer.set_associations(section.section(), section)?);
        }
        Ok(report)
    }

    /// Store every section and write the backing file.
    pub fn write(&mut self) -> Result<MappingReport> {
        let report = self.set_associations()?;
        self.storer.write()?;
        info!(
            root = R::ROOT,
            path = %self.storer.path().display(),
            failures = report.failures.len(),
            "saved resource"
        );
        Ok(report)
    }

    /// Store every section and write to another file.
    pub fn write_as(&mut self, path: &Path) -> Result<MappingReport> {
        let report = self.set_associations()?;
        self.storer.write_as(path)?;
        Ok(report)
    }
}
