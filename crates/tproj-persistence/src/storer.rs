//! Load-on-demand XML storage for one backing file.
//!
//! An [`XmlStorer`] owns the in-memory document of one file. The tree starts
//! as [`DocumentState::NotLoaded`]; `read` parses the file into it, the
//! association calls copy objects in and out of named sections, and `write`
//! serializes whatever tree is current. The calls are independent and may be
//! made in any order; reading a section or writing before any `read` works on
//! an "empty but present" document holding only the root element.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tproj_mapping::{Mappable, Mapper, MappingReport};
use tproj_xml::{Document, Element, WriteOptions, XmlError, XmlFormat};
use tracing::{debug, info};

use crate::error::{PersistenceError, Result};
use crate::io::{compute_file_hash, digest, read_file, write_atomic};

/// The storer's document, which may not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DocumentState {
    #[default]
    NotLoaded,
    Loaded(Document),
}

impl DocumentState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, DocumentState::Loaded(_))
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            DocumentState::Loaded(document) => Some(document),
            DocumentState::NotLoaded => None,
        }
    }

    /// The loaded document, or a fresh empty one named `root_name`.
    fn get_or_insert_empty(&mut self, root_name: &str) -> &mut Document {
        match *self {
            DocumentState::Loaded(ref mut document) => document,
            DocumentState::NotLoaded => {
                debug!(root = root_name, "materializing empty document");
                *self = DocumentState::Loaded(Document::new(root_name));
                self.get_or_insert_empty(root_name)
            }
        }
    }
}

#[derive(Debug)]
pub struct XmlStorer {
    path: PathBuf,
    root_name: String,
    state: DocumentState,
    options: WriteOptions,
    mapper: Mapper<XmlFormat>,
    /// SHA-256 of the bytes last read from or written to `path`.
    last_digest: Option<String>,
    dirty: bool,
}

impl XmlStorer {
    pub fn new(path: impl Into<PathBuf>, root_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            root_name: root_name.into(),
            state: DocumentState::NotLoaded,
            options: WriteOptions::default(),
            mapper: Mapper::new(XmlFormat),
            last_digest: None,
            dirty: false,
        }
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_loaded()
    }

    /// True when the tree changed since the last successful read or write.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Digest of the bytes last read from or written to the backing file.
    pub fn last_digest(&self) -> Option<&str> {
        self.last_digest.as_deref()
    }

    pub fn mapper(&self) -> &Mapper<XmlFormat> {
        &self.mapper
    }

    /// The document, materializing an empty one on first access.
    pub fn document(&mut self) -> &Document {
        self.materialize()
    }

    /// Mutable document access; marks the storer dirty.
    pub fn document_mut(&mut self) -> &mut Document {
        self.dirty = true;
        self.materialize()
    }

    fn materialize(&mut self) -> &mut Document {
        self.state.get_or_insert_empty(&self.root_name)
    }

    /// Parse the backing file into the tree.
    ///
    /// On failure the previous tree (or its absence) is kept.
    pub fn read(&mut self) -> Result<()> {
        let bytes = read_file(&self.path)?;
        let path = self.path.clone();
        let document = self.parse(&bytes, Some(&path))?;
        self.state = DocumentState::Loaded(document);
        self.last_digest = Some(digest(&bytes));
        self.dirty = false;
        info!(path = %self.path.display(), root = %self.root_name, "read document");
        Ok(())
    }

    /// Parse a document from a byte stream, e.g. an archive entry.
    ///
    /// The backing file and its digest are left alone.
    pub fn read_from<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| PersistenceError::Stream {
                operation: "read",
                source,
            })?;
        let document = self.parse(&bytes, None)?;
        self.state = DocumentState::Loaded(document);
        self.dirty = true;
        debug!(root = %self.root_name, bytes = bytes.len(), "read document from stream");
        Ok(())
    }

    fn parse(&self, bytes: &[u8], path: Option<&Path>) -> Result<Document> {
        let document = Document::from_bytes(bytes).map_err(|source| PersistenceError::Parse {
            path: path.map(Path::to_path_buf),
            source,
        })?;
        if document.root_name() != self.root_name {
            return Err(PersistenceError::RootMismatch {
                path: path.map(Path::to_path_buf),
                expected: self.root_name.clone(),
                found: document.root_name().to_string(),
            });
        }
        Ok(document)
    }

    /// Serialize the current tree, materializing it if needed.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let options = self.options;
        self.materialize()
            .to_bytes(&options)
            .map_err(|source: XmlError| PersistenceError::Serialization { source })
    }

    /// Write the tree to the backing file.
    pub fn write(&mut self) -> Result<()> {
        let bytes = self.to_bytes()?;
        write_atomic(&self.path, &bytes)?;
        self.last_digest = Some(digest(&bytes));
        self.dirty = false;
        info!(path = %self.path.display(), bytes = bytes.len(), "wrote document");
        Ok(())
    }

    /// Write the tree to another file. The backing path does not change.
    pub fn write_as(&mut self, path: &Path) -> Result<()> {
        if path == self.path {
            return self.write();
        }
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote document copy");
        Ok(())
    }

    /// Write the tree to a byte stream.
    pub fn write_to<W: Write>(&mut self, mut writer: W) -> Result<()> {
        let bytes = self.to_bytes()?;
        writer
            .write_all(&bytes)
            .and_then(|()| writer.flush())
            .map_err(|source| PersistenceError::Stream {
                operation: "write",
                source,
            })
    }

    /// Whether the backing file differs from what was last read or written.
    ///
    /// A file that never went through this storer counts as changed when it
    /// exists.
    pub fn changed_on_disk(&self) -> Result<bool> {
        let current = match compute_file_hash(&self.path) {
            Ok(hash) => Some(hash),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };
        Ok(current.as_deref() != self.last_digest.as_deref())
    }

    /// Copy the section's element into `object`.
    ///
    /// A missing section loads like an empty element: scalars keep their
    /// values and collections become empty.
    pub fn init_associations(
        &mut self,
        section: &str,
        object: &mut dyn Mappable,
    ) -> Result<MappingReport> {
        let empty = Element::new(section);
        let document = self.state.get_or_insert_empty(&self.root_name);
        let node = document.root().child(section).unwrap_or(&empty);
        let report = self.mapper.load(object, node)?;
        debug!(
            section,
            mapped = report.mapped,
            failures = report.failures.len(),
            "loaded section"
        );
        Ok(report)
    }

    /// Copy `object` into the section's element, creating it when missing.
    pub fn set_associations(
        &mut self,
        section: &str,
        object: &dyn Mappable,
    ) -> Result<MappingReport> {
        self.dirty = true;
        let document = self.state.get_or_insert_empty(&self.root_name);
        let node = document.root_mut().ensure_child(section);
        let report = self.mapper.save(object, node)?;
        debug!(
            section,
            mapped = report.mapped,
            failures = report.failures.len(),
            "stored section"
        );
        Ok(report)
    }
}
