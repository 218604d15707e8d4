//! Resource providers map a file name found in an OBJ or MTL file to a readable stream

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::PathBuf;

use crate::error::{MeshError, MeshResult};

/// Opens named resources as byte streams
///
/// The returned stream is owned by the caller and dropped as soon as it has
/// been consumed. Any `Fn(&str) -> io::Result<Box<dyn Read>>` closure is a
/// provider too.
pub trait ResourceProvider {
    /// Open `name` for reading
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>>;
}

impl<F> ResourceProvider for F
where
    F: Fn(&str) -> io::Result<Box<dyn Read>>,
{
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        self(name)
    }
}

/// Resolves names against a base directory
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    /// Create a provider rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceProvider for DirectoryProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        let path = self.root.join(name);
        log::trace!("Opening resource {:?}", path);
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Serves named byte blobs from memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    files: HashMap<String, Vec<u8>>,
}

impl InMemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(name, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> &mut Self {
        self.files.insert(name.into(), contents.into());
        self
    }
}

impl ResourceProvider for InMemoryProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        self.files
            .get(name)
            .map(|bytes| Box::new(Cursor::new(bytes.as_slice())) as Box<dyn Read + '_>)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no resource named '{name}'")))
    }
}

/// Open `name` and read it to the end
pub(crate) fn read_bytes(provider: &dyn ResourceProvider, name: &str) -> MeshResult<Vec<u8>> {
    let io_error = |source| MeshError::ResourceIo {
        name: name.to_string(),
        source,
    };

    let mut reader = provider.open(name).map_err(io_error)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(io_error)?;
    Ok(bytes)
}

/// Open `name` and read it as UTF-8 text
pub(crate) fn read_text(provider: &dyn ResourceProvider, name: &str) -> MeshResult<String> {
    let bytes = read_bytes(provider, name)?;
    String::from_utf8(bytes).map_err(|e| MeshError::ResourceIo {
        name: name.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })
}
