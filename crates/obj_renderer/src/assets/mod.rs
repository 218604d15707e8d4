//! Asset loading: OBJ geometry, MTL materials, texture images
//!
//! Every file is reached through a [`ResourceProvider`], so a mesh can be
//! loaded from a directory, an archive or memory alike.

pub mod image_loader;
pub mod material_grouper;
pub mod mtl_parser;
pub mod obj_loader;
pub mod resource_provider;

pub use image_loader::ImageData;
pub use material_grouper::{GroupKey, MaterialGroup, MaterialGrouper, MaterialGroups};
pub use mtl_parser::{Material, MaterialLibrary, MtlParser};
pub use obj_loader::{Face, FaceVertex, ObjDocument, ObjLoader};
pub use resource_provider::{DirectoryProvider, InMemoryProvider, ResourceProvider};

use thiserror::Error;

/// Syntax error in an OBJ or MTL file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{file}:{line}: {kind}")]
pub struct ParseError {
    /// File the error was found in
    pub file: String,
    /// 1-based line number
    pub line: usize,
    /// What went wrong
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(file: &str, line: usize, kind: ParseErrorKind) -> Self {
        Self {
            file: file.to_string(),
            line,
            kind,
        }
    }
}

/// Kinds of syntax errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A statement lacks a required value
    #[error("'{0}' is missing a value")]
    MissingValue(String),

    /// A numeric value could not be parsed
    #[error("'{statement}' has invalid number '{token}'")]
    InvalidNumber {
        /// Statement keyword
        statement: String,
        /// Offending token
        token: String,
    },

    /// A face vertex reference is not of the form `p`, `p/t`, `p//n` or `p/t/n`
    #[error("invalid face vertex '{0}'")]
    InvalidFaceVertex(String),

    /// A face with more than three vertices while triangulation is disabled
    #[error("face has {0} vertices; only triangles are supported (enable triangulation to split polygons)")]
    NonTriangularFace(usize),

    /// A face with fewer than three vertices
    #[error("degenerate face with {0} vertices")]
    DegenerateFace(usize),

    /// An index referencing an attribute that does not exist
    #[error("{attribute} index {index} out of range ({count} defined)")]
    IndexOutOfRange {
        /// Attribute array name
        attribute: &'static str,
        /// Index as written in the file
        index: i64,
        /// Number of elements the index was checked against
        count: usize,
    },
}

/// Split file contents into logical lines, joining `\` continuations.
///
/// Each entry carries the 1-based number of the physical line it starts on.
pub(crate) fn logical_lines(contents: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in contents.lines().enumerate() {
        let (start, mut text) = pending.take().unwrap_or_else(|| (index + 1, String::new()));
        let trimmed = raw.trim_end();

        if let Some(body) = trimmed.strip_suffix('\\') {
            text.push_str(body);
            text.push(' ');
            pending = Some((start, text));
        } else {
            text.push_str(trimmed);
            lines.push((start, text));
        }
    }

    if let Some(rest) = pending {
        lines.push(rest);
    }

    lines
}
