//! Piece-reference scanning for `.pvtu` index files.
//!
//! The index is not parsed as XML. Each line is searched for the
//! `<Piece Source` marker and the quoted path that follows it, which keeps
//! the scan tolerant of partially written or non-conforming index files.

use crate::mesh_error::MeshCombineError;
use std::fs;
use std::path::{Path, PathBuf};

/// Literal text that introduces a piece reference.
pub const PIECE_MARKER: &str = "<Piece Source";

/// One index file and the partition references it lists, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    pub source: PathBuf,
    /// Raw reference strings, relative to [`IndexDocument::base_dir`].
    pub pieces: Vec<String>,
}

/// Extract every quoted path following [`PIECE_MARKER`] in `text`.
///
/// On a marker without `="..."` (or `='...'`) after it, returns the
/// 1-based line number of the offending line.
pub fn piece_references(text: &str) -> Result<Vec<String>, usize> {
    let mut pieces = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let mut rest = line;
        while let Some(pos) = rest.find(PIECE_MARKER) {
            let after = &rest[pos + PIECE_MARKER.len()..];
            let (value, tail) = quoted_value(after).ok_or(idx + 1)?;
            pieces.push(unescape(value));
            rest = tail;
        }
    }
    Ok(pieces)
}

/// Parse `= "value"` at the start of `input`, returning the value and the
/// remainder after the closing quote.
fn quoted_value(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start().strip_prefix('=')?.trim_start();
    let quote = input.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &input[1..];
    let end = body.find(quote)?;
    Some((&body[..end], &body[end + 1..]))
}

fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

impl IndexDocument {
    /// Scan `text` as the content of the index file at `source`.
    pub fn parse(source: impl Into<PathBuf>, text: &str) -> Result<Self, MeshCombineError> {
        let source = source.into();
        match piece_references(text) {
            Ok(pieces) => Ok(Self { source, pieces }),
            Err(line) => Err(MeshCombineError::MalformedReference { path: source, line }),
        }
    }

    /// Read and scan the index file at `path`.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; only the quoted paths matter.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, MeshCombineError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| MeshCombineError::IndexRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &String::from_utf8_lossy(&bytes))
    }

    /// Directory the references are relative to.
    pub fn base_dir(&self) -> &Path {
        match self.source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// References joined onto [`Self::base_dir`], in file order.
    pub fn resolved_pieces(&self) -> Vec<PathBuf> {
        let base = self.base_dir();
        self.pieces.iter().map(|piece| base.join(piece)).collect()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}
