//! Mesh I/O for partitioned VTK datasets.
//!
//! This module provides trait-based readers and writers for unstructured
//! grids, the `.pvtu` piece-reference scan and the path-aware entry points
//! used by the combine pipeline.

pub mod binary;
pub mod pvtu;
pub mod vtu;

use crate::data::grid::{CombinedMesh, MeshPartition};
use crate::mesh_error::{MeshCombineError, VtuError};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// How data arrays are stored in written files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataEncoding {
    /// Whitespace-separated text.
    #[default]
    Ascii,
    /// Inline base64 blocks.
    Binary,
}

/// Trait for readers that load one partition.
pub trait MeshReader {
    /// Parse a partition from a reader.
    fn read<R: Read>(&self, reader: R) -> Result<MeshPartition, VtuError>;
}

/// Trait for writers that serialize a combined grid.
pub trait MeshWriter {
    /// Write the grid to a writer.
    fn write<W: Write>(&self, writer: W, mesh: &CombinedMesh) -> io::Result<()>;

    /// File extension of the written format, without the dot.
    fn extension(&self) -> &'static str;
}

/// Load the partition at `path`, attaching the path to any failure.
pub fn read_partition<M: MeshReader>(
    reader: &M,
    path: &Path,
) -> Result<MeshPartition, MeshCombineError> {
    let file = File::open(path).map_err(|source| MeshCombineError::PartitionRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    io::BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|source| MeshCombineError::PartitionRead {
            path: path.to_path_buf(),
            source,
        })?;
    reader
        .read(bytes.as_slice())
        .map_err(|err| MeshCombineError::PartitionFormat {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
}

/// Sibling temporary file a write to `path` goes through.
pub fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "combined".to_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `mesh` to `path` atomically.
///
/// Missing parent directories are created. The grid is written to
/// [`temp_path`], optionally fsynced, then renamed over `path`; on failure
/// the temporary is removed and `path` is left as it was.
pub fn write_mesh<M: MeshWriter>(
    writer: &M,
    mesh: &CombinedMesh,
    path: &Path,
    durable: bool,
) -> Result<(), MeshCombineError> {
    let write_err = |source: io::Error| MeshCombineError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_err)?;
    }

    let tmp = temp_path(path);
    let result = write_temp(writer, mesh, &tmp, durable).and_then(|()| fs::rename(&tmp, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    Ok(())
}

fn write_temp<M: MeshWriter>(
    writer: &M,
    mesh: &CombinedMesh,
    tmp: &Path,
    durable: bool,
) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(tmp)?);
    writer.write(&mut out, mesh)?;
    let file = out.into_inner().map_err(|err| err.into_error())?;
    if durable {
        file.sync_all()?;
    }
    Ok(())
}
