#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-combine
//!
//! mesh-combine merges partitioned VTK unstructured-grid datasets into single,
//! self-contained files. A `.pvtu` index lists the `.vtu` pieces written by
//! the ranks of a parallel solver; each index is turned into one
//! `combined_<name>.vtu` holding every point, cell and attribute array of
//! its pieces.
//!
//! ## Features
//! - Line-oriented `<Piece Source="..."/>` scan of index files
//! - `.vtu` reader for ASCII, inline base64 and base64 appended data
//! - Schema-checked folding of partitions with connectivity re-indexing
//! - Atomic `.vtu` writer (temporary file, optional fsync, rename)
//! - Bounded parallel batch processing on an owned Rayon pool
//! - Optional removal of sources, never before the stage that consumes them succeeded
//!
//! ## Usage
//!
//! ```no_run
//! use mesh_combine::prelude::*;
//!
//! let options = CombineOptions::new("out").with_removal(RemovalPolicy::AfterWrite);
//! let dispatcher = Dispatcher::for_options(&options)?;
//! let report = dispatcher.run(&["run/step_0010.pvtu", "run/step_0020.pvtu"], &options);
//! for job in report.succeeded() {
//!     println!("{} -> {}", job.index.display(), job.output.display());
//! }
//! # Ok::<(), mesh_combine::mesh_error::MeshCombineError>(())
//! ```
//!
//! ## Determinism
//!
//! Partitions are folded in the order their index lists them and floats are
//! printed with their shortest round-trip form, so re-running a job on the
//! same inputs reproduces the output byte for byte.

pub mod algs;
pub mod data;
pub mod io;
pub mod mesh_error;
pub mod pipeline;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::append::{Appender, SchemaMismatch};
    pub use crate::data::array::{ArrayData, DataArray, ScalarType};
    pub use crate::data::grid::{CombinedMesh, MeshPartition, UnstructuredGrid};
    pub use crate::io::pvtu::IndexDocument;
    pub use crate::io::vtu::{VtuReader, VtuWriter};
    pub use crate::io::{DataEncoding, MeshReader, MeshWriter};
    pub use crate::mesh_error::{ErrorKind, MeshCombineError, VtuError};
    pub use crate::pipeline::{
        BatchReport, CombineOptions, Dispatcher, JobError, JobReport, RemovalPolicy, run_job,
    };
    pub use crate::topology::cell_type::CellType;
}
