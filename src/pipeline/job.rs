//! One index file in, one combined file out.

use crate::algs::append::Appender;
use crate::io::pvtu::IndexDocument;
use crate::io::vtu::{VtuReader, VtuWriter};
use crate::io::{MeshReader, MeshWriter, read_partition, write_mesh};
use crate::mesh_error::MeshCombineError;
use crate::pipeline::config::{CombineOptions, RemovalPolicy};
use crate::pipeline::paths::output_path;
use crate::pipeline::report::{JobError, JobReport};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Combine the partitions listed in `index` into one `.vtu` file.
///
/// Stages run strictly in order: scan the index, read and fold every
/// partition in reference order, write, then clean up according to
/// [`CombineOptions::removal`]. A failure before the write leaves every
/// source file that has not been folded yet in place and no output behind.
/// Failed deletions are reported as warnings and do not fail the job.
pub fn run_job(index: &Path, options: &CombineOptions) -> Result<JobReport, JobError> {
    let writer = VtuWriter::new(options.encoding);
    run_job_with(&VtuReader, &writer, index, options)
}

/// [`run_job`] with an explicit reader and writer.
pub fn run_job_with<R: MeshReader, W: MeshWriter>(
    reader: &R,
    writer: &W,
    index: &Path,
    options: &CombineOptions,
) -> Result<JobReport, JobError> {
    let fail = |error: MeshCombineError| JobError::new(index, error);

    let document = IndexDocument::read(index).map_err(fail)?;
    let output = output_path(options.output_dir(), index, writer.extension());
    info!("{} -> {}", index.display(), output.display());

    let mut report = JobReport {
        index: index.to_path_buf(),
        output: output.clone(),
        ..JobReport::default()
    };
    let pieces = document.resolved_pieces();
    let mut sources_removed = true;
    let mut appender = Appender::new();
    for piece in &pieces {
        let partition = read_partition(reader, piece).map_err(fail)?;
        let (points, cells) = (partition.num_points(), partition.num_cells());
        appender.fold(partition).map_err(|mismatch| {
            fail(MeshCombineError::SchemaMismatch {
                path: piece.clone(),
                detail: mismatch.to_string(),
            })
        })?;
        debug!(
            "folded {} ({points} points, {cells} cells)",
            piece.display()
        );
        if options.removal == RemovalPolicy::AfterFold {
            sources_removed &= remove_source(piece, &mut report);
        }
    }

    report.partitions = appender.folded();
    let combined = appender.finish();
    report.points = combined.num_points();
    report.cells = combined.num_cells();
    write_mesh(writer, &combined, &output, options.durable).map_err(fail)?;
    drop(combined);

    if options.removal == RemovalPolicy::AfterWrite {
        for piece in &pieces {
            sources_removed &= remove_source(piece, &mut report);
        }
    }
    if options.removal.removes_inputs() {
        if sources_removed {
            remove_source(index, &mut report);
        } else {
            let message = format!(
                "kept `{}` because some of its partitions could not be removed",
                index.display()
            );
            warn!("{message}");
            report.warnings.push(message);
        }
    }

    info!(
        "{}: {} partitions, {} points, {} cells",
        output.display(),
        report.partitions,
        report.points,
        report.cells
    );
    Ok(report)
}

/// Delete one source file, downgrading failure to a warning.
fn remove_source(path: &Path, report: &mut JobReport) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            report.removed.push(path.to_path_buf());
            true
        }
        Err(source) => {
            let err = MeshCombineError::Delete {
                path: path.to_path_buf(),
                source,
            };
            warn!("{err}");
            report.warnings.push(err.to_string());
            false
        }
    }
}
