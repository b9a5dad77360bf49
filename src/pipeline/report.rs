//! Per-job and per-batch outcomes.

use crate::mesh_error::{ErrorKind, MeshCombineError};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What a successful job produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub index: PathBuf,
    pub output: PathBuf,
    /// Number of partitions folded.
    pub partitions: usize,
    pub points: usize,
    pub cells: usize,
    /// Source files that were deleted.
    pub removed: Vec<PathBuf>,
    /// Non-fatal problems, such as sources that could not be deleted.
    pub warnings: Vec<String>,
}

/// Pipeline step a job failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Read,
    Fold,
    Write,
    Cleanup,
    Dispatch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Parse => "parse",
            Stage::Read => "read",
            Stage::Fold => "fold",
            Stage::Write => "write",
            Stage::Cleanup => "cleanup",
            Stage::Dispatch => "dispatch",
        })
    }
}

/// A failed job: the index file it was for and the error that stopped it.
#[derive(Debug)]
pub struct JobError {
    pub index: PathBuf,
    pub error: MeshCombineError,
}

impl JobError {
    pub fn new(index: impl Into<PathBuf>, error: MeshCombineError) -> Self {
        Self {
            index: index.into(),
            error,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn stage(&self) -> Stage {
        match self.error.kind() {
            ErrorKind::Parse => Stage::Parse,
            ErrorKind::Read => Stage::Read,
            ErrorKind::SchemaMismatch => Stage::Fold,
            ErrorKind::Write => Stage::Write,
            ErrorKind::Delete => Stage::Cleanup,
            ErrorKind::Pool | ErrorKind::Internal => Stage::Dispatch,
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} failed: {}",
            self.index.display(),
            self.stage(),
            self.error
        )
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Result of one submitted index file.
#[derive(Debug)]
pub struct JobOutcome {
    pub index: PathBuf,
    pub result: Result<JobReport, JobError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// All outcomes of a batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &JobReport> + '_ {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobError> + '_ {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::is_success)
    }

    pub fn summary(&self) -> BatchSummary {
        let jobs = self
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(report) => JobSummary::Succeeded(report.clone()),
                Err(err) => JobSummary::Failed {
                    index: err.index.clone(),
                    kind: err.kind(),
                    stage: err.stage(),
                    message: err.error.to_string(),
                },
            })
            .collect();
        BatchSummary {
            succeeded: self.succeeded().count(),
            failed: self.failed().count(),
            jobs,
        }
    }
}

/// Serializable view of a [`BatchReport`].
#[derive(Clone, Debug, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub jobs: Vec<JobSummary>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobSummary {
    Succeeded(JobReport),
    Failed {
        index: PathBuf,
        kind: ErrorKind,
        stage: Stage,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn job_error_names_file_and_stage() {
        let err = JobError::new(
            "runs/A.pvtu",
            MeshCombineError::PartitionRead {
                path: PathBuf::from("runs/A_1.vtu"),
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            },
        );
        assert_eq!(err.stage(), Stage::Read);
        assert_eq!(err.kind(), ErrorKind::Read);
        let text = err.to_string();
        assert!(text.starts_with("runs/A.pvtu: read failed:"), "{text}");
        assert!(text.contains("A_1.vtu"), "{text}");
    }

    #[test]
    fn summary_counts_and_serializes() {
        let batch = BatchReport {
            outcomes: vec![
                JobOutcome {
                    index: PathBuf::from("a.pvtu"),
                    result: Ok(JobReport {
                        index: PathBuf::from("a.pvtu"),
                        output: PathBuf::from("out/combined_a.vtu"),
                        ..Default::default()
                    }),
                },
                JobOutcome {
                    index: PathBuf::from("b.pvtu"),
                    result: Err(JobError::new(
                        "b.pvtu",
                        MeshCombineError::MalformedReference {
                            path: PathBuf::from("b.pvtu"),
                            line: 3,
                        },
                    )),
                },
            ],
        };
        assert!(!batch.is_success());
        let summary = batch.summary();
        assert_eq!((summary.succeeded, summary.failed), (1, 1));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["jobs"][0]["status"], "succeeded");
        assert_eq!(json["jobs"][1]["kind"], "Parse");
        assert_eq!(json["jobs"][1]["stage"], "parse");
    }
}
