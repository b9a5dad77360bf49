//! The combine pipeline: per-file jobs and the dispatcher that runs them.

pub mod config;
pub mod dispatch;
pub mod job;
pub mod paths;
pub mod report;

pub use config::{CombineOptions, RemovalPolicy};
pub use dispatch::Dispatcher;
pub use job::{run_job, run_job_with};
pub use paths::{COMBINED_PREFIX, normalize_path, output_path};
pub use report::{BatchReport, BatchSummary, JobError, JobOutcome, JobReport, Stage};
