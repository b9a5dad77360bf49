//! Bounded fan-out of jobs over an owned worker pool.

use crate::mesh_error::MeshCombineError;
use crate::pipeline::config::CombineOptions;
use crate::pipeline::job::run_job;
use crate::pipeline::report::{BatchReport, JobError, JobOutcome, JobReport};
use log::{error, info};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Runs one job per index file on a fixed number of worker threads.
///
/// The pool is owned by the dispatcher and shuts down when it is dropped.
pub struct Dispatcher {
    pool: ThreadPool,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "non-string panic payload".to_string(),
        },
    }
}

impl Dispatcher {
    /// Build a pool of `workers` threads (at least one).
    pub fn new(workers: usize) -> Result<Self, MeshCombineError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("mesh-combine-{i}"))
            .build()
            .map_err(|e| MeshCombineError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Pool sized by [`CombineOptions::worker_count`].
    pub fn for_options(options: &CombineOptions) -> Result<Self, MeshCombineError> {
        Self::new(options.worker_count())
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run [`run_job`] for every file and collect the outcomes.
    pub fn run<P: AsRef<Path> + Sync>(&self, files: &[P], options: &CombineOptions) -> BatchReport {
        let report = self.run_with(files, |index| run_job(index, options));
        for err in report.failed() {
            error!("{err}");
        }
        info!(
            "{} succeeded, {} failed",
            report.succeeded().count(),
            report.failed().count()
        );
        report
    }

    /// Run `job` for every file with the same scheduling as [`Self::run`].
    ///
    /// Jobs start in submission order; outcomes are returned in submission
    /// order whatever order they complete in. A panicking job becomes a
    /// failed outcome.
    pub fn run_with<P, F>(&self, files: &[P], job: F) -> BatchReport
    where
        P: AsRef<Path> + Sync,
        F: Fn(&Path) -> Result<JobReport, JobError> + Sync,
    {
        let slots: Vec<Mutex<Option<JobOutcome>>> =
            files.iter().map(|_| Mutex::new(None)).collect();
        let job = &job;
        self.pool.scope_fifo(|scope| {
            for (file, slot) in files.iter().zip(&slots) {
                let index = file.as_ref();
                scope.spawn_fifo(move |_| {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| job(index)))
                        .unwrap_or_else(|payload| {
                            Err(JobError::new(
                                index,
                                MeshCombineError::Panicked(panic_message(payload)),
                            ))
                        });
                    *slot.lock() = Some(JobOutcome {
                        index: index.to_path_buf(),
                        result,
                    });
                });
            }
        });

        let outcomes = slots
            .into_iter()
            .zip(files)
            .map(|(slot, file)| {
                slot.into_inner().unwrap_or_else(|| {
                    let index: PathBuf = file.as_ref().to_path_buf();
                    JobOutcome {
                        result: Err(JobError::new(
                            index.clone(),
                            MeshCombineError::Panicked("job produced no outcome".into()),
                        )),
                        index,
                    }
                })
            })
            .collect();
        BatchReport { outcomes }
    }
}
