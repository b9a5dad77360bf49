//! Options shared by every job of a batch.

use crate::io::DataEncoding;
use crate::pipeline::paths::normalize_path;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

/// When source files are deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Never delete anything.
    #[default]
    Keep,
    /// Delete each partition right after it was folded, and the index file
    /// after the combined grid was written.
    AfterFold,
    /// Delete all partitions and then the index file, only once the
    /// combined grid was written.
    AfterWrite,
}

impl RemovalPolicy {
    pub fn removes_inputs(self) -> bool {
        !matches!(self, RemovalPolicy::Keep)
    }
}

#[derive(Clone, Debug)]
pub struct CombineOptions {
    output_dir: PathBuf,
    pub removal: RemovalPolicy,
    /// Pool size override; `None` uses the host parallelism.
    pub workers: Option<usize>,
    pub encoding: DataEncoding,
    /// Fsync the combined file before it replaces the target.
    pub durable: bool,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            removal: RemovalPolicy::Keep,
            workers: None,
            encoding: DataEncoding::Ascii,
            durable: true,
        }
    }
}

impl CombineOptions {
    /// Options writing into `output_dir`, normalized lexically.
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: normalize_path(output_dir.as_ref()),
            ..Self::default()
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn with_removal(mut self, removal: RemovalPolicy) -> Self {
        self.removal = removal;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_encoding(mut self, encoding: DataEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    /// Number of workers the batch runs with, at least one.
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_is_normalized() {
        let opts = CombineOptions::new("out/./x/../y//");
        assert_eq!(opts.output_dir(), Path::new("out/y"));
    }

    #[test]
    fn zero_workers_falls_back_to_host_parallelism() {
        let opts = CombineOptions::new("out").with_workers(0);
        assert!(opts.worker_count() >= 1);
        assert_eq!(CombineOptions::new("out").with_workers(3).worker_count(), 3);
    }
}
