use anyhow::{Context, Result};
use clap::Parser;
use mesh_combine::io::DataEncoding;
use mesh_combine::pipeline::{BatchReport, CombineOptions, Dispatcher, RemovalPolicy};
use std::path::PathBuf;
use std::process::ExitCode;

/// Combine partitioned VTK datasets into single files
///
/// Every index file (.pvtu) is combined with the partitions (.vtu) it
/// references into OUTPUT_DIR/combined_<name>.vtu. Files are processed in
/// parallel; one failing file does not stop the others.
///
/// EXAMPLES:
///
///   combine-pvtu out/ run/step_*.pvtu
///   combine-pvtu --remove -j 4 out/ run/step_0010.pvtu
#[derive(Parser, Debug)]
#[command(name = "combine-pvtu")]
#[command(version, about)]
struct Cli {
    /// Delete each partition once folded, and the index file once written
    #[arg(long, conflicts_with = "remove_after_write")]
    remove: bool,

    /// Delete partitions and index file only after the output is written
    #[arg(long)]
    remove_after_write: bool,

    /// Number of files processed at once [default: available cores]
    #[arg(short = 'j', long, value_name = "N")]
    jobs: Option<usize>,

    /// Write base64 binary arrays instead of ASCII
    #[arg(long)]
    binary: bool,

    /// Skip the fsync before an output replaces its target
    #[arg(long)]
    no_sync: bool,

    /// Print a JSON summary of every job on stdout
    #[arg(long)]
    json: bool,

    /// Directory the combined files are written to (created if missing)
    output_dir: PathBuf,

    /// Index files to combine, submitted in this order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Cli {
    fn options(&self) -> CombineOptions {
        let removal = if self.remove {
            RemovalPolicy::AfterFold
        } else if self.remove_after_write {
            RemovalPolicy::AfterWrite
        } else {
            RemovalPolicy::Keep
        };
        let encoding = if self.binary {
            DataEncoding::Binary
        } else {
            DataEncoding::Ascii
        };
        let mut options = CombineOptions::new(&self.output_dir)
            .with_removal(removal)
            .with_encoding(encoding)
            .with_durable(!self.no_sync);
        options.workers = self.jobs;
        options
    }
}

/// Process exit status for a finished batch: 0 when every job succeeded.
fn exit_status(report: &BatchReport) -> u8 {
    if report.is_success() { 0 } else { 1 }
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let options = cli.options();

    let dispatcher = Dispatcher::for_options(&options).context("failed to start worker pool")?;
    let report = dispatcher.run(&cli.files, &options);
    if cli.json {
        let summary = serde_json::to_string_pretty(&report.summary())
            .context("failed to serialize job summary")?;
        println!("{summary}");
    }

    Ok(ExitCode::from(exit_status(&report)))
}
