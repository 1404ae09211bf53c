//! `ironsieve` command line.
//!
//! ```text
//! ironsieve members.csv -o sanitized --workers 8 --compression gzip
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use ironsieve::{Compression, CsvDirSink, Pipeline, PipelineConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Validate member records and split them into Male, Female and Invalid tables.
#[derive(Parser, Debug)]
#[command(name = "ironsieve")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Delimited input file (gzip/zstd input is detected automatically)
    input: PathBuf,

    /// Directory receiving one file per partition
    #[arg(short, long, default_value = "sanitized")]
    output_dir: PathBuf,

    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Records per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Maximum rows per partition
    #[arg(long)]
    capacity: Option<usize>,

    /// Seconds to wait for all batch results
    #[arg(long)]
    timeout_secs: Option<f64>,

    /// Input field delimiter
    #[arg(long)]
    delimiter: Option<char>,

    /// Output compression: none, gzip or zstd
    #[arg(long, default_value = "none")]
    compression: Compression,

    /// Also write run metrics as JSON to this file
    #[arg(long)]
    metrics_json: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(n) = self.workers {
            config.worker_count = n;
        }
        if let Some(n) = self.capacity {
            config.partition_capacity = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.shutdown_timeout =
                Duration::try_from_secs_f64(secs).context("--timeout-secs must be a non-negative number")?;
        }
        if let Some(c) = self.delimiter {
            config.delimiter = c;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.pipeline_config()?;
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let mut sink = CsvDirSink::new(&cli.output_dir, cli.compression)
        .with_delimiter(pipeline.config().delimiter_byte());

    info!(input = %cli.input.display(), "cleaning records, sit tight");
    let output = pipeline.run_file(&cli.input, &mut sink)?;

    output.metrics.print();
    if let Some(path) = &cli.metrics_json {
        output
            .metrics
            .save_to_file(path)
            .with_context(|| format!("write metrics to {}", path.display()))?;
    }
    for (kind, path, rows) in sink.written() {
        println!("{kind}: {rows} rows -> {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        return Err(err);
    }
    info!("processing completed successfully");
    Ok(())
}
