//! Tree Bench Charts - static comparison charts for balanced-tree benchmarks
//!
//! Reads the insertion and removal result files produced by the benchmark
//! driver and writes a linear and a log-scale PNG for each.

mod charts;
mod config;
mod data;
mod orchestrator;

use anyhow::{Context, Result};
use clap::Parser;
use config::{RunConfig, Variant};
use orchestrator::Orchestrator;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file overriding the built-in series, labels and figure size.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Which result files to chart.
    #[arg(long, value_enum)]
    variant: Option<Variant>,
    /// Directory holding the `resultados_*.csv` files.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Directory the PNG files are written to. Must exist.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// File name prefix of every image.
    #[arg(long)]
    prefix: Option<String>,
    /// Print the run report as JSON on stdout.
    #[arg(long)]
    report_json: bool,
}

impl Args {
    fn into_config(self) -> Result<(RunConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RunConfig::default(),
        };

        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(dir) = self.out_dir {
            config.out_dir = dir;
        }
        if let Some(prefix) = self.prefix {
            config.prefix = prefix;
        }
        config.validate().context("validating config")?;

        Ok((config, self.report_json))
    }
}

fn setup_logger() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn run() -> Result<bool> {
    let (config, report_json) = Args::parse().into_config()?;
    info!(variant = ?config.variant, data_dir = %config.data_dir.display(), "starting run");

    let report = Orchestrator::new(&config).run();

    if report_json {
        let json = serde_json::to_string_pretty(&report).context("serializing report")?;
        println!("{json}");
    }

    for failure in &report.failures {
        error!(chart = %failure.chart.display(), "{}", failure.message);
    }
    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        "run finished"
    );

    Ok(report.is_success())
}

fn main() -> ExitCode {
    setup_logger();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
