#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the geodatabase coverage pipeline.

mod progress;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use gdb_coverage::config::{load_config, validate};
use gdb_coverage_engine::GeoEngine;
use gdb_coverage_models::{CleanupPolicy, CoverageConfig, RunSummary};

use crate::progress::{IndicatifProgress, init_logger};

#[derive(Parser)]
#[command(
    name = "gdb_coverage",
    about = "Build a GeoJSON coverage footprint from a zipped geodatabase"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, extract, transform and export a geodatabase (`.gdb`
    /// containers need a build with the `gdal` feature)
    Run(RunArgs),
    /// List the feature classes of an extracted container
    List {
        /// `.gdb` directory or directory of shapefiles
        container: PathBuf,
    },
    /// Print the default configuration as TOML
    DefaultConfig,
}

#[derive(Args)]
struct RunArgs {
    /// TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// URL of the zipped geodatabase
    #[arg(long)]
    url: Option<String>,
    /// Use a local archive instead of downloading
    #[arg(long)]
    archive: Option<PathBuf>,
    /// Working directory for the download, extraction and intermediates
    #[arg(long)]
    work_dir: Option<PathBuf>,
    /// Container name inside the archive (e.g. `places.gdb`)
    #[arg(long)]
    container: Option<String>,
    /// Output GeoJSON path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Buffer radius for point feature classes, in metres
    #[arg(long)]
    point_buffer: Option<f64>,
    /// Buffer radius for line feature classes, in metres
    #[arg(long)]
    line_buffer: Option<f64>,
    /// Write the intermediate layers of every transform
    #[arg(long)]
    keep_intermediates: bool,
    /// When to delete working files: never, `on_success` or always
    #[arg(long, value_parser = parse_cleanup)]
    cleanup: Option<CleanupPolicy>,
}

fn parse_cleanup(value: &str) -> Result<CleanupPolicy, String> {
    value
        .parse()
        .map_err(|_| format!("expected never, on_success or always, got `{value}`"))
}

impl RunArgs {
    fn into_config(self) -> Result<CoverageConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => CoverageConfig::default(),
        };

        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(archive) = self.archive {
            config.archive = Some(archive);
        }
        if let Some(work_dir) = self.work_dir {
            config.work_dir = work_dir;
        }
        if let Some(container) = self.container {
            config.container = Some(container);
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(metres) = self.point_buffer {
            config.point_buffer_m = metres;
        }
        if let Some(metres) = self.line_buffer {
            config.line_buffer_m = metres;
        }
        if self.keep_intermediates {
            config.keep_intermediates = true;
        }
        if let Some(cleanup) = self.cleanup {
            config.cleanup = cleanup;
        }

        validate(&config)?;
        Ok(config)
    }
}

fn print_summary(summary: &RunSummary, elapsed_secs: f64) {
    println!();
    println!(
        "{:<30} {:>10} {:>10} {:>10}",
        "FEATURE CLASS", "INPUT", "POLYGONS", "DROPPED"
    );
    println!("{}", "-".repeat(63));
    for class in &summary.classes {
        println!(
            "{:<30} {:>10} {:>10} {:>10}",
            class.name, class.input_features, class.appended, class.dropped
        );
    }
    for skipped in &summary.skipped {
        println!("{:<30} skipped: {}", skipped.name, skipped.reason);
    }
    println!("{}", "-".repeat(63));
    println!("Accumulated polygons: {}", summary.accumulated_polygons);
    println!("Output polygons:      {}", summary.polygon_count);
    println!("Total vertices:       {}", summary.total_vertices);
    if let Some(output) = &summary.output {
        println!("Written to:           {}", output.display());
    }
    println!("Finished in {elapsed_secs:.1}s");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let config = args.into_config()?;
            let progress = IndicatifProgress::feature_classes_bar(&multi);

            let start = Instant::now();
            let summary = gdb_coverage::run(&config, &GeoEngine, &progress).await?;

            print_summary(&summary, start.elapsed().as_secs_f64());
        }
        Commands::List { container } => {
            let classes = gdb_coverage::list_feature_classes(&container, false)?;
            println!("{:<40} {:<20} SPATIAL REFERENCE", "NAME", "KIND");
            println!("{}", "-".repeat(80));
            for class in &classes {
                println!(
                    "{:<40} {:<20} {}",
                    class.name,
                    class.kind.to_string(),
                    class.spatial_ref.name().unwrap_or("<unknown>")
                );
            }
        }
        Commands::DefaultConfig => {
            print!("{}", toml::to_string_pretty(&CoverageConfig::default())?);
        }
    }

    Ok(())
}
