mod error;
mod model;
mod output;
mod parser;
mod settings;
mod source;
mod translate;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use error::PageError;
use model::{BatchReport, PageFailure, PatternRecord, Shape};
use settings::Settings;
use source::SourcePage;
use translate::TextNormalizer;

#[derive(Parser)]
#[command(name = "pattern_extract", about = "Convert downloaded knitting pattern pages to JSON records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every page in the input directory
    Convert {
        /// Directory of downloaded pattern pages
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory for per-page JSON files
        #[arg(long)]
        output: Option<PathBuf>,
        /// Aggregate JSON file (all records, filename order)
        #[arg(long)]
        aggregate: Option<PathBuf>,
        /// Batch report file
        #[arg(long)]
        report: Option<PathBuf>,
        /// Max pages to convert (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Worker threads (1 = sequential)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Keep notes text as-is instead of translating it
        #[arg(long)]
        no_translate: bool,
    },
    /// Convert a single page and print the record
    Inspect {
        file: PathBuf,
        #[arg(long)]
        no_translate: bool,
    },
    /// Shape and technique counts for an aggregate file
    Stats {
        /// Aggregate JSON file (default: configured aggregate path)
        aggregate: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            aggregate,
            report,
            limit,
            jobs,
            no_translate,
        } => {
            if let Some(v) = input {
                settings.input_dir = v;
            }
            if let Some(v) = output {
                settings.output_dir = v;
            }
            if let Some(v) = aggregate {
                settings.aggregate_path = v;
            }
            if let Some(v) = report {
                settings.report_path = v;
            }
            if let Some(v) = jobs {
                settings.jobs = v;
            }
            if no_translate {
                settings.translate = false;
            }

            let normalizer = TextNormalizer::from_settings(&settings, settings.translate)?;
            let pages = source::list_pages(&settings.input_dir, limit)?;
            if pages.is_empty() {
                println!("No pattern pages found in {}.", settings.input_dir.display());
            } else {
                println!("Found {} pattern pages to convert.", pages.len());
            }

            let report = convert_batch(&pages, &settings, &normalizer)?;
            println!(
                "Done: {} converted ({} ok, {} failed) -> {}",
                report.total,
                report.ok,
                report.failed,
                settings.aggregate_path.display()
            );
            for f in &report.failures {
                println!("  failed: {} ({})", f.file, f.error);
            }
        }
        Commands::Inspect { file, no_translate } => {
            let normalizer = TextNormalizer::from_settings(&settings, settings.translate && !no_translate)?;
            let html = source::read_page(&file)?;
            let record = parser::process_page(&html, &settings.base_url, &normalizer);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Stats { aggregate } => {
            let path = aggregate.unwrap_or_else(|| settings.aggregate_path.clone());
            print_stats(&path)?;
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

/// Convert every page, write the aggregate and the report, and return the report.
///
/// Pages run on a pool of `settings.jobs` threads. Results are gathered in
/// input order, so the aggregate stays sorted by file name.
fn convert_batch(
    pages: &[SourcePage],
    settings: &Settings,
    normalizer: &TextNormalizer,
) -> Result<BatchReport> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let started_at = chrono::Utc::now();
    output::ensure_directory(&settings.output_dir)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.jobs.max(1))
        .build()
        .context("Failed to build worker pool")?;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    info!("Converting {} pages with {} worker(s)", pages.len(), settings.jobs.max(1));
    let results: Vec<(&str, Result<PatternRecord, PageError>)> = pool.install(|| {
        pages
            .par_iter()
            .map(|page| {
                let result = convert_page(page, settings, normalizer);
                pb.inc(1);
                (page.file.as_str(), result)
            })
            .collect()
    });
    pb.finish_and_clear();

    let mut records = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    let mut shapes: BTreeMap<Shape, usize> = BTreeMap::new();
    for (file, result) in results {
        match result {
            Ok(record) => {
                *shapes.entry(record.shape).or_default() += 1;
                records.push(record);
            }
            Err(e) => {
                warn!("Page {} failed: {}", file, e);
                failures.push(PageFailure {
                    file: file.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    output::write_json_pretty(&settings.aggregate_path, &records)?;

    let report = BatchReport {
        started_at,
        finished_at: chrono::Utc::now(),
        total: pages.len(),
        ok: records.len(),
        failed: failures.len(),
        shapes,
        failures,
    };
    output::write_json_pretty(&settings.report_path, &report)?;
    info!("Converted {} pages ({} failed)", report.ok, report.failed);
    Ok(report)
}

fn convert_page(
    page: &SourcePage,
    settings: &Settings,
    normalizer: &TextNormalizer,
) -> Result<PatternRecord, PageError> {
    let html = source::read_page(&page.path)?;
    let record = parser::process_page(&html, &settings.base_url, normalizer);
    output::write_record(&settings.output_dir, &page.file, &record)?;
    Ok(record)
}

fn print_stats(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read aggregate: {}", path.display()))?;
    let records: Vec<PatternRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse aggregate: {}", path.display()))?;

    let mut shapes: BTreeMap<Shape, usize> = BTreeMap::new();
    let mut techniques: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &records {
        *shapes.entry(r.shape).or_default() += 1;
        for t in &r.techniques {
            *techniques.entry(t.phrase()).or_default() += 1;
        }
    }

    println!("Records: {}\n", records.len());
    println!("{:<22} | {:>5}", "Shape", "Count");
    println!("{}", "-".repeat(30));
    for (shape, n) in &shapes {
        println!("{:<22} | {:>5}", shape, n);
    }
    if !techniques.is_empty() {
        println!("\n{:<22} | {:>5}", "Technique", "Count");
        println!("{}", "-".repeat(30));
        for (t, n) in &techniques {
            println!("{:<22} | {:>5}", t, n);
        }
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
