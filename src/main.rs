mod archive;
mod error;
mod group;
mod names;
mod output;
mod pdf;
mod pipeline;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use pdf::SourcePdf;
use settings::Settings;

#[derive(Parser)]
#[command(name = "certsplit", about = "Split certificate PDFs into one file per recipient")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a PDF into one named file per page
    Split {
        /// Source PDF
        input: PathBuf,
        /// Output directory (default: settings `output_dir`)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also copy pages into one folder per person
        #[arg(long)]
        organize: bool,
        /// Pack the results into a ZIP archive in the output directory
        #[arg(long)]
        zip: bool,
        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show the name found on every page without writing files
    Names {
        /// Source PDF
        input: PathBuf,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Group an existing directory of split pages into per-person folders
    Group {
        /// Directory holding `NNN Last, First.pdf` files
        pages_dir: PathBuf,
        /// Destination for the folders (default: <pages_dir>/../organized)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the filename form of one or more names
    Format {
        names: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = settings::load()?;
    info!(settings = ?settings, "settings loaded");

    let result = match cli.command {
        Commands::Split {
            input,
            output,
            organize,
            zip,
            quiet,
        } => {
            let out_dir = output.unwrap_or_else(|| settings.output_dir.clone());
            split(
                &input,
                &out_dir,
                organize || settings.organize,
                zip || settings.zip,
                quiet,
                &settings,
            )
        }
        Commands::Names { input, json } => list_names(&input, json, &settings),
        Commands::Group { pages_dir, output } => {
            let organized = output.unwrap_or_else(|| {
                pages_dir
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join("organized")
            });
            let summary = group::organize(&pages_dir, &organized)?;
            println!(
                "Organized {} files into {} folders under {}.",
                summary.files.len(),
                summary.folders,
                organized.display()
            );
            for (file, err) in &summary.failures {
                println!("  {}: {}", file, err);
            }
            Ok(())
        }
        Commands::Format { names: raw } => {
            for name in &raw {
                println!("{}", names::format::format_name(Some(name.as_str())));
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn split(
    input: &Path,
    out_dir: &Path,
    organize: bool,
    zip: bool,
    quiet: bool,
    settings: &Settings,
) -> Result<()> {
    let source = SourcePdf::open(input)
        .with_context(|| format!("cannot process {}", input.display()))?;
    println!("Processing PDF with {} pages...", source.page_count());

    let pb = progress_bar(source.page_count(), quiet)?;
    let pages_dir = out_dir.join("pages");
    let report = pipeline::run(&source, &pages_dir, settings.chunk_size, &pb)?;
    pb.finish_and_clear();
    report.print();

    let (root, files) = if organize {
        let organized = out_dir.join("organized");
        let summary =
            group::organize_files(&pages_dir, &report.written_names(), &organized)?;
        println!("Organized files into {} folders.", summary.folders);
        for (file, err) in &summary.failures {
            println!("  {}: {}", file, err);
        }
        (organized, summary.files)
    } else {
        (pages_dir, report.written)
    };

    if zip {
        if files.is_empty() {
            println!("Nothing to archive.");
        } else {
            let bytes = archive::pack_files(&root, &files)?;
            let path = output::write_atomic(out_dir, &settings.zip_name, &bytes)?;
            println!("Archive: {} ({} files)", path.display(), files.len());
        }
    }
    Ok(())
}

fn list_names(input: &Path, json: bool, settings: &Settings) -> Result<()> {
    let source = SourcePdf::open(input)
        .with_context(|| format!("cannot process {}", input.display()))?;
    let mut report = pipeline::BatchReport::default();
    let texts = pipeline::read_texts(&source, &mut report);
    let records = pipeline::resolve_all(&texts, settings.chunk_size);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "{:>4} | {:<12} | {:<32} | {}",
        "Page", "Strategy", "Candidate", "Filename"
    );
    println!("{}", "-".repeat(90));
    for r in &records {
        let strategy = r.resolved.strategy.map(|s| s.label()).unwrap_or("-");
        let candidate = r.resolved.candidate.as_deref().unwrap_or("-");
        println!(
            "{:>4} | {:<12} | {:<32} | {}",
            r.page,
            strategy,
            truncate(candidate, 32),
            r.filename
        );
    }
    let found = records.iter().filter(|r| r.resolved.found).count();
    println!("\n{} of {} pages named.", found, records.len());
    Ok(())
}

fn progress_bar(len: usize, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
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
