mod locate;
mod output;
mod parser;
mod pdf;
mod profile;
mod validation;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::pdf::PageSource;

#[derive(Parser)]
#[command(name = "tocparse", about = "Technical-spec PDF TOC extraction and reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a specification PDF into JSONL records + a validation report
    Parse {
        /// Path to the specification PDF
        pdf_path: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
        /// Document title recorded on every record (default: file stem)
        #[arg(short = 't', long)]
        doc_title: Option<String>,
        /// Document profile key (see `profiles`)
        #[arg(short = 'd', long, default_value = "usb_pd")]
        doc_type: String,
        /// Number of pages scanned for the TOC (default: per profile)
        #[arg(short = 'p', long)]
        toc_pages: Option<usize>,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Score a PDF's leading pages for TOC likelihood
    FindToc {
        /// Path to the specification PDF
        pdf_path: PathBuf,
        /// Max pages to scan
        #[arg(short = 'n', long, default_value = "1500")]
        max_pages: usize,
        /// Document profile key (for the file-size ceiling)
        #[arg(short = 'd', long, default_value = "usb_pd")]
        doc_type: String,
    },
    /// Re-run reconciliation over existing JSONL outputs
    Report {
        /// Directory holding a previous run's JSONL files
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
        /// Document profile key used for the original run
        #[arg(short = 'd', long, default_value = "usb_pd")]
        doc_type: String,
    },
    /// List registered document profiles
    Profiles,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if matches!(cli.command, Commands::Parse { verbose: true, .. }) {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let t0 = Instant::now();

    let result = match cli.command {
        Commands::Parse {
            pdf_path,
            output,
            doc_title,
            doc_type,
            toc_pages,
            verbose: _,
        } => cmd_parse(pdf_path, output, doc_title, &doc_type, toc_pages),
        Commands::FindToc { pdf_path, max_pages, doc_type } => {
            cmd_find_toc(pdf_path, max_pages, &doc_type)
        }
        Commands::Report { output, doc_type } => cmd_report(output, &doc_type),
        Commands::Profiles => {
            for (key, description) in profile::PROFILE_KEYS {
                println!("{:<10} {}", key, description);
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

fn cmd_parse(
    pdf_path: PathBuf,
    output: PathBuf,
    doc_title: Option<String>,
    doc_type: &str,
    toc_pages: Option<usize>,
) -> anyhow::Result<()> {
    let profile = profile::profile_for(doc_type);
    let doc_title = doc_title.unwrap_or_else(|| {
        pdf_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled Specification".to_string())
    });

    println!("Parsing {} (profile: {})", pdf_path.display(), profile.doc_type);
    let source = pdf::LopdfSource::open(&pdf_path, profile.max_file_size_mb)?;
    println!("Loaded {} pages", source.page_count());

    let opts = parser::ParseOptions { doc_title, toc_scan_pages: toc_pages };
    let outcome = parser::run(&source, &profile, &opts);

    let rec = validation::reconcile(&outcome.toc, &outcome.sections);
    let stats = validation::summarize(&outcome.toc, &outcome.sections);
    let rows = validation::build_report_rows(&outcome.toc, &outcome.sections);

    // Outputs land only after reconciliation has completed.
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;
    let paths = output::OutputPaths::new(&output, profile.doc_type);
    let toc_written = output::write_jsonl(&outcome.toc, &paths.toc)?;
    let sections_written = output::write_jsonl(&outcome.sections, &paths.sections)?;
    output::write_jsonl(std::slice::from_ref(&outcome.metadata), &paths.metadata)?;
    output::write_validation_report(&rows, &paths.report)?;
    output::write_summary(&rec, &stats, &outcome.anomalies, &paths.summary)?;

    println!("Wrote {} TOC entries to {}", toc_written, paths.toc.display());
    println!("Wrote {} sections to {}", sections_written, paths.sections.display());
    println!("Metadata: {}", paths.metadata.display());
    println!("Report:   {} / {}", paths.report.display(), paths.summary.display());

    validation::print_summary(&rec, &stats, &outcome.anomalies);
    Ok(())
}

fn cmd_find_toc(pdf_path: PathBuf, max_pages: usize, doc_type: &str) -> anyhow::Result<()> {
    let profile = profile::profile_for(doc_type);
    let source = pdf::LopdfSource::open(&pdf_path, profile.max_file_size_mb)?;
    println!(
        "Scanning {} ({} pages, limit {})",
        pdf_path.display(),
        source.page_count(),
        max_pages
    );

    let scores = locate::score_pages(&source, max_pages);
    for score in &scores {
        println!(
            "page {:>4}: score {:>5.1}  (indicators {:.0}, structure {:.1})",
            score.page,
            score.total(),
            score.toc_score,
            score.chapter_score
        );
    }

    let high: Vec<u32> = scores.iter().filter(|s| s.is_high()).map(|s| s.page).collect();
    let medium = scores.iter().filter(|s| s.is_medium()).count();
    if !high.is_empty() {
        let pages: Vec<String> = high.iter().map(u32::to_string).collect();
        println!("\n{} high-probability TOC pages: {}", high.len(), pages.join(", "));
    }
    if medium > 0 {
        println!("{} more pages show some section structure", medium);
    }

    match locate::best_candidate(&scores) {
        Some(best) => println!("\nRecommended: parse with --toc-pages {}", best.page),
        None => println!("\nNo obvious TOC found; try a deeper scan with --max-pages"),
    }
    Ok(())
}

fn cmd_report(output: PathBuf, doc_type: &str) -> anyhow::Result<()> {
    let paths = output::OutputPaths::new(&output, doc_type);
    let toc = output::read_headings(&paths.toc)?;
    let sections = output::read_sections(&paths.sections)?;

    let rec = validation::reconcile(&toc, &sections);
    let stats = validation::summarize(&toc, &sections);
    let rows = validation::build_report_rows(&toc, &sections);
    output::write_validation_report(&rows, &paths.report)?;
    output::write_summary(&rec, &stats, &[], &paths.summary)?;

    println!(
        "Regenerated {} and {}",
        paths.report.display(),
        paths.summary.display()
    );
    validation::print_summary(&rec, &stats, &[]);
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
