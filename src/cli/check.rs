use crate::checker::{check_document, DocumentKind};
use crate::cli::print_header;
use crate::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Which checker to run
    #[arg(value_enum)]
    pub kind: DocumentKind,

    /// Path to the document to check
    pub document: PathBuf,

    /// Requirements document to cross-reference (architecture and
    /// implementation checks only)
    #[arg(long)]
    pub requirements: Option<PathBuf>,

    /// Write the report as JSON to this path
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Write the report as Markdown to this path
    #[arg(long)]
    pub markdown_out: Option<PathBuf>,
}

/// Returns whether the document passed, so the caller can set the exit code.
pub fn run(args: &CheckArgs) -> Result<bool> {
    let report = check_document(args.kind, &args.document, args.requirements.as_deref())?;

    let verdict = if report.passed {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!(
        "{} check for {}: {verdict}",
        args.kind.as_str(),
        args.document.display()
    );

    if !report.issues.is_empty() {
        print_header("Issues");
        for issue in &report.issues {
            println!("{} {issue}", "✗".red());
        }
    }
    if !report.warnings.is_empty() {
        print_header("Suggestions");
        for warning in &report.warnings {
            println!("{} {warning}", "→".yellow());
        }
    }
    if !report.stats.is_empty() {
        print_header("Stats");
        for (key, value) in &report.stats {
            println!("{key}: {value}");
        }
    }

    if let Some(path) = &args.json_out {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("\nJSON report written to {}", path.display());
    }
    if let Some(path) = &args.markdown_out {
        std::fs::write(path, report.to_markdown())
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Markdown report written to {}", path.display());
    }

    Ok(report.passed)
}
