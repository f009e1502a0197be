use crate::checker::{trace_documents, TraceStatus};
use crate::cli::print_header;
use crate::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TraceArgs {
    /// Requirements document declaring `PREFIX-NUM:` requirement IDs
    pub requirements: PathBuf,

    /// Architecture document to trace against
    pub architecture: PathBuf,

    /// Implementation plan to trace against
    pub implementation: PathBuf,

    /// Write the matrix as JSON to this path
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Write the matrix as Markdown to this path
    #[arg(long)]
    pub markdown_out: Option<PathBuf>,
}

/// Returns whether every requirement is referenced somewhere downstream, so
/// the caller can set the exit code.
pub fn run(args: &TraceArgs) -> Result<bool> {
    let matrix = trace_documents(&args.requirements, &args.architecture, &args.implementation)?;

    if matrix.is_empty() {
        println!(
            "{}",
            "No requirement IDs found (expected the 'PREFIX-NUM:' form, e.g. 'FR-1: ...').".yellow()
        );
        return Ok(false);
    }

    print_header("Requirements Traceability");
    for row in &matrix.rows {
        let status = match row.status() {
            TraceStatus::Complete => "complete".green(),
            TraceStatus::Partial => "partial".yellow(),
            TraceStatus::Missing => "missing".red(),
        };
        let mark = |present: bool| if present { "yes" } else { "no" };
        println!(
            "{}: {status} (architecture: {}, implementation: {}) {}",
            row.id.bold(),
            mark(row.in_architecture),
            mark(row.in_implementation),
            row.description.bright_black()
        );
    }
    println!(
        "\nTotal: {} | Fully traced: {} | Coverage: {:.1}%",
        matrix.total(),
        matrix.fully_traced(),
        matrix.coverage_percent()
    );

    if let Some(path) = &args.json_out {
        let json = serde_json::to_string_pretty(&matrix)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("JSON matrix written to {}", path.display());
    }
    if let Some(path) = &args.markdown_out {
        std::fs::write(path, matrix.to_markdown())
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Markdown matrix written to {}", path.display());
    }

    Ok(matrix.nothing_missing())
}
