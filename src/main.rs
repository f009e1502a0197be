use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use stagecraft::catalog::StageCatalog;
use stagecraft::error::PipelineError;
use stagecraft::github::GitError;
use stagecraft::Result;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stagecraft")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stage-gated delivery pipeline for spec-driven projects", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a pipeline in the current directory
    Init(stagecraft::cli::init::InitArgs),

    /// Show pipeline progress across all stages
    Status,

    /// Print the working prompt for a stage
    Prompt {
        /// Stage key (see 'status' for the ordered list)
        stage: String,
    },

    /// Save a stage artifact and mark the stage complete
    Capture {
        /// Stage key
        stage: String,

        /// Read the artifact from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Append to an existing artifact instead of replacing it
        #[arg(long)]
        append: bool,
    },

    /// Mark a stage complete (order and readiness gates apply)
    Complete {
        /// Stage key
        stage: String,

        /// Note to record alongside the completion
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Set a stage to pending or in_progress
    SetStatus {
        /// Stage key
        stage: String,

        /// New status (pending or in_progress)
        status: String,
    },

    /// Inspect or update a stage's readiness checklist
    #[command(subcommand)]
    Ready(stagecraft::cli::ready::ReadyCommand),

    /// Attach a free-form note to a stage
    Note {
        /// Stage key
        stage: String,

        /// Note text
        text: String,
    },

    /// Delete all pipeline state
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// GitHub sync configuration and feedback
    #[command(subcommand)]
    Github(stagecraft::cli::github::GithubCommand),

    /// Lint a stage artifact for structural problems
    Check(stagecraft::cli::check::CheckArgs),

    /// Trace requirement IDs through the downstream documents
    Trace(stagecraft::cli::trace::TraceArgs),

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {e}").red());
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(pipeline) = err.downcast_ref::<PipelineError>() {
        pipeline.exit_code()
    } else if err.downcast_ref::<GitError>().is_some() {
        6
    } else {
        1
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    let catalog = StageCatalog::standard();

    match cli.command {
        Commands::Init(args) => {
            stagecraft::cli::init::run(&catalog, &args)?;
        }

        Commands::Status => {
            stagecraft::cli::status::run(&catalog)?;
        }

        Commands::Prompt { stage } => {
            stagecraft::cli::prompt::run(&catalog, &stage)?;
        }

        Commands::Capture {
            stage,
            file,
            append,
        } => {
            stagecraft::cli::capture::run(&catalog, &stage, file.as_deref(), append).await?;
        }

        Commands::Complete { stage, note } => {
            stagecraft::cli::complete::run(&catalog, &stage, note.as_deref()).await?;
        }

        Commands::SetStatus { stage, status } => {
            stagecraft::cli::set_status::run(&catalog, &stage, &status)?;
        }

        Commands::Ready(cmd) => {
            stagecraft::cli::ready::run(&catalog, &cmd)?;
        }

        Commands::Note { stage, text } => {
            stagecraft::cli::note::run(&catalog, &stage, &text)?;
        }

        Commands::Reset { yes } => {
            stagecraft::cli::reset::run(yes)?;
        }

        Commands::Github(cmd) => {
            stagecraft::cli::github::run(&catalog, &cmd).await?;
        }

        Commands::Check(args) => {
            let passed = stagecraft::cli::check::run(&args)?;
            if !passed {
                std::process::exit(1);
            }
        }

        Commands::Trace(args) => {
            let traced = stagecraft::cli::trace::run(&args)?;
            if !traced {
                std::process::exit(1);
            }
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "stagecraft", &mut io::stdout());
        }
    }

    Ok(())
}
