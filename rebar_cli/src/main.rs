//! # Rebar Draft CLI
//!
//! Draws reinforced-concrete beams to DXF and prints bending schedules.
//!
//! Input is either a `.rbp` project file or a JSON document holding one set
//! of beam parameters (or an array of them).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

mod commands;
mod input;
mod lock;

#[derive(Parser)]
#[command(name = "rebar")]
#[command(about = "Reinforced-concrete beam drafting tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw every element into one DXF drawing
    Draw {
        /// Project (.rbp) or beam parameters (.json)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Directory the drawing is written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Also print the bending schedule to PDF next to the drawing
        #[arg(long)]
        pdf: bool,

        /// Output format of the run summary
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the bending schedule without drawing
    Schedule {
        /// Project (.rbp) or beam parameters (.json)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Write the schedule as PDF to this path
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        pdf: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check parameters and stirrup patterns of every element
    Validate {
        /// Project (.rbp) or beam parameters (.json)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger with default level (overridden by RUST_LOG)
    let env = Env::default().default_filter_or("warn");
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Draw {
            file,
            out_dir,
            pdf,
            format,
        } => commands::draw::execute(&file, &out_dir, pdf, format),

        Commands::Schedule { file, pdf, format } => commands::schedule::execute(&file, pdf.as_deref(), format),

        Commands::Validate { file, format } => commands::validate::execute(&file, format),
    }
}
