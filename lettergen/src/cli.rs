//! Command-line interface definitions for lettergen

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the lettergen application
#[derive(Parser)]
#[command(name = "lettergen")]
#[command(version)]
#[command(about = "Bulk customer letter generator", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for lettergen
#[derive(Subcommand)]
pub enum Commands {
    /// Write a default lettergen.toml
    Init {
        /// Where to write the configuration (defaults to ./lettergen.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate one letter per customer record and zip them
    Generate {
        /// CSV or Excel (.xlsx/.xls) file with a header row
        #[arg(short, long, value_name = "TABLE")]
        data: PathBuf,

        /// Configuration file (defaults to ./lettergen.toml when present)
        #[arg(short, long, value_name = "TOML")]
        config: Option<PathBuf>,

        /// .docx template with {PLACEHOLDER} tokens; flat-text letters when absent
        #[arg(short, long, value_name = "DOCX")]
        template: Option<PathBuf>,

        /// First row to generate (1-based)
        #[arg(long)]
        start: Option<usize>,

        /// Last row to generate (1-based, inclusive)
        #[arg(long)]
        end: Option<usize>,

        /// Letter date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Company name printed on the letters
        #[arg(long)]
        company: Option<String>,

        /// Name of the person signing the letters
        #[arg(long)]
        sender: Option<String>,

        /// Title of the person signing the letters
        #[arg(long)]
        sender_title: Option<String>,

        /// Prefix for currency amounts
        #[arg(long)]
        currency_symbol: Option<String>,

        /// Output zip file (defaults to customer_letters_<timestamp>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the placeholders found in a .docx template
    Placeholders {
        /// The .docx template
        template: PathBuf,
    },

    /// Show the columns and first rows of a customer table
    Inspect {
        /// CSV or Excel (.xlsx/.xls) file with a header row
        data: PathBuf,

        /// Number of rows to preview
        #[arg(short, long, default_value_t = 5)]
        rows: usize,
    },
}
