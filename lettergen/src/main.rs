//! lettergen - bulk customer letter generator
//!
//! A CLI tool that turns a CSV or Excel table of customer records into
//! personalized .docx letters packaged in a single zip archive.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]

mod cli;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use lettergen::archive::{archive_file_name, save_archive};
use lettergen::config::{LetterConfig, CONFIG_FILE_NAME, DEFAULT_CONFIG_TOML};
use lettergen::discovery::discover_placeholders;
use lettergen::docx::DocxTemplate;
use lettergen::flat_template::FlatTemplate;
use lettergen::mapping::format_amount;
use lettergen::records::{FieldRole, RecordSet, RowRange, StatusClass};
use lettergen::{generate, LetterTemplate};
use std::path::{Path, PathBuf};

/// Main entry point for the lettergen CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path, force } => {
            init_logging(false);
            handle_init_command(path, force)?;
        }

        Commands::Generate {
            data,
            config,
            template,
            start,
            end,
            date,
            company,
            sender,
            sender_title,
            currency_symbol,
            output,
            verbose,
        } => {
            init_logging(verbose);
            let overrides = Overrides {
                template,
                company,
                sender,
                sender_title,
                currency_symbol,
            };
            handle_generate_command(data, config, overrides, start, end, date, output)?;
        }

        Commands::Placeholders { template } => {
            init_logging(false);
            handle_placeholders_command(&template)?;
        }

        Commands::Inspect { data, rows } => {
            init_logging(false);
            handle_inspect_command(&data, rows)?;
        }
    }

    Ok(())
}

/// Initialize env_logger; `RUST_LOG` takes precedence over the default level
fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Configuration values given on the command line
struct Overrides {
    template: Option<PathBuf>,
    company: Option<String>,
    sender: Option<String>,
    sender_title: Option<String>,
    currency_symbol: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut LetterConfig) {
        if let Some(template) = self.template {
            config.letter.template = Some(template);
        }
        if let Some(company) = self.company {
            config.company.name = company;
        }
        if let Some(sender) = self.sender {
            config.sender.name = sender;
        }
        if let Some(title) = self.sender_title {
            config.sender.title = title;
        }
        if let Some(symbol) = self.currency_symbol {
            config.letter.currency_symbol = symbol;
        }
    }
}

/// Handle the init command
fn handle_init_command(path: Option<PathBuf>, force: bool) -> Result<()> {
    let target = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if target.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it",
            target.display()
        );
    }
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(&target, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to write file {}", target.display()))?;

    println!("✓ Created {}", target.display());
    println!("\nNext steps:");
    println!("  1. Edit {} with your company and sender details", target.display());
    println!("  2. Optionally point [letter] template at a .docx with {{PLACEHOLDER}} tokens");
    println!("  3. Run 'lettergen generate --data customers.xlsx' to create the letters");

    Ok(())
}

/// Load the configuration file, falling back to defaults when none exists
fn load_config(path: Option<&Path>) -> Result<LetterConfig> {
    match path {
        Some(path) => LetterConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None if Path::new(CONFIG_FILE_NAME).exists() => LetterConfig::load(CONFIG_FILE_NAME)
            .with_context(|| format!("Failed to load configuration from {}", CONFIG_FILE_NAME)),
        None => {
            log::info!("No {} found, using defaults", CONFIG_FILE_NAME);
            Ok(LetterConfig::default())
        }
    }
}

/// Handle the generate command
fn handle_generate_command(
    data: PathBuf,
    config_path: Option<PathBuf>,
    overrides: Overrides,
    start: Option<usize>,
    end: Option<usize>,
    date: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    overrides.apply(&mut config);
    let settings = config
        .resolve(date.as_deref(), Local::now().date_naive())
        .context("Failed to resolve letter settings")?;

    println!("Generating letters...");
    println!("Data: {}", data.display());

    let records = RecordSet::from_path(&data)
        .with_context(|| format!("Failed to read records from {}", data.display()))?;
    let range = RowRange::resolve(start, end, records.len())
        .with_context(|| format!("Invalid row selection for {}", data.display()))?;
    println!(
        "✓ Loaded {} records, generating rows {}-{}",
        records.len(),
        range.start(),
        range.end()
    );

    let template = match &config.letter.template {
        Some(path) => {
            let docx = DocxTemplate::open(path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            println!("Template: {}", path.display());
            LetterTemplate::Structured(docx)
        }
        None => {
            println!("Template: built-in flat-text letter");
            LetterTemplate::Flat(FlatTemplate::from(&config.flat))
        }
    };

    let mut progress = |current: usize, total: usize, name: &str| {
        println!("  Generating letter {} of {}... {}", current, total, name);
    };
    let batch = generate(&records, &template, &settings, range, &mut progress)
        .context("Letter generation failed")?;

    if let Some(placeholders) = &batch.placeholders {
        if placeholders.is_empty() {
            println!("⚠ No placeholders found in template; letters are plain copies");
        } else {
            println!("✓ Found {} placeholders in template", placeholders.len());
        }
        println!(
            "✓ Substituted placeholders in {} paragraphs",
            batch.modified_units()
        );
    }

    let output = output.unwrap_or_else(|| PathBuf::from(archive_file_name(&Local::now())));
    save_archive(&output, &batch.documents)
        .with_context(|| format!("Failed to write archive {}", output.display()))?;

    println!("✓ Generated {} letters", batch.len());
    println!("✓ Successfully wrote: {}", output.display());

    Ok(())
}

/// Handle the placeholders command
fn handle_placeholders_command(path: &Path) -> Result<()> {
    let template = DocxTemplate::open(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;
    let placeholders = discover_placeholders(template.document());

    if placeholders.is_empty() {
        println!("⚠ No placeholders found in {}", path.display());
        println!("  Placeholders look like {{CUSTOMER NAME}} or {{Outstanding amount in Rs}}");
        return Ok(());
    }

    println!("Placeholders in {}:\n", path.display());
    for token in &placeholders {
        println!("  {}", token);
    }
    println!("\n✓ Found {} placeholders", placeholders.len());

    Ok(())
}

/// Handle the inspect command
fn handle_inspect_command(path: &Path, preview_rows: usize) -> Result<()> {
    let records = RecordSet::from_path(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    let schema = records.schema();

    println!("Records: {}", records.len());
    println!("\nColumns:");
    for column in schema.columns() {
        println!("  {}", column);
    }

    println!("\nRecognised columns:");
    for role in FieldRole::ALL {
        match schema.column_for(role) {
            Some(column) => println!("  {:<20} {}", role.canonical_name(), column),
            None => println!("  {:<20} (missing)", role.canonical_name()),
        }
    }

    let inactive = records
        .records()
        .iter()
        .filter(|r| r.status_class() == StatusClass::Inactive)
        .count();
    println!(
        "\nStatus: {} active, {} inactive",
        records.len() - inactive,
        inactive
    );

    if preview_rows > 0 && !records.is_empty() {
        println!("\nPreview:");
        for record in records.records().iter().take(preview_rows) {
            println!(
                "  {:>4}  {:<30} {:<8} {}",
                record.row_number(),
                record.display_name(),
                record.status_class().label(),
                format_amount(record.role(FieldRole::OutstandingAmount))
            );
        }
    }

    Ok(())
}
