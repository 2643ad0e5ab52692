//! Offline CLI commands
//!
//! `data export/import` talk to the database directly through the same
//! storage code the admin API uses.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;

use crate::cli::{ConfigCommands, DataCommands};
use crate::config::StaticConfig;
use crate::storage::{DataExport, ImportMode, ImportSummary, SeaOrmStorage, StorageFactory};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    pub fn format_colored(&self) -> String {
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

pub fn run_config_command(action: ConfigCommands) -> Result<(), CliError> {
    match action {
        ConfigCommands::Generate { output_path, force } => generate_config(output_path, force),
    }
}

pub async fn run_data_command(action: DataCommands) -> Result<(), CliError> {
    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    match action {
        DataCommands::Export { file_path } => export_data(storage, &file_path).await,
        DataCommands::Import {
            file_path,
            overwrite,
        } => {
            let mode = if overwrite {
                ImportMode::Overwrite
            } else {
                ImportMode::Skip
            };
            import_data(storage, &file_path, mode).await
        }
    }
}

/// Print the sample configuration or write it to `output_path`
fn generate_config(output_path: Option<String>, force: bool) -> Result<(), CliError> {
    let Some(path) = output_path else {
        println!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    };

    if Path::new(&path).exists() && !force {
        return Err(CliError::CommandError(format!(
            "{} already exists, use --force to overwrite",
            path
        )));
    }

    println!(
        "{} {}",
        "Generating configuration file...".yellow(),
        path.blue()
    );
    StaticConfig::default().save_to_file(&path).map_err(|e| {
        CliError::CommandError(format!("Unable to write configuration file: {}", e))
    })?;
    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    Ok(())
}

async fn export_data(storage: Arc<SeaOrmStorage>, file_path: &str) -> Result<(), CliError> {
    let doc = storage
        .export_data()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    let file = File::create(file_path).map_err(|e| {
        CliError::CommandError(format!(
            "Failed to create export file '{}': {}",
            file_path, e
        ))
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), &doc)
        .map_err(|e| CliError::CommandError(format!("Failed to write export: {}", e)))?;

    println!(
        "{} Exported {} users, {} submissions, {} subscriptions, {} notifications, {} clap totals, {} settings to: {}",
        "✓".bold().green(),
        doc.users.len(),
        doc.submissions.len(),
        doc.push_subscriptions.len(),
        doc.notification_history.len(),
        doc.content_claps.len(),
        doc.site_settings.len(),
        file_path.cyan()
    );
    Ok(())
}

async fn import_data(
    storage: Arc<SeaOrmStorage>,
    file_path: &str,
    mode: ImportMode,
) -> Result<(), CliError> {
    if !Path::new(file_path).exists() {
        return Err(CliError::CommandError(format!(
            "Import file not found: {}",
            file_path
        )));
    }

    let file = File::open(file_path).map_err(|e| {
        CliError::CommandError(format!("Failed to open import file '{}': {}", file_path, e))
    })?;
    let doc: DataExport = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| CliError::CommandError(format!("Failed to parse JSON file: {}", e)))?;

    let summary = storage
        .import_data(&doc, mode)
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    print_summary(&summary, mode);
    Ok(())
}

fn print_summary(summary: &ImportSummary, mode: ImportMode) {
    println!("{} Import finished (mode: {})", "✓".bold().green(), mode);
    let rows = [
        ("users", summary.users),
        ("submissions", summary.submissions),
        ("push_subscriptions", summary.push_subscriptions),
        ("notification_history", summary.notification_history),
        ("content_claps", summary.content_claps),
        ("site_settings", summary.site_settings),
    ];
    for (table, count) in rows {
        println!(
            "  {:<22} inserted: {}, updated: {}, skipped: {}",
            table,
            count.inserted.to_string().green(),
            count.updated.to_string().yellow(),
            count.skipped
        );
    }
}
