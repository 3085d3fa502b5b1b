use crate::cli::{ConfigArgs, OutputFormat, ValidateArgs};
use crate::document::load_document;
use crate::utils::{init_logging, load_config};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use taskspec::{FieldError, Validator};
use tracing::{debug, error};

/// Outcome of validating one file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file: String,
    pub valid: bool,
    /// Set when the document was read but rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FieldError>,
    /// Set when the document could not be read or parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

pub fn validate_file(validator: &Validator, path: &Path) -> FileReport {
    let file = path.display().to_string();
    let task = match load_document(path) {
        Ok(task) => task,
        Err(e) => {
            error!(%file, "{e:#}");
            return FileReport {
                file,
                valid: false,
                error: None,
                load_error: Some(format!("{e:#}")),
            };
        }
    };
    debug!(%file, steps = task.spec.steps.len(), "loaded task document");

    let result = validator.validate_task(&task);
    FileReport {
        file,
        valid: result.is_ok(),
        error: result.err(),
        load_error: None,
    }
}

/// Returns whether every file passed
pub fn handle_validate_command(args: ValidateArgs) -> Result<bool> {
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let validator = Validator::builder().with_config(config).build();

    let reports: Vec<FileReport> = args
        .files
        .iter()
        .map(|path| validate_file(&validator, path))
        .collect();

    match args.format {
        OutputFormat::Text => print_text_reports(&reports),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    Ok(reports.iter().all(|r| r.valid))
}

fn print_text_reports(reports: &[FileReport]) {
    for report in reports {
        if report.valid {
            println!("{} {}", "✓".green(), report.file);
            continue;
        }
        println!("{} {}", "✗".red(), report.file.bold());
        if let Some(err) = &report.error {
            println!("    {} {}", format!("[{}]", err.kind).yellow(), err);
        }
        if let Some(load_error) = &report.load_error {
            println!("    {load_error}");
        }
    }

    let failed = reports.iter().filter(|r| !r.valid).count();
    if failed == 0 {
        println!("\n{} {} file(s) valid", "OK".green().bold(), reports.len());
    } else {
        println!(
            "\n{} {} of {} file(s) invalid",
            "FAILED".red().bold(),
            failed,
            reports.len()
        );
    }
}

pub fn handle_config_command(args: ConfigArgs) -> Result<()> {
    init_logging(false);
    let config = load_config(args.config.as_deref())?;
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
