use anyhow::{bail, Result};
use colored::*;
use fields::FieldSchema;
use forms::FormDefinitionLoader;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Lint result of one definition file
#[derive(Debug, Serialize)]
struct CheckReport {
    file: String,
    id: Option<String>,
    fields: usize,
    rules: usize,
    mapped_fields: usize,
    error: Option<String>,
}

impl CheckReport {
    fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Check a definition file or every definition in a directory
pub fn execute(path: &Path, format: &str) -> Result<()> {
    let files = definition_files(path)?;
    if files.is_empty() {
        bail!("No form definitions found in {}", path.display());
    }

    let reports: Vec<CheckReport> = files.iter().map(|file| check_file(file)).collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&reports)?),
        "yaml" => print!("{}", serde_yaml::to_string(&reports)?),
        _ => print_reports_text(&reports),
    }

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        bail!(
            "{} of {} form definitions failed to load",
            failed,
            reports.len()
        );
    }

    Ok(())
}

fn definition_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        Ok(FormDefinitionLoader::definition_files(path)?)
    } else if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else {
        bail!("Path does not exist: {}", path.display())
    }
}

fn check_file(path: &Path) -> CheckReport {
    let file = path.display().to_string();
    let loaded = FormDefinitionLoader::load_from_file(path)
        .and_then(|definition| Ok((definition.schema()?, definition)));

    match loaded {
        Ok((schema, definition)) => CheckReport {
            file,
            id: Some(definition.id.clone()),
            fields: schema.len(),
            rules: rule_count(&schema),
            mapped_fields: definition
                .error_response_mapping
                .as_ref()
                .map(|mapping| mapping.len())
                .unwrap_or(0),
            error: None,
        },
        Err(e) => CheckReport {
            file,
            id: None,
            fields: 0,
            rules: 0,
            mapped_fields: 0,
            error: Some(e.to_string()),
        },
    }
}

/// Resolved rules across every field of a schema
fn rule_count(schema: &FieldSchema) -> usize {
    schema
        .names()
        .filter_map(|name| schema.rules(name))
        .map(|rules| rules.len())
        .sum()
}

fn print_reports_text(reports: &[CheckReport]) {
    println!("{}", "=== Form Definitions ===".bold());
    println!();

    for report in reports {
        match (&report.id, &report.error) {
            (_, Some(error)) => {
                println!("{} {}", "✗".red().bold(), report.file);
                println!("    {}", error.red());
            }
            (Some(id), None) => {
                println!(
                    "{} {} {}",
                    "✓".green().bold(),
                    id.cyan().bold(),
                    format!("({})", report.file).dimmed()
                );
                println!(
                    "    {} fields, {} rules, {} mapped for backend errors",
                    report.fields, report.rules, report.mapped_fields
                );
            }
            (None, None) => {}
        }
    }

    println!();
    let valid = reports.iter().filter(|r| r.is_ok()).count();
    let summary = format!("Valid definitions: {}/{}", valid, reports.len());
    if valid == reports.len() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
}
