use super::{load_form, read_json};
use anyhow::{anyhow, Result};
use colored::*;
use forms::{ErrorResponseMapper, FailureResponse, MappingReport};
use serde_json::json;
use std::path::Path;

/// Map a backend failure response onto the fields of a form
pub fn execute(form: &Path, response: &Path, format: &str) -> Result<()> {
    let definition = load_form(form)?;
    let mapping = definition.error_response_mapping.as_ref().ok_or_else(|| {
        anyhow!(
            "Form '{}' has no errorResponseMapping; backend errors would not be shown",
            definition.id
        )
    })?;
    let response: FailureResponse = read_json(response)?;

    let report = ErrorResponseMapper::new(mapping).map(&response);

    match format {
        "json" => {
            let output = json!({
                "form": definition.id,
                "fieldErrors": report.field_errors(),
                "mapped": report.mapped,
                "dropped": report.dropped,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => print_report_text(&definition.id, &report),
    }

    Ok(())
}

fn print_report_text(form_id: &str, report: &MappingReport) {
    println!("{} {}", "=== Backend errors for".bold(), format!("{} ===", form_id).bold());
    println!();

    if report.mapped.is_empty() {
        println!("{}", "No backend errors matched a field".yellow());
    }

    for error in &report.mapped {
        println!(
            "{} {} {}",
            error.field.cyan().bold(),
            format!("<- {}", error.backend_key).dimmed(),
            error.message
        );
    }

    for key in &report.dropped {
        println!("{} {}", "dropped".yellow(), key);
    }

    println!();
    println!(
        "{}",
        format!(
            "Shown on form: {}, dropped: {}",
            report.field_errors().len(),
            report.dropped.len()
        )
        .green()
    );
}
