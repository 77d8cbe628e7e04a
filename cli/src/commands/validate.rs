use super::{load_form, read_json};
use anyhow::{bail, Result};
use colored::*;
use fields::{ErrorRecord, FieldSchema, Record};
use serde_json::json;
use std::path::Path;
use tracing::warn;

/// Validate a JSON record against a form definition
pub fn execute(form: &Path, record: &Path, format: &str) -> Result<()> {
    let definition = load_form(form)?;
    let schema = definition.schema()?;
    let record: Record = read_json(record)?;

    let values = merge_record(&schema, record);
    let errors = schema.validate_all(&values);
    let invalid = errors.invalid_fields().count();

    match format {
        "json" => {
            let output = json!({
                "form": definition.id,
                "valid": invalid == 0,
                "errors": errors,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => print_errors_text(&definition.id, &schema, &errors),
    }

    if invalid > 0 {
        bail!("Record failed validation: {} invalid fields", invalid);
    }

    Ok(())
}

/// Overlay a record on the schema's empty values
///
/// Missing fields validate as empty; keys the schema does not know are kept
/// so `match` rules can still reference them.
fn merge_record(schema: &FieldSchema, record: Record) -> Record {
    let mut values = schema.default_values();
    for (name, value) in record {
        if !schema.contains(&name) {
            warn!("Record key '{}' is not a field of this form", name);
        }
        values.insert(name, value);
    }
    values
}

fn print_errors_text(form_id: &str, schema: &FieldSchema, errors: &ErrorRecord) {
    println!("{} {}", "=== Validating".bold(), format!("{} ===", form_id).bold());
    println!();

    for field in schema.fields() {
        let message = errors.get(&field.name);
        if message.is_empty() {
            println!("{} {}", "✓".green().bold(), field.name.cyan());
        } else {
            println!("{} {}: {}", "✗".red().bold(), field.name.cyan(), message.red());
        }
    }

    println!();
    if errors.has_errors() {
        println!("{}", "Record is invalid".yellow());
    } else {
        println!("{}", "Record is valid".green());
    }
}
