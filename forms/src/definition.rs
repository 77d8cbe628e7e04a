use crate::mapping::ErrorResponseMapping;
use crate::{FormError, Result};
use fields::{FieldDefinition, FieldSchema};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File suffixes recognised as form definitions
const DEFINITION_SUFFIXES: [&str; 2] = [".form.yaml", ".form.yml"];

/// Form definition as stored in a `*.form.yaml` file
///
/// Change hooks and the submit handler are code, so they are attached after
/// loading through [`crate::FormConfig::from_definition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_response_mapping: Option<ErrorResponseMapping>,
    #[serde(default)]
    pub cancel_confirmation_disabled: bool,
    #[serde(default)]
    pub loading_disabled: bool,
}

impl FormDefinition {
    /// Parse and validate a definition from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let definition: FormDefinition = serde_yaml::from_str(content)
            .map_err(|e| FormError::DefinitionParsing(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Register the field schema of this definition
    pub fn schema(&self) -> Result<FieldSchema> {
        Ok(FieldSchema::new(self.fields.clone())?)
    }

    /// Validate the definition
    ///
    /// Rule names are resolved here, so an unknown rule fails the load
    /// instead of surfacing while a user types.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(FormError::InvalidDefinition(
                "Form ID cannot be empty".to_string(),
            ));
        }

        if self.fields.is_empty() {
            return Err(FormError::InvalidDefinition(format!(
                "Form '{}' has no fields",
                self.id
            )));
        }

        let schema = self.schema()?;

        if let Some(mapping) = &self.error_response_mapping {
            for field in mapping.fields() {
                if !schema.contains(field) {
                    warn!(
                        "Form '{}' maps backend errors to unknown field '{}'",
                        self.id, field
                    );
                }
            }
        }

        Ok(())
    }
}

/// Load form definitions from YAML files
pub struct FormDefinitionLoader;

impl FormDefinitionLoader {
    /// Load a single form definition from a YAML file
    pub fn load_from_file(path: &Path) -> Result<FormDefinition> {
        debug!("Loading form definition from: {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let definition = FormDefinition::from_yaml(&content).map_err(|e| match e {
            FormError::DefinitionParsing(msg) => {
                FormError::DefinitionParsing(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        info!("Loaded form '{}' from {:?}", definition.id, path);

        Ok(definition)
    }

    /// Form definition files in a directory, sorted by path
    pub fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(FormError::InvalidDefinition(format!(
                "Form definition directory does not exist: {:?}",
                dir
            )));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_definition = path
                .file_name()
                .map(|name| name.to_string_lossy())
                .map(|name| DEFINITION_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
                .unwrap_or(false);

            if is_definition && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }

    /// Load all form definitions from a directory
    ///
    /// Files that fail to load are logged and skipped.
    pub fn load_from_directory(dir: &Path) -> Result<Vec<FormDefinition>> {
        info!("Loading form definitions from directory: {:?}", dir);

        let mut definitions = Vec::new();
        for path in Self::definition_files(dir)? {
            match Self::load_from_file(&path) {
                Ok(definition) => definitions.push(definition),
                Err(e) => {
                    tracing::error!("Failed to load form definition from {:?}: {}", path, e);
                }
            }
        }

        info!("Loaded {} form definitions", definitions.len());

        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fields::{FieldKind, FieldsError, Rule};
    use std::fs;
    use tempfile::TempDir;

    const ATTENDANCE_FORM: &str = r#"
id: attendance
name: Record attendance
fields:
  - name: student
    label: Student
    kind: select
    validations:
      - name: required
  - name: class
    label: Class
    kind: select
    validations:
      - name: required
  - name: date
    label: Date
    kind: date
    format: "%d/%m/%Y"
  - name: present
    label: Present
    kind: switch
errorResponseMapping:
  student: studentId
  class: classId
  date: date
cancelConfirmationDisabled: true
"#;

    #[test]
    fn test_parse_definition() {
        let definition = FormDefinition::from_yaml(ATTENDANCE_FORM).unwrap();
        assert_eq!(definition.id, "attendance");
        assert_eq!(definition.fields.len(), 4);
        assert!(definition.cancel_confirmation_disabled);
        assert!(!definition.loading_disabled);

        let mapping = definition.error_response_mapping.as_ref().unwrap();
        assert_eq!(
            mapping.iter().collect::<Vec<_>>(),
            vec![("student", "studentId"), ("class", "classId"), ("date", "date")]
        );

        let schema = definition.schema().unwrap();
        assert_eq!(schema.rules("student"), Some(&[Rule::Required][..]));
        assert!(matches!(
            &schema.field("date").unwrap().kind,
            FieldKind::Date { format: Some(f) } if f == "%d/%m/%Y"
        ));
    }

    #[test]
    fn test_unknown_rule_fails_load() {
        let yaml = r#"
id: payment
name: Payment
fields:
  - name: amount
    label: Amount
    kind: text
    validations:
      - name: positive
"#;
        assert!(matches!(
            FormDefinition::from_yaml(yaml),
            Err(FormError::Schema(FieldsError::UnknownRule { .. }))
        ));
    }

    #[test]
    fn test_definition_requires_fields() {
        let yaml = "id: empty\nname: Empty\nfields: []\n";
        assert!(matches!(
            FormDefinition::from_yaml(yaml),
            Err(FormError::InvalidDefinition(_))
        ));
        assert!(matches!(
            FormDefinition::from_yaml("id: [unterminated"),
            Err(FormError::DefinitionParsing(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip_keeps_mapping_order() {
        let definition = FormDefinition::from_yaml(ATTENDANCE_FORM).unwrap();
        let reparsed = FormDefinition::from_yaml(&definition.to_yaml().unwrap()).unwrap();
        assert_eq!(
            reparsed.error_response_mapping,
            definition.error_response_mapping
        );
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        fs::write(dir.join("attendance.form.yaml"), ATTENDANCE_FORM).unwrap();
        fs::write(
            dir.join("broken.form.yml"),
            "id: broken\nname: Broken\nfields:\n  - name: x\n    label: X\n    kind: slider\n",
        )
        .unwrap();
        fs::write(dir.join("notes.yaml"), "not: a form").unwrap();

        let files = FormDefinitionLoader::definition_files(dir).unwrap();
        assert_eq!(files.len(), 2);

        let definitions = FormDefinitionLoader::load_from_directory(dir).unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].id, "attendance");

        assert!(FormDefinitionLoader::load_from_file(&dir.join("broken.form.yml")).is_err());
        assert!(FormDefinitionLoader::load_from_directory(&dir.join("missing")).is_err());
    }
}
