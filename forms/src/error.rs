use fields::FieldsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormError>;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Schema error: {0}")]
    Schema(#[from] FieldsError),

    #[error("Form definition parsing error: {0}")]
    DefinitionParsing(String),

    #[error("Invalid form definition: {0}")]
    InvalidDefinition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlParsing(#[from] serde_yaml::Error),
}
