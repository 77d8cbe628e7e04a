use thiserror::Error;

pub type Result<T> = std::result::Result<T, FieldsError>;

#[derive(Error, Debug)]
pub enum FieldsError {
    #[error("Unknown validation rule '{rule}' on field '{field}'")]
    UnknownRule { field: String, rule: String },

    #[error("Invalid validation rule on field '{field}': {message}")]
    InvalidRule { field: String, message: String },

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    #[error("Invalid field definition: {0}")]
    InvalidField(String),

    #[error("Field not found: {0}")]
    NotFound(String),

    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),
}
