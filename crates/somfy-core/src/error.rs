//! Model decoding errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}
