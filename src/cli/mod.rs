//! Command-line support for quarry.
//!
//! Query models are described as JSON (see [`model_from_json`]) and can be
//! explained (rendered with their operator strategies) or run in memory
//! against JSON input.

mod convert;
mod explain;
mod model_json;
mod run;

pub use convert::{json_to_value, value_to_json};
pub use explain::{ExplainOptions, execute_explain};
pub use model_json::model_from_json;
pub use run::{RunOptions, execute_run};

use std::io;

use thiserror::Error;

use crate::error::QueryError;

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The JSON model description is malformed
    #[error("Invalid model description: {0}")]
    Model(String),

    /// No input provided
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}

impl CliError {
    fn model(message: impl Into<String>) -> Self {
        CliError::Model(message.into())
    }
}
