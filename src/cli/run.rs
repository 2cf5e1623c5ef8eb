//! Run a JSON model description against JSON input

use super::{CliError, json_to_value, model_from_json, value_to_json};
use crate::{ExecutionLimits, InMemoryData, InMemoryDataSource, InMemoryExecutor};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// JSON model description
    pub model: String,
    /// JSON object mapping source names to arrays
    pub input: Option<String>,
    pub limits: ExecutionLimits,
}

/// Execute the model in memory and return its result as JSON.
pub fn execute_run(options: &RunOptions) -> Result<serde_json::Value, CliError> {
    let model = model_from_json(&options.model)?;

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;
    let sources = json_value
        .as_object()
        .ok_or_else(|| CliError::model("input must be an object of named arrays"))?;

    let mut data_source = InMemoryDataSource::new();
    for (name, items) in sources {
        let items = items
            .as_array()
            .ok_or_else(|| CliError::model(format!("input source '{}' must be an array", name)))?;
        data_source.add_source(name, items.iter().cloned().map(json_to_value).collect());
    }

    let executor = InMemoryExecutor::with_limits(&data_source, options.limits.clone());
    let output = match executor.execute(&model)? {
        InMemoryData::Sequence(items) => {
            serde_json::Value::Array(items.into_iter().map(value_to_json).collect())
        }
        InMemoryData::Value(value) => value_to_json(value),
    };
    Ok(output)
}
