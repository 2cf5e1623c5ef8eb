//! Render a JSON model description

use super::{CliError, model_from_json};
use crate::QueryRenderer;

/// Options for the explain command
#[derive(Debug, Clone, Default)]
pub struct ExplainOptions {
    /// JSON model description
    pub model: String,
    /// List each result operator with its execution strategy
    pub strategies: bool,
}

/// Render the model as query text, optionally followed by one line per
/// result operator.
pub fn execute_explain(options: &ExplainOptions) -> Result<String, CliError> {
    let model = model_from_json(&options.model)?;
    let mut text = QueryRenderer::render(&model)?;

    if options.strategies {
        for (index, operator) in model.result_operators().iter().enumerate() {
            text.push_str(&format!("\n  {}: {} [{}]", index, operator, operator.strategy()));
        }
    }
    Ok(text)
}
