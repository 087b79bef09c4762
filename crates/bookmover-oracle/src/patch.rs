use serde::{Deserialize, Serialize};

/// Structured code-patch artifact (§9): replaces free-form patch text with a
/// tagged variant so the supervisor's apply step never has to interpret
/// arbitrary diff syntax itself beyond the `UnifiedDiff` hunk text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PatchSpec {
    FunctionReplace { name: String, body: String },
    Replace {
        context_before: String,
        old: String,
        new: String,
        context_after: String,
    },
    UnifiedDiff { hunks: Vec<String> },
}
