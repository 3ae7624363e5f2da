use serde::{Deserialize, Serialize};

/// Who authored a message in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Result of a tool execution, correlated to the call that produced it.
    Tool,
}
