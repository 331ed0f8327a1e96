use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::assistants::Tool;

use super::{messages::IncompleteDetails, threads::CreateThreadMessageRequest};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Run {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    /// The ID of the assistant used for this run.
    pub assistant_id: String,
    /// The ID of the thread associated with this run.
    pub thread_id: String,
    /// The status of the run.
    pub status: RunStatus,
    /// The last error that occurred during this run.
    #[serde(default)]
    pub last_error: Option<LastError>,
    /// The time at which the run will expire.
    #[serde(default)]
    pub expires_at: Option<u64>,
    /// The time at which the run was started.
    #[serde(default)]
    pub started_at: Option<u64>,
    /// The time at which the run was completed.
    #[serde(default)]
    pub completed_at: Option<u64>,
    /// The time at which the run was cancelled.
    #[serde(default)]
    pub cancelled_at: Option<u64>,
    /// The time at which the run was failed.
    #[serde(default)]
    pub failed_at: Option<u64>,
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    /// The model used for this run.
    pub model: String,
    /// The instructions given to the assistant.
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    /// Token usage of the run. Null until the run reaches a terminal state.
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LastError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Serialize, Builder, Debug, Clone, Default, PartialEq)]
#[builder(pattern = "owned")]
#[builder(name = "CreateRunBuilder")]
#[builder(setter(strip_option, into))]
pub struct CreateRunRequest {
    pub assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub additional_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub additional_messages: Option<Vec<CreateThreadMessageRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub max_completion_tokens: Option<u32>,
    /// Deliver the run as server-sent events instead of a single object.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub stream: Option<bool>,
}

/// A step of a run, as carried by `thread.run.step.*` events.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RunStep {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    pub run_id: String,
    pub thread_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default)]
    pub step_details: Option<StepDetails>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDetails {
    MessageCreation { message_creation: MessageCreation },
    ToolCalls {
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageCreation {
    pub message_id: String,
}

/// A tool invocation inside a run step, complete or partial.
///
/// Deltas always carry `index`; `id` and `type` only arrive with the first
/// fragment of each call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub file_search: Option<Value>,
    #[serde(default)]
    pub code_interpreter: Option<Value>,
    #[serde(default)]
    pub function: Option<Value>,
}

/// Payload of a `thread.run.step.delta` event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RunStepDeltaObject {
    pub id: String,
    pub object: String,
    pub delta: RunStepDelta,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct RunStepDelta {
    #[serde(default)]
    pub step_details: Option<StepDetails>,
}
