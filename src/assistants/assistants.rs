use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    client::{ListOrder, OpenAiClient},
    ApiResponseOrError,
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Assistant {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    /// The name of the assistant. The maximum length is 256 characters.
    pub name: Option<String>,
    /// The description of the assistant. The maximum length is 512 characters.
    #[serde(default)]
    pub description: Option<String>,
    /// ID of the model to use. You can use the List models API to see all of your available models, or see our Model overview for descriptions of them.
    pub model: String,
    /// The system instructions that the assistant uses. The maximum length is 256,000 characters.
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    /// A set of resources that are used by the assistant's tools. The resources are specific to the type of tool. For example, the code_interpreter tool requires a list of file IDs, while the file_search tool requires a list of vector store IDs.
    #[serde(default)]
    pub tool_resources: Option<ToolResources>,
    /// Set of 16 key-value pairs that can be attached to an object. This can be useful for storing additional information about the object in a structured format. Keys can be a maximum of 64 characters long and values can be a maximum of 512 characters long.
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    /// Either the string `"auto"` or a format object such as `{"type": "json_object"}`.
    #[serde(default)]
    pub response_format: Option<Value>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_p: Option<f32>,
}

impl Assistant {
    /// Whether `id_or_name` is exactly this assistant's id or name.
    pub fn is_identified_by(&self, id_or_name: &str) -> bool {
        self.id == id_or_name || self.name.as_deref() == Some(id_or_name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    CodeInterpreter,
    FileSearch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_search: Option<FileSearch>,
    },
    Function {
        function: Function,
    },
}

impl Tool {
    /// The `file_search` tool with server-side defaults.
    pub fn file_search() -> Self {
        Tool::FileSearch { file_search: None }
    }

    /// The tool's declared `type` as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Tool::CodeInterpreter => "code_interpreter",
            Tool::FileSearch { .. } => "file_search",
            Tool::Function { .. } => "function",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the function's arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct FileSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_results: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking_options: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_interpreter: Option<CodeInterpreterResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CodeInterpreterResources {
    /// A list of file IDs made available to the `code_interpreter`` tool. There can be a maximum of 20 files associated with the tool.
    pub file_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FileSearchResources {
    /// The ID of the vector store attached to this assistant. There can be a maximum of 1 vector store attached to the assistant.
    pub vector_store_ids: Vec<String>,
}

#[derive(Serialize, Default, Debug, Clone, PartialEq)]
pub struct CreateAssistantRequest {
    /// ID of the model to use. You can use the List models API to see all of your available models, or see our Model overview for descriptions of them.
    pub model: String,

    /// The name of the assistant. The maximum length is 256 characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The description of the assistant. The maximum length is 512 characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The system instructions that the assistant uses. The maximum length is 256,000 characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// A set of tools that the assistant can use.
    pub tools: Vec<Tool>,
    /// A set of resources that are used by the assistant's tools. The resources are specific to the type of tool. For example, the code_interpreter tool requires a list of file IDs, while the file_search tool requires a list of vector store IDs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
    /// Set of 16 key-value pairs that can be attached to an object. This can be useful for storing additional information about the object in a structured format. Keys can be a maximum of 64 characters long and values can be a maximum of 512 characters long.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl OpenAiClient {
    pub async fn create_assistant(
        &self,
        request: CreateAssistantRequest,
    ) -> ApiResponseOrError<Assistant> {
        self.post("assistants", request).await
    }

    pub async fn get_assistant(&self, assistant_id: &str) -> ApiResponseOrError<Assistant> {
        self.get(format!("assistants/{}", assistant_id)).await
    }

    /// Lists every assistant visible to the client's key, newest first.
    pub async fn list_assistants(&self) -> ApiResponseOrError<Vec<Assistant>> {
        self.list("assistants", ListOrder::Desc, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_listed_assistant() {
        let assistant: Assistant = serde_json::from_value(json!({
            "id": "asst_abc123",
            "object": "assistant",
            "created_at": 1698982736,
            "name": "Reviewer",
            "description": null,
            "model": "gpt-4o",
            "instructions": "You review reports.",
            "tools": [
                {"type": "file_search", "file_search": {"ranking_options": {"ranker": "auto", "score_threshold": 0.0}}},
                {"type": "code_interpreter"}
            ],
            "tool_resources": {"file_search": {"vector_store_ids": []}},
            "metadata": {},
            "top_p": 1.0,
            "temperature": 1.0,
            "response_format": "auto"
        }))
        .unwrap();

        assert_eq!(assistant.name.as_deref(), Some("Reviewer"));
        assert_eq!(assistant.tools.len(), 2);
        assert_eq!(assistant.tools[0].kind(), "file_search");
        assert_eq!(assistant.tools[1], Tool::CodeInterpreter);
        assert!(assistant.is_identified_by("asst_abc123"));
        assert!(assistant.is_identified_by("Reviewer"));
        assert!(!assistant.is_identified_by("reviewer"));
        assert!(!assistant.is_identified_by("Review"));
    }

    #[test]
    fn create_request_serializes_default_tool() {
        let request = CreateAssistantRequest {
            model: "gpt-3.5-turbo".to_string(),
            name: Some("Reviewer".to_string()),
            instructions: Some("Be brief.".to_string()),
            tools: vec![Tool::file_search()],
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "name": "Reviewer",
                "instructions": "Be brief.",
                "tools": [{"type": "file_search"}]
            })
        );
    }
}
