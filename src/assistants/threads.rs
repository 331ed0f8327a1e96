use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{assistants::ToolResources, client::OpenAiClient, ApiResponseOrError};

use super::messages::{Attachment, Role};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Thread {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    /// A set of resources that are used by the assistant's tools. The resources are specific to the type of tool. For example, the code_interpreter tool requires a list of file IDs, while the file_search tool requires a list of vector store IDs.
    #[serde(default)]
    pub tool_resources: Option<ToolResources>,
    /// Set of 16 key-value pairs that can be attached to an object. This can be useful for storing additional information about the object in a structured format. Keys can be a maximum of 64 characters long and values can be a maximum of 512 characters long.
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Serialize, Builder, Debug, Clone, Default, PartialEq)]
#[builder(pattern = "owned")]
#[builder(name = "CreateThreadBuilder")]
#[builder(setter(strip_option, into))]
pub struct CreateThreadRequest {
    pub messages: Vec<CreateThreadMessageRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub tool_resources: Option<ToolResources>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Serialize, Builder, Debug, Clone, PartialEq)]
#[builder(pattern = "owned")]
#[builder(name = "CreateThreadMessageBuilder")]
#[builder(setter(strip_option, into))]
pub struct CreateThreadMessageRequest {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl OpenAiClient {
    pub async fn create_thread(&self, request: CreateThreadRequest) -> ApiResponseOrError<Thread> {
        self.post("threads", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistants::Tool;
    use serde_json::json;

    #[test]
    fn seed_message_with_file_attachment() {
        let message = CreateThreadMessageBuilder::default()
            .role(Role::User)
            .content("Summarize this.")
            .attachments(vec![Attachment {
                file_id: "file-abc123".to_string(),
                tools: vec![Tool::file_search()],
            }])
            .build()
            .unwrap();
        let request = CreateThreadBuilder::default()
            .messages(vec![message])
            .build()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [{
                    "role": "user",
                    "content": "Summarize this.",
                    "attachments": [{"file_id": "file-abc123", "tools": [{"type": "file_search"}]}]
                }]
            })
        );
    }

    #[test]
    fn message_builder_requires_content() {
        assert!(CreateThreadMessageBuilder::default()
            .role(Role::User)
            .build()
            .is_err());
    }
}
