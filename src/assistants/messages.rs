use crate::{
    assistants::Tool,
    client::{ListOrder, OpenAiClient},
    ApiResponseOrError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    /// The thread ID that this message belongs to.
    pub thread_id: String,
    /// The status of the message, which can be either in_progress, incomplete, or completed.
    #[serde(default)]
    pub status: Option<Status>,
    /// On an incomplete message, details about why the message is incomplete.
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    /// The Unix timestamp (in seconds) for when the message was completed.
    #[serde(default)]
    pub completed_at: Option<u64>,
    /// The Unix timestamp (in seconds) for when the message was marked as incomplete.
    #[serde(default)]
    pub incomplete_at: Option<u64>,
    /// The entity that produced the message. One of user or assistant
    pub role: Role,
    /// The content of the message.
    pub content: Vec<Content>,
    /// The assistant that produced the message.
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// The ID of the run associated with the creation of this message. Value is null when messages are created manually using the create message or create thread endpoints.
    #[serde(default)]
    pub run_id: Option<String>,
    /// A list of files attached to the message.
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl Message {
    /// The first text block of the message, skipping images and refusals.
    pub fn first_text(&self) -> Option<&Text> {
        self.content.iter().find_map(|content| match content {
            Content::Text(text) => Some(text),
            _ => None,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    InProgress,
    Incomplete,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IncompleteDetails {
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Assistant,
}

/// One block of message content.
///
/// On the wire each block is `{"type": "<kind>", "<kind>": <payload>}`, with
/// keys in any order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "ContentBlock", into = "ContentBlock")]
pub enum Content {
    Text(Text),
    ImageFile(ImageFile),
    ImageUrl(ImageUrl),
    Refusal(String),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: Text },
    ImageFile { image_file: ImageFile },
    ImageUrl { image_url: ImageUrl },
    Refusal { refusal: String },
}

impl From<ContentBlock> for Content {
    fn from(block: ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => Content::Text(text),
            ContentBlock::ImageFile { image_file } => Content::ImageFile(image_file),
            ContentBlock::ImageUrl { image_url } => Content::ImageUrl(image_url),
            ContentBlock::Refusal { refusal } => Content::Refusal(refusal),
        }
    }
}

impl From<Content> for ContentBlock {
    fn from(content: Content) -> Self {
        match content {
            Content::Text(text) => ContentBlock::Text { text },
            Content::ImageFile(image_file) => ContentBlock::ImageFile { image_file },
            Content::ImageUrl(image_url) => ContentBlock::ImageUrl { image_url },
            Content::Refusal(refusal) => ContentBlock::Refusal { refusal },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Text {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// A citation span inside generated text.
///
/// `text` is the literal substring of [`Text::value`] the server marked,
/// e.g. `【4:0†report.pdf】`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub start_index: u32,
    pub end_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_citation: Option<FileCitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<FilePath>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FileCitation {
    pub file_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FilePath {
    pub file_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageFile {
    pub file_id: String,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    pub file_id: String,
    pub tools: Vec<Tool>,
}

/// Payload of a `thread.message.delta` event.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageDeltaObject {
    pub id: String,
    pub object: String,
    pub delta: MessageDelta,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MessageDelta {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Vec<ContentDelta>,
}

/// One fragment of a content block, addressed by the block's `index`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContentDelta {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextDelta>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TextDelta {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Value>,
}

impl OpenAiClient {
    /// Lists the messages of a thread, oldest first.
    pub async fn list_messages(&self, thread_id: &str) -> ApiResponseOrError<Vec<Message>> {
        self.list(format!("threads/{thread_id}/messages"), ListOrder::Asc, None)
            .await
    }
}
