//! Send a local file to an OpenAI assistant and collect its streamed answer.
//!
//! The crate creates (or reuses) a named assistant, uploads a file for the
//! `file_search` tool, seeds a thread with a message referencing that file and
//! streams a run, returning the final text with citation markers rewritten to
//! positional `[n]` markers.
//!
//! ## Examples
//!
//! ```no_run
//! use openai_file_assistant::{send_file_for_processing, FileProcessingRequest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let request = FileProcessingRequest::builder()
//!     .assistant_name("Reviewer")
//!     .assistant_instructions("You review quarterly reports.")
//!     .thread_content("Summarize this.")
//!     .file_path("report.pdf")
//!     .build()?;
//!
//! if let Some(answer) = send_file_for_processing(request).await? {
//!     println!("{answer}");
//! }
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::env;

pub mod api;
pub mod assistants;
pub mod client;
pub mod handler;
pub mod manager;
pub mod processing;
pub mod usage;

pub use api::AssistantsApi;
pub use client::OpenAiClient;
pub use handler::{normalize_citations, AssistantEventHandler, EventDispatcher, ResponseCollector};
pub use manager::{AssistantManager, AssistantOptions, ManagerError, ThreadOptions};
pub use processing::{send_file_for_processing, send_file_for_processing_with, FileProcessingRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenAiError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

impl OpenAiError {
    pub fn new(message: String, error_type: String) -> OpenAiError {
        OpenAiError {
            message,
            error_type,
            param: None,
            code: None,
        }
    }
}

impl std::fmt::Display for OpenAiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for OpenAiError {}

impl From<reqwest::Error> for OpenAiError {
    fn from(value: reqwest::Error) -> Self {
        OpenAiError::new(value.to_string(), "reqwest".to_string())
    }
}

impl From<std::io::Error> for OpenAiError {
    fn from(value: std::io::Error) -> Self {
        OpenAiError::new(value.to_string(), "io".to_string())
    }
}

impl From<serde_json::Error> for OpenAiError {
    fn from(value: serde_json::Error) -> Self {
        OpenAiError::new(value.to_string(), "serde".to_string())
    }
}

impl From<reqwest_eventsource::Error> for OpenAiError {
    fn from(value: reqwest_eventsource::Error) -> Self {
        OpenAiError::new(value.to_string(), "eventsource".to_string())
    }
}

impl From<reqwest_eventsource::CannotCloneRequestError> for OpenAiError {
    fn from(value: reqwest_eventsource::CannotCloneRequestError) -> Self {
        OpenAiError::new(value.to_string(), "eventsource".to_string())
    }
}

pub type ApiResponseOrError<T> = Result<T, OpenAiError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    base_url: String,
}

impl Credentials {
    /// Creates credentials with the given API key and base URL.
    ///
    /// A trailing `/` is appended to the base URL if it is missing, since
    /// routes are joined onto it verbatim.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            api_key: api_key.into(),
            base_url,
        }
    }

    /// Fetches the credentials from the ENV variables
    /// OPENAI_KEY and OPENAI_BASE_URL.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    /// An unset key yields empty credentials, which the API rejects on the
    /// first request.
    pub fn from_env() -> Credentials {
        dotenvy::dotenv().ok();
        let api_key = env::var("OPENAI_KEY").unwrap_or_default();
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Credentials::new(api_key, base_url)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
