//! One-shot "send this file, get an answer" entry points.

use std::path::PathBuf;

use derive_builder::Builder;

use crate::{
    api::AssistantsApi,
    manager::{AssistantManager, AssistantOptions, ManagerError, ThreadOptions},
};

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(pattern = "owned")]
#[builder(setter(strip_option, into))]
pub struct FileProcessingRequest {
    /// Name (or id) of the assistant to reuse or create. Without one, the
    /// manager's cached assistant is used.
    #[builder(default)]
    pub assistant_name: Option<String>,
    /// Instructions for a newly created assistant. Ignored on reuse.
    #[builder(default)]
    pub assistant_instructions: Option<String>,
    /// Text of the thread's seed message.
    pub thread_content: String,
    /// Local file uploaded and attached to the seed message.
    pub file_path: PathBuf,
    #[builder(default)]
    pub assistant_options: AssistantOptions,
    #[builder(default)]
    pub thread_options: ThreadOptions,
}

impl FileProcessingRequest {
    pub fn builder() -> FileProcessingRequestBuilder {
        FileProcessingRequestBuilder::default()
    }
}

/// Runs the whole exchange on `manager`: assistant, upload, thread, response.
///
/// Every step goes through the same manager, so its cached assistant,
/// file and thread are the ones the response is fetched for. Errors from
/// any step are returned unchanged; remote objects created by earlier
/// steps are left in place.
pub async fn send_file_for_processing_with<A: AssistantsApi>(
    manager: &mut AssistantManager<A>,
    request: FileProcessingRequest,
) -> Result<Option<String>, ManagerError> {
    manager
        .create_or_reuse_assistant(
            request.assistant_name.as_deref(),
            request.assistant_instructions.as_deref(),
            request.assistant_options,
        )
        .await?;
    manager.attach_file(&request.file_path).await?;
    manager
        .create_thread(&request.thread_content, request.thread_options)
        .await?;
    manager.get_response().await
}

/// [`send_file_for_processing_with`] on a fresh manager whose client is
/// configured from the environment.
pub async fn send_file_for_processing(
    request: FileProcessingRequest,
) -> Result<Option<String>, ManagerError> {
    let mut manager = AssistantManager::from_env()?;
    send_file_for_processing_with(&mut manager, request).await
}
