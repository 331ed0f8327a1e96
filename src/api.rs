use crate::{
    assistants::{
        files::{File, FilePurpose},
        runs::CreateRunRequest,
        streaming::RunEventReceiver,
        threads::{CreateThreadRequest, Thread},
        Assistant, CreateAssistantRequest,
    },
    client::OpenAiClient,
    ApiResponseOrError,
};

/// The remote operations an [`AssistantManager`](crate::AssistantManager)
/// drives.
///
/// [`OpenAiClient`] is the production implementation; tests substitute an
/// in-memory one.
#[async_trait::async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Every assistant visible to the caller, all pages included.
    async fn list_assistants(&self) -> ApiResponseOrError<Vec<Assistant>>;

    async fn get_assistant(&self, assistant_id: &str) -> ApiResponseOrError<Assistant>;

    async fn create_assistant(
        &self,
        request: CreateAssistantRequest,
    ) -> ApiResponseOrError<Assistant>;

    async fn upload_file(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        purpose: FilePurpose,
    ) -> ApiResponseOrError<File>;

    async fn create_thread(&self, request: CreateThreadRequest) -> ApiResponseOrError<Thread>;

    /// Starts a streamed run. The receiver yields events until the run ends.
    async fn create_run_stream(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
    ) -> ApiResponseOrError<RunEventReceiver>;
}

#[async_trait::async_trait]
impl AssistantsApi for OpenAiClient {
    async fn list_assistants(&self) -> ApiResponseOrError<Vec<Assistant>> {
        OpenAiClient::list_assistants(self).await
    }

    async fn get_assistant(&self, assistant_id: &str) -> ApiResponseOrError<Assistant> {
        OpenAiClient::get_assistant(self, assistant_id).await
    }

    async fn create_assistant(
        &self,
        request: CreateAssistantRequest,
    ) -> ApiResponseOrError<Assistant> {
        OpenAiClient::create_assistant(self, request).await
    }

    async fn upload_file(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        purpose: FilePurpose,
    ) -> ApiResponseOrError<File> {
        OpenAiClient::upload_file(self, filename, mime_type, bytes, purpose).await
    }

    async fn create_thread(&self, request: CreateThreadRequest) -> ApiResponseOrError<Thread> {
        OpenAiClient::create_thread(self, request).await
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
    ) -> ApiResponseOrError<RunEventReceiver> {
        OpenAiClient::create_run_stream(self, thread_id, request)
    }
}
