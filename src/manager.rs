//! Assistant, file and thread bookkeeping for one interaction.

use std::path::{Path, PathBuf};

use derive_builder::Builder;

use crate::{
    api::AssistantsApi,
    assistants::{
        files::{upload_metadata, File, FilePurpose},
        messages::{Attachment, Role},
        runs::CreateRunRequest,
        threads::{CreateThreadMessageRequest, CreateThreadRequest, Thread},
        Assistant, CreateAssistantRequest, Tool,
    },
    client::OpenAiClient,
    handler::{EventDispatcher, ResponseCollector},
    usage, OpenAiError,
};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Api(#[from] OpenAiError),
    #[error(transparent)]
    Client(#[from] anyhow::Error),
}

/// Settings for an assistant created by
/// [`AssistantManager::create_or_reuse_assistant`].
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(pattern = "owned")]
#[builder(setter(into))]
pub struct AssistantOptions {
    /// Defaults to a single `file_search` tool.
    #[builder(default = "vec![Tool::file_search()]")]
    pub tools: Vec<Tool>,
    #[builder(default = "DEFAULT_MODEL.to_string()")]
    pub model: String,
}

impl AssistantOptions {
    pub fn builder() -> AssistantOptionsBuilder {
        AssistantOptionsBuilder::default()
    }
}

impl Default for AssistantOptions {
    fn default() -> Self {
        Self {
            tools: vec![Tool::file_search()],
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Builder, Debug, Clone, Default, PartialEq)]
#[builder(pattern = "owned")]
#[builder(setter(into))]
pub struct ThreadOptions {
    /// Role of the seed message.
    #[builder(default)]
    pub role: Role,
}

impl ThreadOptions {
    pub fn builder() -> ThreadOptionsBuilder {
        ThreadOptionsBuilder::default()
    }
}

/// Holds the assistant, uploaded file and thread of a single interaction.
///
/// Calls are expected in order: assistant, file, thread, response. The
/// manager caches each remote object so later steps can refer to it.
#[derive(Debug)]
pub struct AssistantManager<A = OpenAiClient> {
    client: A,
    assistant: Option<Assistant>,
    file: Option<File>,
    thread: Option<Thread>,
}

impl AssistantManager<OpenAiClient> {
    /// A manager over a client configured from `OPENAI_KEY` / `OPENAI_BASE_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(OpenAiClient::default()?))
    }
}

impl<A: AssistantsApi> AssistantManager<A> {
    pub fn new(client: A) -> Self {
        Self {
            client,
            assistant: None,
            file: None,
            thread: None,
        }
    }

    pub fn client(&self) -> &A {
        &self.client
    }

    pub fn assistant(&self) -> Option<&Assistant> {
        self.assistant.as_ref()
    }

    pub fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }

    pub fn thread(&self) -> Option<&Thread> {
        self.thread.as_ref()
    }

    /// Returns the assistant for this interaction, creating it if needed.
    ///
    /// Without a name the cached assistant is returned, and it is an error
    /// to have none. With a name, an existing remote assistant whose id or
    /// name matches is reused; otherwise one is created from `options`.
    pub async fn create_or_reuse_assistant(
        &mut self,
        name: Option<&str>,
        instructions: Option<&str>,
        options: AssistantOptions,
    ) -> Result<&Assistant, ManagerError> {
        let Some(name) = name.filter(|name| !name.is_empty()) else {
            let assistant = self.assistant.as_ref().ok_or_else(|| {
                ManagerError::InvalidArgument("missing name for assistant creation".to_string())
            })?;
            log::info!("Using assistant {} cached on the manager", assistant.id);
            return Ok(assistant);
        };

        let assistant = match self.find_assistant(name).await? {
            Some(assistant) => {
                log::info!("Using existing assistant {} found on service", assistant.id);
                assistant
            }
            None => {
                let assistant = self
                    .client
                    .create_assistant(CreateAssistantRequest {
                        model: options.model,
                        name: Some(name.to_string()),
                        instructions: instructions.map(str::to_string),
                        tools: options.tools,
                        ..Default::default()
                    })
                    .await?;
                log::info!("Created assistant {} ({name})", assistant.id);
                assistant
            }
        };

        Ok(self.assistant.insert(assistant))
    }

    /// Looks up an assistant by exact id or exact name.
    ///
    /// The first listed match is fetched again by id so the full object is
    /// returned.
    pub async fn find_assistant(&self, id_or_name: &str) -> Result<Option<Assistant>, ManagerError> {
        if id_or_name.is_empty() {
            return Ok(None);
        }

        let assistants = self.client.list_assistants().await?;
        let Some(found) = assistants
            .iter()
            .find(|assistant| assistant.is_identified_by(id_or_name))
        else {
            return Ok(None);
        };

        Ok(Some(self.client.get_assistant(&found.id).await?))
    }

    /// Uploads a local file for use by the assistant's `file_search` tool.
    ///
    /// The file is read fully and closed before the upload starts.
    pub async fn attach_file(&mut self, path: impl AsRef<Path>) -> Result<&File, ManagerError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ManagerError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let (filename, mime_type) = upload_metadata(path);

        let file = self
            .client
            .upload_file(&filename, &mime_type, bytes, FilePurpose::Assistants)
            .await?;
        log::info!("Uploaded {} as {}", path.display(), file.id);

        Ok(self.file.insert(file))
    }

    /// Creates a thread seeded with one message that carries the uploaded
    /// file as a `file_search` attachment.
    pub async fn create_thread(
        &mut self,
        content: &str,
        options: ThreadOptions,
    ) -> Result<&Thread, ManagerError> {
        if content.is_empty() {
            return Err(ManagerError::InvalidArgument(
                "no content provided for thread creation".to_string(),
            ));
        }
        let file_id = self
            .file
            .as_ref()
            .map(|file| file.id.clone())
            .ok_or_else(|| {
                ManagerError::Precondition("create_thread requires an attached file".to_string())
            })?;

        let request = CreateThreadRequest {
            messages: vec![CreateThreadMessageRequest {
                role: options.role,
                content: content.to_string(),
                attachments: Some(vec![Attachment {
                    file_id,
                    tools: vec![Tool::file_search()],
                }]),
                metadata: None,
            }],
            ..Default::default()
        };
        let thread = self.client.create_thread(request).await?;
        log::info!("Created thread {}", thread.id);

        Ok(self.thread.insert(thread))
    }

    /// Streams a run of the cached assistant on the cached thread and
    /// returns the first completed message, with citations normalized.
    ///
    /// `Ok(None)` means the run ended without completing a text message.
    pub async fn get_response(&self) -> Result<Option<String>, ManagerError> {
        let thread = self.thread.as_ref().ok_or_else(|| {
            ManagerError::Precondition("get_response requires a thread".to_string())
        })?;
        let assistant = self.assistant.as_ref().ok_or_else(|| {
            ManagerError::Precondition("get_response requires an assistant".to_string())
        })?;

        let request = CreateRunRequest {
            assistant_id: assistant.id.clone(),
            stream: Some(true),
            ..Default::default()
        };
        let mut events = self.client.create_run_stream(&thread.id, request).await?;

        let mut dispatcher = EventDispatcher::new(ResponseCollector::new());
        dispatcher.until_done(&mut events).await?;
        usage::log_token_usage(&dispatcher);

        let response = dispatcher.into_handler().into_response();
        if response.is_none() {
            log::warn!("run on thread {} produced no message", thread.id);
        }
        Ok(response)
    }
}
