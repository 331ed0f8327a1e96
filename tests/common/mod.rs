#![allow(dead_code)]

use std::sync::Mutex;

use openai_file_assistant::{
    assistants::{
        files::{File, FilePurpose},
        messages::{Annotation, Content, FileCitation, Message, Role, Text},
        runs::{CreateRunRequest, Run, RunStatus, Usage},
        streaming::{AssistantStreamEvent, RunEventReceiver},
        threads::{CreateThreadRequest, Thread},
        Assistant, CreateAssistantRequest, Tool,
    },
    ApiResponseOrError, AssistantsApi, OpenAiError,
};
use tokio::sync::mpsc::channel;

/// Remote calls recorded by [`FakeApi`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListAssistants,
    GetAssistant(String),
    CreateAssistant(CreateAssistantRequest),
    UploadFile {
        filename: String,
        mime_type: String,
        bytes: Vec<u8>,
        purpose: FilePurpose,
    },
    CreateThread(CreateThreadRequest),
    CreateRunStream {
        thread_id: String,
        request: CreateRunRequest,
    },
}

/// In-memory assistants service with a scripted run stream.
#[derive(Default)]
pub struct FakeApi {
    assistants: Vec<Assistant>,
    events: Vec<ApiResponseOrError<AssistantStreamEvent>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assistants(mut self, assistants: Vec<Assistant>) -> Self {
        self.assistants = assistants;
        self
    }

    pub fn with_events(mut self, events: Vec<AssistantStreamEvent>) -> Self {
        self.events = events.into_iter().map(Ok).collect();
        self
    }

    pub fn with_stream_error(mut self, error: OpenAiError) -> Self {
        self.events.push(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl AssistantsApi for FakeApi {
    async fn list_assistants(&self) -> ApiResponseOrError<Vec<Assistant>> {
        self.record(Call::ListAssistants);
        Ok(self.assistants.clone())
    }

    async fn get_assistant(&self, assistant_id: &str) -> ApiResponseOrError<Assistant> {
        self.record(Call::GetAssistant(assistant_id.to_string()));
        self.assistants
            .iter()
            .find(|assistant| assistant.id == assistant_id)
            .cloned()
            .ok_or_else(|| {
                OpenAiError::new(
                    format!("No assistant found with id '{assistant_id}'."),
                    "invalid_request_error".to_string(),
                )
            })
    }

    async fn create_assistant(
        &self,
        request: CreateAssistantRequest,
    ) -> ApiResponseOrError<Assistant> {
        self.record(Call::CreateAssistant(request.clone()));
        let mut created = assistant("asst_created", request.name.as_deref().unwrap_or(""));
        created.model = request.model;
        created.instructions = request.instructions;
        created.tools = request.tools;
        Ok(created)
    }

    async fn upload_file(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        purpose: FilePurpose,
    ) -> ApiResponseOrError<File> {
        let size = bytes.len() as u64;
        self.record(Call::UploadFile {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
            purpose,
        });
        Ok(File {
            id: "file-uploaded".to_string(),
            object: "file".to_string(),
            created_at: 1,
            bytes: size,
            filename: filename.to_string(),
            purpose,
        })
    }

    async fn create_thread(&self, request: CreateThreadRequest) -> ApiResponseOrError<Thread> {
        self.record(Call::CreateThread(request));
        Ok(Thread {
            id: "thread_created".to_string(),
            object: "thread".to_string(),
            created_at: 1,
            tool_resources: None,
            metadata: None,
        })
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
    ) -> ApiResponseOrError<RunEventReceiver> {
        self.record(Call::CreateRunStream {
            thread_id: thread_id.to_string(),
            request,
        });
        let (tx, rx) = channel(self.events.len().max(1));
        for event in &self.events {
            tx.try_send(event.clone())
                .expect("channel sized to the scripted events");
        }
        Ok(rx)
    }
}

pub fn assistant(id: &str, name: &str) -> Assistant {
    Assistant {
        id: id.to_string(),
        object: "assistant".to_string(),
        created_at: 1,
        name: Some(name.to_string()),
        description: None,
        model: "gpt-4o".to_string(),
        instructions: None,
        tools: vec![Tool::file_search()],
        tool_resources: None,
        metadata: None,
        response_format: None,
        temperature: None,
        top_p: None,
    }
}

pub fn citation(text: &str, start_index: u32) -> Annotation {
    Annotation {
        kind: "file_citation".to_string(),
        text: text.to_string(),
        start_index,
        end_index: start_index + text.len() as u32,
        file_citation: Some(FileCitation {
            file_id: "file-uploaded".to_string(),
        }),
        file_path: None,
    }
}

pub fn completed_message(value: &str, annotations: Vec<Annotation>) -> AssistantStreamEvent {
    AssistantStreamEvent::MessageCompleted(Message {
        id: "msg_1".to_string(),
        object: "thread.message".to_string(),
        created_at: 1,
        thread_id: "thread_created".to_string(),
        status: None,
        incomplete_details: None,
        completed_at: Some(2),
        incomplete_at: None,
        role: Role::Assistant,
        content: vec![Content::Text(Text {
            value: value.to_string(),
            annotations,
        })],
        assistant_id: None,
        run_id: Some("run_1".to_string()),
        attachments: None,
        metadata: None,
    })
}

pub fn run_event(status: RunStatus, usage: Option<Usage>) -> AssistantStreamEvent {
    AssistantStreamEvent::Run(Run {
        id: "run_1".to_string(),
        object: "thread.run".to_string(),
        created_at: 1,
        assistant_id: "asst_1".to_string(),
        thread_id: "thread_created".to_string(),
        status,
        last_error: None,
        expires_at: None,
        started_at: None,
        completed_at: None,
        cancelled_at: None,
        failed_at: None,
        incomplete_details: None,
        model: "gpt-4o".to_string(),
        instructions: None,
        tools: vec![],
        usage,
        metadata: None,
    })
}
