//! Server-sent events emitted by a streamed run.

use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::mpsc::{channel, Receiver, Sender};

use crate::{client::OpenAiClient, ApiResponseOrError, OpenAiError};

use super::{
    messages::{Message, MessageDeltaObject},
    runs::{CreateRunRequest, Run, RunStep, RunStepDeltaObject},
    threads::Thread,
};

/// Receiving half of a streamed run. Closed once the run finishes.
pub type RunEventReceiver = Receiver<ApiResponseOrError<AssistantStreamEvent>>;

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantStreamEvent {
    /// `thread.created`
    ThreadCreated(Thread),
    /// Any `thread.run.<status>` event. The run's status tells which.
    Run(Run),
    /// `thread.run.step.created`
    RunStepCreated(RunStep),
    /// `thread.run.step.delta`
    RunStepDelta(RunStepDeltaObject),
    /// `thread.run.step.in_progress`, `.completed`, `.failed`, `.cancelled`, `.expired`
    RunStepUpdated(RunStep),
    /// `thread.message.created`
    MessageCreated(Message),
    /// `thread.message.delta`
    MessageDelta(MessageDeltaObject),
    /// `thread.message.completed`
    MessageCompleted(Message),
    /// `thread.message.in_progress`, `.incomplete`
    MessageUpdated(Message),
    /// `error`
    Error(OpenAiError),
    /// `done`, the last event of every stream.
    Done,
}

impl AssistantStreamEvent {
    /// Parses one SSE frame by event name.
    ///
    /// Returns `Ok(None)` for event names this crate does not model.
    pub fn from_sse(event: &str, data: &str) -> Result<Option<Self>, serde_json::Error> {
        let parsed = match event {
            "done" => Self::Done,
            "error" => Self::Error(parse_error(data)?),
            "thread.created" => Self::ThreadCreated(serde_json::from_str(data)?),
            "thread.run.step.created" => Self::RunStepCreated(serde_json::from_str(data)?),
            "thread.run.step.delta" => Self::RunStepDelta(serde_json::from_str(data)?),
            "thread.message.created" => Self::MessageCreated(serde_json::from_str(data)?),
            "thread.message.delta" => Self::MessageDelta(serde_json::from_str(data)?),
            "thread.message.completed" => Self::MessageCompleted(serde_json::from_str(data)?),
            "thread.message.in_progress" | "thread.message.incomplete" => {
                Self::MessageUpdated(serde_json::from_str(data)?)
            }
            name if name.starts_with("thread.run.step.") => {
                Self::RunStepUpdated(serde_json::from_str(data)?)
            }
            name if name.starts_with("thread.run.") => Self::Run(serde_json::from_str(data)?),
            _ => return Ok(None),
        };
        Ok(Some(parsed))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Wrapped { error: OpenAiError },
    Bare(OpenAiError),
}

fn parse_error(data: &str) -> Result<OpenAiError, serde_json::Error> {
    Ok(match serde_json::from_str(data)? {
        ErrorPayload::Wrapped { error } => error,
        ErrorPayload::Bare(error) => error,
    })
}

impl OpenAiClient {
    /// Starts a run on `thread_id` and streams its events.
    ///
    /// `request.stream` is forced on. Events are parsed on a spawned task and
    /// forwarded through the returned receiver, which closes after `done`,
    /// after the first error, or when the server ends the stream.
    pub fn create_run_stream(
        &self,
        thread_id: &str,
        mut request: CreateRunRequest,
    ) -> ApiResponseOrError<RunEventReceiver> {
        request.stream = Some(true);
        let stream = self.post_stream(format!("threads/{thread_id}/runs"), &request)?;
        let (tx, rx) = channel(32);
        tokio::spawn(forward_run_stream(stream, tx));
        Ok(rx)
    }
}

async fn forward_run_stream(
    mut stream: EventSource,
    tx: Sender<ApiResponseOrError<AssistantStreamEvent>>,
) {
    while let Some(event) = stream.next().await {
        let message = match event {
            Ok(Event::Open) => continue,
            Ok(Event::Message(message)) => message,
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                let body = response.text().await.unwrap_or_default();
                let error = parse_error(&body)
                    .unwrap_or_else(|_| OpenAiError::new(format!("{status}: {body}"), "unknown".to_string()));
                let _ = tx.send(Err(error)).await;
                break;
            }
            Err(err) => {
                let _ = tx.send(Err(err.into())).await;
                break;
            }
        };

        let parsed = match AssistantStreamEvent::from_sse(&message.event, &message.data) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => {
                log::debug!("ignoring stream event {}", message.event);
                continue;
            }
            Err(err) => {
                let _ = tx.send(Err(err.into())).await;
                break;
            }
        };

        let done = parsed.is_done();
        if tx.send(Ok(parsed)).await.is_err() || done {
            break;
        }
    }
    stream.close();
}
