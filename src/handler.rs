//! Callback-style consumption of a streamed run.
//!
//! [`EventDispatcher`] reads [`AssistantStreamEvent`]s until the run is done
//! and turns them into calls on an [`AssistantEventHandler`].
//! [`ResponseCollector`] is the handler used to build the final answer.

use std::{cell::OnceCell, collections::HashSet, fmt};

use crate::{
    assistants::{
        messages::{Message, Text, TextDelta},
        runs::{Run, StepDetails, ToolCall},
        streaming::{AssistantStreamEvent, RunEventReceiver},
    },
    ApiResponseOrError,
};

/// Receives the events of a streamed run. Every method defaults to a no-op.
pub trait AssistantEventHandler {
    /// Called for every event before the specific callback.
    fn on_event(&mut self, _event: &AssistantStreamEvent) {}

    /// A `thread.run.*` event changed the run's state.
    fn on_run_updated(&mut self, _run: &Run) {}

    /// The first fragment of a new text block.
    fn on_text_created(&mut self, _text: &TextDelta) {}

    /// Every text fragment, including the first.
    fn on_text_delta(&mut self, _delta: &TextDelta) {}

    /// The first fragment of a new tool call.
    fn on_tool_call_created(&mut self, _tool_call: &ToolCall) {}

    /// A message was completed by the server.
    fn on_message_done(&mut self, _message: &Message) {}

    /// The stream is over. Called exactly once.
    fn on_end(&mut self) {}
}

/// Drives a run's event stream through a handler, remembering the run the
/// stream is working on.
pub struct EventDispatcher<H> {
    handler: H,
    current_run: Option<Run>,
    current_message: Option<String>,
    seen_text_blocks: HashSet<usize>,
    seen_tool_calls: HashSet<(String, usize)>,
    finished: bool,
}

impl<H: AssistantEventHandler> EventDispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            current_run: None,
            current_message: None,
            seen_text_blocks: HashSet::new(),
            seen_tool_calls: HashSet::new(),
            finished: false,
        }
    }

    /// The latest snapshot of the run, if any run event has arrived.
    pub fn current_run(&self) -> Option<&Run> {
        self.current_run.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Consumes events until `done` arrives or the sender goes away.
    ///
    /// A transport failure or an `error` event stops the stream and is
    /// returned as is.
    pub async fn until_done(&mut self, events: &mut RunEventReceiver) -> ApiResponseOrError<()> {
        while !self.finished {
            match events.recv().await {
                Some(event) => self.handle(event?)?,
                None => self.finish(),
            }
        }
        Ok(())
    }

    pub fn handle(&mut self, event: AssistantStreamEvent) -> ApiResponseOrError<()> {
        if self.finished {
            log::debug!("event after end of stream ignored");
            return Ok(());
        }
        self.handler.on_event(&event);

        match event {
            AssistantStreamEvent::Run(run) => {
                if let Some(error) = &run.last_error {
                    log::warn!("run {} {}: {}", run.id, run.status, error.message);
                }
                self.handler.on_run_updated(&run);
                self.current_run = Some(run);
            }
            AssistantStreamEvent::RunStepCreated(step) | AssistantStreamEvent::RunStepUpdated(step) => {
                if let Some(details) = &step.step_details {
                    self.tool_calls(&step.id, details);
                }
            }
            AssistantStreamEvent::RunStepDelta(delta) => {
                if let Some(details) = &delta.delta.step_details {
                    self.tool_calls(&delta.id, details);
                }
            }
            AssistantStreamEvent::MessageCreated(message) => self.start_message(&message.id),
            AssistantStreamEvent::MessageDelta(delta) => {
                if self.current_message.as_deref() != Some(delta.id.as_str()) {
                    self.start_message(&delta.id);
                }
                for content in &delta.delta.content {
                    let Some(text) = &content.text else {
                        continue;
                    };
                    if self.seen_text_blocks.insert(content.index) {
                        self.handler.on_text_created(text);
                    }
                    self.handler.on_text_delta(text);
                }
            }
            AssistantStreamEvent::MessageCompleted(message) => {
                self.handler.on_message_done(&message);
            }
            AssistantStreamEvent::ThreadCreated(_) | AssistantStreamEvent::MessageUpdated(_) => {}
            AssistantStreamEvent::Error(error) => {
                self.finish();
                return Err(error);
            }
            AssistantStreamEvent::Done => self.finish(),
        }
        Ok(())
    }

    fn start_message(&mut self, message_id: &str) {
        self.current_message = Some(message_id.to_string());
        self.seen_text_blocks.clear();
    }

    fn tool_calls(&mut self, step_id: &str, details: &StepDetails) {
        let StepDetails::ToolCalls { tool_calls } = details else {
            return;
        };
        for (position, tool_call) in tool_calls.iter().enumerate() {
            let index = tool_call.index.unwrap_or(position);
            if self.seen_tool_calls.insert((step_id.to_string(), index)) {
                self.handler.on_tool_call_created(tool_call);
            }
        }
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.handler.on_end();
        }
    }
}

impl<H> fmt::Debug for EventDispatcher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("current_run", &self.current_run.as_ref().map(|run| &run.id))
            .field("current_message", &self.current_message)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Replaces each annotation's literal text with its positional marker.
///
/// The annotation at list index `n` becomes `[n]`; every occurrence of its
/// text is replaced. Annotations with empty text are skipped.
pub fn normalize_citations(text: &Text) -> String {
    text.annotations
        .iter()
        .enumerate()
        .filter(|(_, annotation)| !annotation.text.is_empty())
        .fold(text.value.clone(), |value, (index, annotation)| {
            value.replace(&annotation.text, &format!("[{index}]"))
        })
}

/// Collects the first completed message of a run, with citations
/// normalized.
#[derive(Debug, Default)]
pub struct ResponseCollector {
    response: OnceCell<String>,
}

impl ResponseCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response(&self) -> Option<&str> {
        self.response.get().map(String::as_str)
    }

    pub fn into_response(self) -> Option<String> {
        self.response.into_inner()
    }
}

impl AssistantEventHandler for ResponseCollector {
    fn on_text_created(&mut self, text: &TextDelta) {
        log::info!("assistant > text created > {:?}", text.value);
    }

    fn on_tool_call_created(&mut self, tool_call: &ToolCall) {
        log::info!(
            "assistant > tool call created > {}",
            tool_call.kind.as_deref().unwrap_or("unknown")
        );
    }

    fn on_message_done(&mut self, message: &Message) {
        let Some(text) = message.first_text() else {
            log::warn!("message {} completed without text content", message.id);
            return;
        };

        if self.response.set(normalize_citations(text)).is_err() {
            log::warn!(
                "message {} completed after the response was collected; ignored",
                message.id
            );
            return;
        }
        log::info!("assistant > message done > {}", message.id);
    }
}
