//! Token usage lookup on a streamed run, for diagnostics only.
//!
//! The counters live at `current_run.usage.<counter>`. Any link of that chain
//! may be absent (no run event yet, usage not reported), in which case the
//! lookup logs the missing link and yields `None`.

use std::fmt;

use crate::{
    assistants::runs::{Run, Usage},
    handler::EventDispatcher,
};

/// Something that may know the run a stream is working on.
pub trait RunSource {
    fn current_run(&self) -> Option<&Run>;
}

impl<H: crate::AssistantEventHandler> RunSource for EventDispatcher<H> {
    fn current_run(&self) -> Option<&Run> {
        EventDispatcher::current_run(self)
    }
}

impl RunSource for Option<Run> {
    fn current_run(&self) -> Option<&Run> {
        self.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageCounter {
    CompletionTokens,
    PromptTokens,
    TotalTokens,
}

impl UsageCounter {
    pub const ALL: [UsageCounter; 3] = [
        UsageCounter::CompletionTokens,
        UsageCounter::PromptTokens,
        UsageCounter::TotalTokens,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UsageCounter::CompletionTokens => "completion_tokens",
            UsageCounter::PromptTokens => "prompt_tokens",
            UsageCounter::TotalTokens => "total_tokens",
        }
    }

    fn read(&self, usage: &Usage) -> u32 {
        match self {
            UsageCounter::CompletionTokens => usage.completion_tokens,
            UsageCounter::PromptTokens => usage.prompt_tokens,
            UsageCounter::TotalTokens => usage.total_tokens,
        }
    }
}

/// The first link of the lookup chain that was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MissingAttribute(pub &'static str);

/// Walks `current_run → usage → counter`, stopping at the first absent link.
pub fn resolve_usage<S>(source: &S, counter: UsageCounter) -> Result<u32, MissingAttribute>
where
    S: RunSource + ?Sized,
{
    let run = source
        .current_run()
        .ok_or(MissingAttribute("current_run"))?;
    let usage = run.usage.as_ref().ok_or(MissingAttribute("usage"))?;
    Ok(counter.read(usage))
}

/// Best-effort counter lookup. An absent source yields `None` silently; a
/// missing link is logged once at error level.
pub fn token_count<S>(source: Option<&S>, counter: UsageCounter) -> Option<u32>
where
    S: RunSource + fmt::Debug + ?Sized,
{
    let source = source?;
    match resolve_usage(source, counter) {
        Ok(count) => Some(count),
        Err(missing) => {
            log::error!("Attribute not found: {missing} on object {source:?}");
            None
        }
    }
}

/// Logs every usage counter of the source's current run.
pub fn log_token_usage<S>(source: &S)
where
    S: RunSource + fmt::Debug + ?Sized,
{
    for counter in UsageCounter::ALL {
        let count = token_count(Some(source), counter);
        log::info!(
            "{}: {}",
            counter.name(),
            count.map_or_else(|| "None".to_string(), |count| count.to_string())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistants::runs::RunStatus;

    fn run_with(usage: Option<Usage>) -> Option<Run> {
        Some(Run {
            id: "run_1".to_string(),
            object: "thread.run".to_string(),
            created_at: 1,
            assistant_id: "asst_1".to_string(),
            thread_id: "thread_1".to_string(),
            status: RunStatus::Completed,
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

    #[test]
    fn full_chain_returns_leaf() {
        let source = run_with(Some(Usage {
            prompt_tokens: 120,
            completion_tokens: 0,
            total_tokens: 120,
        }));
        assert_eq!(resolve_usage(&source, UsageCounter::PromptTokens), Ok(120));
        assert_eq!(token_count(Some(&source), UsageCounter::TotalTokens), Some(120));
        assert_eq!(
            token_count(Some(&source), UsageCounter::CompletionTokens),
            Some(0)
        );
    }

    #[test]
    fn missing_link_is_named() {
        let no_usage = run_with(None);
        assert_eq!(
            resolve_usage(&no_usage, UsageCounter::CompletionTokens),
            Err(MissingAttribute("usage"))
        );
        assert_eq!(token_count(Some(&no_usage), UsageCounter::CompletionTokens), None);

        let no_run: Option<Run> = None;
        assert_eq!(
            resolve_usage(&no_run, UsageCounter::TotalTokens),
            Err(MissingAttribute("current_run"))
        );
    }

    #[test]
    fn absent_source_yields_none() {
        assert_eq!(token_count::<Option<Run>>(None, UsageCounter::TotalTokens), None);
    }

    mod capture {
        use std::{
            sync::{Mutex, OnceLock},
            thread::{self, ThreadId},
        };

        use log::{Level, Log, Metadata, Record};

        struct CapturingLogger {
            records: Mutex<Vec<(ThreadId, Level, String)>>,
        }

        impl Log for CapturingLogger {
            fn enabled(&self, _: &Metadata) -> bool {
                true
            }

            fn log(&self, record: &Record) {
                self.records.lock().unwrap().push((
                    thread::current().id(),
                    record.level(),
                    record.args().to_string(),
                ));
            }

            fn flush(&self) {}
        }

        static LOGGER: CapturingLogger = CapturingLogger {
            records: Mutex::new(Vec::new()),
        };

        fn logger() -> &'static CapturingLogger {
            static INSTALLED: OnceLock<()> = OnceLock::new();
            INSTALLED.get_or_init(|| {
                log::set_logger(&LOGGER).unwrap();
                log::set_max_level(log::LevelFilter::Trace);
            });
            &LOGGER
        }

        /// Runs `f` and returns the records it logged on this thread.
        pub fn logged<F: FnOnce()>(f: F) -> Vec<(Level, String)> {
            let logger = logger();
            let id = thread::current().id();
            let start = logger.records.lock().unwrap().len();
            f();
            logger.records.lock().unwrap()[start..]
                .iter()
                .filter(|(thread, _, _)| *thread == id)
                .map(|(_, level, message)| (*level, message.clone()))
                .collect()
        }
    }

    #[test]
    fn missing_link_is_logged_once_at_error() {
        let no_usage = run_with(None);
        let records = capture::logged(|| {
            assert_eq!(token_count(Some(&no_usage), UsageCounter::PromptTokens), None);
        });

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, log::Level::Error);
        assert!(records[0].1.contains("Attribute not found: usage"));
    }

    #[test]
    fn absent_source_logs_nothing() {
        let records = capture::logged(|| {
            assert_eq!(token_count::<Option<Run>>(None, UsageCounter::TotalTokens), None);
        });
        assert!(records.is_empty());
    }

    #[test]
    fn counter_names() {
        let names: Vec<_> = UsageCounter::ALL.iter().map(UsageCounter::name).collect();
        assert_eq!(names, ["completion_tokens", "prompt_tokens", "total_tokens"]);
    }
}
