use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};
use tracing::{debug, info, instrument, warn};

use crate::error::ChatError;
use crate::openai::history::{ConversationHistory, Turn};
use crate::openai::tools::{FunctionSignature, ToolRegistry};

use super::proposer::CompletionClient;
use super::resolver::ToolDispatcher;
use super::types::{ChatOutcome, CompletionResponse, LoopEvent};

/// Tool-calling conversation loop for one chat session.
///
/// Each `chat` call seeds a fresh transcript from the system prompt, the
/// caller's history and the new message, then alternates between the remote
/// model and the dispatcher until the model answers with plain text or the
/// round cap is hit.
pub struct ConversationLoop {
    client: Arc<dyn CompletionClient>,
    dispatcher: ToolDispatcher,
    functions: Vec<FunctionSignature>,
    system_prompt: String,
    max_rounds: usize,
}

impl std::fmt::Debug for ConversationLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationLoop")
            .field("functions", &self.functions.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("system_prompt_len", &self.system_prompt.len())
            .field("max_rounds", &self.max_rounds)
            .finish_non_exhaustive()
    }
}

impl ConversationLoop {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        registry: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
        max_rounds: usize,
    ) -> Result<Self, ChatError> {
        if max_rounds == 0 {
            return Err(ChatError::configuration("max_rounds must be at least 1"));
        }
        let functions = registry.signatures();
        Ok(Self {
            client,
            dispatcher: ToolDispatcher::new(registry),
            functions,
            system_prompt: system_prompt.into(),
            max_rounds,
        })
    }

    pub fn functions(&self) -> &[FunctionSignature] {
        &self.functions
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Answer `message` given the prior `history`.
    pub async fn chat(&self, message: &str, history: &[Turn]) -> Result<String, ChatError> {
        Ok(self.run(message, history).await?.answer)
    }

    /// Like [`chat`](Self::chat), but also returns the full transcript.
    pub async fn run(&self, message: &str, history: &[Turn]) -> Result<ChatOutcome, ChatError> {
        self.run_internal(message, history, None).await
    }

    pub async fn run_with_logger(
        &self,
        message: &str,
        history: &[Turn],
        logger: impl FnMut(&LoopEvent) + Send,
    ) -> Result<ChatOutcome, ChatError> {
        let mut user_logger = logger;
        let mut log_and_forward = |ev: &LoopEvent| {
            debug!(target: "chat", event = %ev, "loop_event");
            user_logger(ev);
        };
        self.run_internal(message, history, Some(&mut log_and_forward)).await
    }

    /// ブロッキング版 (同期): Tokio ランタイムを内部生成
    ///
    /// Must not be called from inside a Tokio runtime; use [`chat`](Self::chat) there.
    pub fn chat_blocking(&self, message: &str, history: &[Turn]) -> Result<String, ChatError> {
        if Handle::try_current().is_ok() {
            return Err(ChatError::InvalidRequest(
                "chat_blocking called from within an async runtime; use chat().await instead".into(),
            ));
        }
        let rt = Runtime::new().map_err(|e| ChatError::configuration(format!("tokio runtime: {e}")))?;
        rt.block_on(self.chat(message, history))
    }

    #[instrument(name = "conversation_loop", skip_all, fields(history_len = history.len(), max_rounds = self.max_rounds))]
    async fn run_internal(
        &self,
        message: &str,
        history: &[Turn],
        mut logger: Option<&mut (dyn FnMut(&LoopEvent) + Send + '_)>,
    ) -> Result<ChatOutcome, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::InvalidRequest("message must not be empty".into()));
        }
        let mut transcript = ConversationHistory::new();
        transcript.add_system(&self.system_prompt);
        transcript.extend(history.iter().cloned());
        transcript.add_user(message);

        for round in 1..=self.max_rounds {
            if let Some(cb) = logger.as_deref_mut() {
                cb(&LoopEvent::RoundStart { round, transcript_len: transcript.len() });
            }
            let response = self.client.complete(transcript.as_slice(), &self.functions).await?;
            if let Some(cb) = logger.as_deref_mut() {
                cb(&LoopEvent::Proposed { round, response: response.clone() });
            }

            match response {
                CompletionResponse::Final { text } => {
                    info!(target: "chat", round, answer_len = text.len(), "final answer");
                    transcript.add_assistant(&text);
                    if let Some(cb) = logger.as_deref_mut() {
                        cb(&LoopEvent::FinalText { round, text: text.clone() });
                    }
                    return Ok(ChatOutcome { answer: text, transcript, rounds: round });
                }
                CompletionResponse::FunctionCalls { content, calls } => {
                    debug!(target: "chat", round, calls = calls.len(), "function call round");
                    let results = self.dispatcher.dispatch(&calls);
                    transcript.add_tool_calls(content, calls);
                    for result in &results {
                        transcript.add_tool_result(result.clone());
                    }
                    if let Some(cb) = logger.as_deref_mut() {
                        cb(&LoopEvent::Dispatched { round, results });
                    }
                }
            }
        }

        warn!(target: "chat", max_rounds = self.max_rounds, "round cap reached without a final answer");
        Err(ChatError::RoundLimitExceeded { max_rounds: self.max_rounds })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::openai::history::{FunctionCallRequest, Role};

    struct Scripted {
        replies: Mutex<VecDeque<Result<CompletionResponse, ChatError>>>,
        seen: Mutex<Vec<usize>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<CompletionResponse, ChatError>>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies.into()), seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl CompletionClient for Scripted {
        async fn complete(
            &self,
            transcript: &[Turn],
            _functions: &[FunctionSignature],
        ) -> Result<CompletionResponse, ChatError> {
            self.seen.lock().unwrap().push(transcript.len());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CompletionResponse::calls(vec![FunctionCallRequest::new("again", "missing", "{}")])))
        }
    }

    fn looped(client: Arc<Scripted>, max_rounds: usize) -> ConversationLoop {
        ConversationLoop::new(client, Arc::new(ToolRegistry::new()), "sys", max_rounds).unwrap()
    }

    #[tokio::test]
    async fn final_answer_on_first_round() {
        let client = Scripted::new(vec![Ok(CompletionResponse::final_text("hello"))]);
        let outcome = looped(client.clone(), 8).run("hi", &[]).await.unwrap();

        assert_eq!(outcome.answer, "hello");
        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.transcript.roles(), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(*client.seen.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn round_cap_stops_endless_function_calls() {
        let client = Scripted::new(vec![]);
        let err = looped(client.clone(), 3).chat("hi", &[]).await.unwrap_err();

        assert!(matches!(err, ChatError::RoundLimitExceeded { max_rounds: 3 }));
        // each round adds one request turn and one result turn
        assert_eq!(*client.seen.lock().unwrap(), vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn transport_error_aborts_the_call() {
        let client = Scripted::new(vec![Err(ChatError::Transport("quota".into()))]);
        let err = looped(client, 8).chat("hi", &[]).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn zero_rounds_rejected_at_construction() {
        let client = Scripted::new(vec![]);
        let err = ConversationLoop::new(client, Arc::new(ToolRegistry::new()), "sys", 0).unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
    }

    #[tokio::test]
    async fn logger_sees_every_round() {
        let client = Scripted::new(vec![
            Ok(CompletionResponse::calls(vec![FunctionCallRequest::new("c1", "missing", "{}")])),
            Ok(CompletionResponse::final_text("done")),
        ]);
        let mut events = Vec::new();
        looped(client, 8)
            .run_with_logger("hi", &[], |ev| events.push(ev.to_string()))
            .await
            .unwrap();

        assert_eq!(events.len(), 6);
        assert!(events[0].starts_with("RoundStart #1"));
        assert!(events[2].starts_with("Dispatched @1"));
        assert!(events[5].starts_with("FinalText @2"));
    }
}
