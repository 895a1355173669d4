//! ProfileChatService
//!
//! Wires configuration, profile context, notifier, tools and the remote
//! client into a ready-to-use conversation loop. UI layers call `chat` once
//! per user message and keep nothing but the history they pass back in.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::config::{Config, Credentials};
use crate::error::ChatError;
use crate::notify::{notifier_from_credentials, Notifier};
use crate::openai::{
    ask_once, profile_registry, CompletionClient, ConversationLoop, OpenAiCompletionClient, ToolRegistry, Turn,
};
use crate::profile::ProfileContext;

/// System prompt used for tool-less one-shot questions.
pub const ASSISTANT_PROMPT: &str = "You are a helpful assistant.";

pub struct ProfileChatService {
    config: Config,
    client: Arc<dyn CompletionClient>,
    notifier: Arc<dyn Notifier>,
    conversation: ConversationLoop,
}

impl std::fmt::Debug for ProfileChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileChatService")
            .field("config", &self.config)
            .field("conversation", &self.conversation)
            .finish_non_exhaustive()
    }
}

impl ProfileChatService {
    /// Production wiring: profile documents from `config.data_dir`, Pushover
    /// (or log-only) notifications, and the OpenAI client.
    pub fn from_config(config: Config, credentials: &Credentials) -> Result<Self, ChatError> {
        let context = ProfileContext::load(&config.data_dir)?;
        let notifier = notifier_from_credentials(credentials);
        let client: Arc<dyn CompletionClient> = Arc::new(OpenAiCompletionClient::new(credentials, config.clone()));
        Self::with_parts(config, &context, client, notifier)
    }

    /// Assemble from explicit collaborators (tests, alternative providers).
    pub fn with_parts(
        config: Config,
        context: &ProfileContext,
        client: Arc<dyn CompletionClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ChatError> {
        let registry: Arc<ToolRegistry> = Arc::new(profile_registry(Arc::clone(&notifier))?);
        let system_prompt = context.system_prompt(&config.profile_name);
        let conversation = ConversationLoop::new(Arc::clone(&client), registry, system_prompt, config.max_rounds)?;
        info!(target: "chat", name = %config.profile_name, model = %config.model, "initialized profile chat service");
        Ok(Self { config, client, notifier, conversation })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn conversation(&self) -> &ConversationLoop {
        &self.conversation
    }

    /// One user turn: `message` on top of the caller's `history`.
    #[instrument(name = "profile_chat", skip(self, history), fields(history_len = history.len()))]
    pub async fn chat(&self, message: &str, history: &[Turn]) -> Result<String, ChatError> {
        self.conversation.chat(message, history).await
    }

    /// Wait up to `timeout` for in-flight notifications. Returns how many were
    /// still pending when it gave up; those are dropped at process exit.
    pub async fn drain_notifications(&self, timeout: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.notifier.pending() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        let left = self.notifier.pending();
        if left > 0 {
            warn!(target: "notify", left, "notifications still pending at shutdown");
        }
        left
    }

    /// Ask a single question without tools or persona.
    pub async fn ask(&self, prompt: &str) -> Result<String, ChatError> {
        ask_once(self.client.as_ref(), ASSISTANT_PROMPT, prompt).await
    }

    /// Run independent one-shot prompts concurrently. Results come back in
    /// prompt order; one failure does not affect the others.
    pub async fn ask_many(&self, prompts: &[String]) -> Vec<Result<String, ChatError>> {
        let mut set = JoinSet::new();
        for (i, prompt) in prompts.iter().enumerate() {
            let client = Arc::clone(&self.client);
            let prompt = prompt.clone();
            set.spawn(async move { (i, ask_once(client.as_ref(), ASSISTANT_PROMPT, &prompt).await) });
        }

        let mut slots: Vec<Option<Result<String, ChatError>>> = prompts.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((i, result)) => slots[i] = Some(result),
                Err(e) => tracing::error!(target: "chat", error = %e, "one-shot task failed to join"),
            }
        }
        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(ChatError::Transport("task aborted".into()))))
            .collect()
    }
}
