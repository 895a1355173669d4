use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use profile_chat::notify::Notifier;
use profile_chat::openai::{CompletionClient, CompletionResponse, FunctionCallRequest, FunctionSignature, Turn};
use profile_chat::profile::ProfileContext;
use profile_chat::services::chat_service::ASSISTANT_PROMPT;
use profile_chat::{ChatError, Config, ProfileChatService};
mod common;
use common::{RecordingNotifier, ScriptedClient};

#[ctor::ctor]
fn _init() { common::init(); }

fn profile_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("summary.txt"), "Backend engineer who loves Rust.").unwrap();
    fs::write(dir.path().join("linkedin.txt"), "Experience: ten years of distributed systems.").unwrap();
    dir
}

fn config() -> Config {
    Config { profile_name: "Alex Example".into(), ..Config::new() }
}

#[test]
fn context_loads_from_data_dir() {
    let dir = profile_dir();
    let context = ProfileContext::load(dir.path()).unwrap();
    let prompt = context.system_prompt("Alex Example");

    assert!(prompt.contains("You are acting as Alex Example"));
    assert!(prompt.contains("Backend engineer who loves Rust."));
    assert!(prompt.contains("ten years of distributed systems"));
}

#[test]
fn missing_document_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("summary.txt"), "only a summary").unwrap();

    let err = ProfileContext::load(dir.path()).unwrap_err();
    assert!(matches!(err, ChatError::Configuration(ref m) if m.contains("linkedin.txt")), "{err}");
}

#[tokio::test]
async fn chat_uses_persona_and_records_contact() {
    let dir = profile_dir();
    let context = ProfileContext::load(dir.path()).unwrap();
    let client = ScriptedClient::new(vec![
        Ok(CompletionResponse::calls(vec![FunctionCallRequest::new(
            "c1",
            "record_user_details",
            r#"{"email":"jo@example.com","name":"Jo"}"#,
        )])),
        Ok(CompletionResponse::final_text("Thanks Jo, I'll be in touch.")),
    ]);
    let notifier = RecordingNotifier::new();
    let service = ProfileChatService::with_parts(config(), &context, client.clone(), notifier.clone()).unwrap();

    let history = vec![Turn::user("Hello"), Turn::assistant("Hi! How can I help?")];
    let answer = service.chat("Reach me at jo@example.com", &history).await.unwrap();

    assert_eq!(answer, "Thanks Jo, I'll be in touch.");
    let first = &client.calls()[0];
    assert!(first.transcript[0].text().unwrap().contains("Alex Example"));
    assert_eq!(first.transcript.len(), 4);
    assert_eq!(
        notifier.sent(),
        vec!["Recording interest from Jo with email jo@example.com and notes not provided"]
    );
}

#[tokio::test]
async fn empty_message_is_rejected_before_any_remote_call() {
    let client = ScriptedClient::new(vec![]);
    let service = ProfileChatService::with_parts(
        config(),
        &ProfileContext::new("s", "l"),
        client.clone(),
        RecordingNotifier::new(),
    )
    .unwrap();

    let err = service.chat("   ", &[]).await.unwrap_err();

    assert!(matches!(err, ChatError::InvalidRequest(_)));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn ask_skips_persona_and_tools() {
    let client = ScriptedClient::new(vec![Ok(CompletionResponse::final_text("4"))]);
    let service =
        ProfileChatService::with_parts(config(), &ProfileContext::new("s", "l"), client.clone(), RecordingNotifier::new())
            .unwrap();

    assert_eq!(service.ask("2+2?").await.unwrap(), "4");

    let seen = &client.calls()[0];
    assert_eq!(seen.transcript, vec![Turn::system(ASSISTANT_PROMPT), Turn::user("2+2?")]);
    assert!(seen.function_names.is_empty());
}

/// Replies with the user prompt upper-cased; "fail" yields a transport error.
struct EchoClient;

#[async_trait]
impl CompletionClient for EchoClient {
    async fn complete(&self, transcript: &[Turn], _functions: &[FunctionSignature]) -> Result<CompletionResponse, ChatError> {
        let prompt = transcript.last().and_then(Turn::text).unwrap_or_default();
        if prompt == "fail" {
            return Err(ChatError::Transport("simulated outage".into()));
        }
        // later prompts finish first
        tokio::time::sleep(Duration::from_millis(40 - 10 * prompt.len().min(4) as u64)).await;
        Ok(CompletionResponse::final_text(prompt.to_uppercase()))
    }
}

#[tokio::test]
async fn ask_many_keeps_prompt_order() {
    let service = ProfileChatService::with_parts(
        config(),
        &ProfileContext::new("s", "l"),
        Arc::new(EchoClient),
        RecordingNotifier::new(),
    )
    .unwrap();

    let prompts: Vec<String> = vec!["a".into(), "bb".into(), "fail".into(), "ccc".into()];
    let results = service.ask_many(&prompts).await;

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_deref().unwrap(), "A");
    assert_eq!(results[1].as_deref().unwrap(), "BB");
    assert!(matches!(results[2], Err(ChatError::Transport(_))));
    assert_eq!(results[3].as_deref().unwrap(), "CCC");
}

/// Notifier whose deliveries never finish.
#[derive(Default)]
struct StuckNotifier {
    in_flight: AtomicUsize,
}

impl Notifier for StuckNotifier {
    fn notify(&self, _message: &str) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    fn pending(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn drain_reports_notifications_left_behind() {
    let client = ScriptedClient::new(vec![
        Ok(CompletionResponse::calls(vec![FunctionCallRequest::new(
            "c1",
            "record_unknown_question",
            r#"{"question":"Favourite food?"}"#,
        )])),
        Ok(CompletionResponse::final_text("Not sure!")),
    ]);
    let service = ProfileChatService::with_parts(
        config(),
        &ProfileContext::new("s", "l"),
        client,
        Arc::new(StuckNotifier::default()),
    )
    .unwrap();

    service.chat("What's your favourite food?", &[]).await.unwrap();

    assert_eq!(service.drain_notifications(Duration::from_millis(60)).await, 1);
}

#[tokio::test]
async fn drain_returns_immediately_when_nothing_is_pending() {
    let service = ProfileChatService::with_parts(
        config(),
        &ProfileContext::new("s", "l"),
        ScriptedClient::new(vec![]),
        RecordingNotifier::new(),
    )
    .unwrap();

    assert_eq!(service.drain_notifications(Duration::from_secs(5)).await, 0);
}
