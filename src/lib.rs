//! Personal-profile chatbot with OpenAI function calling.
//!
//! The core is [`openai::ConversationLoop`]: it sends the transcript to the
//! model, runs any requested functions through the [`openai::ToolDispatcher`],
//! feeds the results back and repeats until the model answers in plain text.

pub mod config;
pub mod error;
pub mod notify;
pub mod openai;
pub mod profile;
pub mod services;

pub use config::{Config, Credentials};
pub use error::{ChatError, RegistryError};
pub use services::ProfileChatService;

// Ensure .env is loaded for tests before anything else runs in the test process.
#[cfg(test)]
#[ctor::ctor]
fn load_dotenv_for_tests() {
    let _ = dotenvy::dotenv();
}
