//! Functions offered to the model by the personal-profile chatbot.
//!
//! Both tools push a notification and report `{"recorded": "ok"}`.

use std::sync::Arc;

use color_eyre::eyre::eyre;
use serde_json::{json, Value};

use crate::error::RegistryError;
use crate::notify::Notifier;

use super::{ToolDefinition, ToolParametersBuilder, ToolRegistry};

pub const RECORD_USER_DETAILS: &str = "record_user_details";
pub const RECORD_UNKNOWN_QUESTION: &str = "record_unknown_question";

pub fn build_record_user_details_tool(notifier: Arc<dyn Notifier>) -> ToolDefinition {
    let params = ToolParametersBuilder::new_object()
        .add_string("email", Some("The email address of this user"))
        .add_string("name", Some("The user's name, if they provided it"))
        .add_string(
            "notes",
            Some("Any additional information about the conversation that's worth recording to give context"),
        )
        .required("email")
        .additional_properties(false)
        .build();

    ToolDefinition::new(
        RECORD_USER_DETAILS,
        "Use this tool to record that a user is interested in being in touch and provided an email address",
        params,
        Arc::new(move |args: &Value| {
            let email = required_str(args, "email")?;
            let name = optional_str(args, "name").unwrap_or("Name not provided");
            let notes = optional_str(args, "notes").unwrap_or("not provided");
            notifier.notify(&format!("Recording interest from {name} with email {email} and notes {notes}"));
            Ok(json!({ "recorded": "ok" }))
        }),
    )
}

pub fn build_record_unknown_question_tool(notifier: Arc<dyn Notifier>) -> ToolDefinition {
    let params = ToolParametersBuilder::new_object()
        .add_string("question", Some("The question that couldn't be answered"))
        .required("question")
        .additional_properties(false)
        .build();

    ToolDefinition::new(
        RECORD_UNKNOWN_QUESTION,
        "Always use this tool to record any question that couldn't be answered as you didn't know the answer",
        params,
        Arc::new(move |args: &Value| {
            let question = required_str(args, "question")?;
            notifier.notify(&format!("Recording {question} asked that I couldn't answer"));
            Ok(json!({ "recorded": "ok" }))
        }),
    )
}

/// Registry holding both profile tools, in advertisement order.
pub fn profile_registry(notifier: Arc<dyn Notifier>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(build_record_user_details_tool(Arc::clone(&notifier)))?;
    registry.register(build_record_unknown_question_tool(notifier))?;
    Ok(registry)
}

fn required_str<'a>(args: &'a Value, key: &str) -> color_eyre::Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| eyre!("missing required string: '{key}'"))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}
