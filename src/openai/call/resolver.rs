use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::openai::history::{FunctionCallRequest, FunctionCallResult};
use crate::openai::tools::ToolRegistry;

use super::types::ToolResolution;

/// Runs batches of function calls against a registry.
///
/// Dispatch is sequential and order preserving. A failing call yields an
/// error-shaped result for that call only; siblings still run.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// `result[i]` always answers `requests[i]`.
    #[instrument(name = "dispatch", skip_all, fields(batch = requests.len()))]
    pub fn dispatch(&self, requests: &[FunctionCallRequest]) -> Vec<FunctionCallResult> {
        requests
            .iter()
            .map(|request| {
                info!(target: "dispatch", tool = %request.name, call_id = %request.id, "tool called");
                let resolution = resolve_and_execute_tool_call(request, &self.registry);
                if resolution.is_executed() {
                    debug!(target: "dispatch", resolution = %resolution, "tool_resolution");
                } else {
                    warn!(target: "dispatch", resolution = %resolution, "tool call failed");
                }
                resolution.into_result(request.id.clone())
            })
            .collect()
    }
}

/// Resolve one request against the registry, decode its arguments and run
/// the handler. Never panics and never returns early for the batch.
pub fn resolve_and_execute_tool_call(request: &FunctionCallRequest, registry: &ToolRegistry) -> ToolResolution {
    let tool = match registry.resolve(&request.name) {
        Ok(t) => t,
        Err(_) => return ToolResolution::ToolNotFound { requested: request.name.clone() },
    };

    let args = match decode_arguments(&request.arguments) {
        Ok(v) => v,
        Err(error) => {
            return ToolResolution::ArgumentsParseError {
                name: tool.name().to_string(),
                raw: request.arguments.clone(),
                error,
            };
        }
    };

    match catch_unwind(AssertUnwindSafe(|| tool.execute(&args))) {
        Ok(Ok(result)) => ToolResolution::Executed { name: tool.name().to_string(), result },
        Ok(Err(e)) => ToolResolution::ExecutionError { name: tool.name().to_string(), error: e.to_string() },
        Err(panic) => ToolResolution::ExecutionError {
            name: tool.name().to_string(),
            error: panic_message(panic.as_ref()),
        },
    }
}

/// Arguments must be a JSON object; a blank string means "no arguments".
fn decode_arguments(raw: &str) -> Result<Value, String> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ Value::Object(_)) => Ok(v),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}
