//! JSON Schema builder for function parameters.

use serde::Serialize;
use serde_json::{json, Map, Value};

/// An object schema describing a function's named arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolParameters(Value);

impl ToolParameters {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Names listed under `required`, in declaration order.
    pub fn required(&self) -> Vec<&str> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Builder for `{"type": "object", ...}` parameter schemas.
#[derive(Debug, Default)]
pub struct ToolParametersBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
    additional_properties: Option<bool>,
}

impl ToolParametersBuilder {
    pub fn new_object() -> Self {
        Self::default()
    }

    pub fn add_string(mut self, name: &str, description: Option<&str>) -> Self {
        self.properties.insert(name.to_string(), with_description(json!({"type": "string"}), description));
        self
    }

    pub fn add_string_enum(mut self, name: &str, description: Option<&str>, values: &[&str]) -> Self {
        let schema = json!({"type": "string", "enum": values});
        self.properties.insert(name.to_string(), with_description(schema, description));
        self
    }

    pub fn add_integer(mut self, name: &str, description: Option<&str>, min: Option<i64>, max: Option<i64>) -> Self {
        let mut schema = json!({"type": "integer"});
        if let Some(min) = min {
            schema["minimum"] = json!(min);
        }
        if let Some(max) = max {
            schema["maximum"] = json!(max);
        }
        self.properties.insert(name.to_string(), with_description(schema, description));
        self
    }

    pub fn add_integer_unbounded(self, name: &str, description: Option<&str>) -> Self {
        self.add_integer(name, description, None, None)
    }

    /// Mark a property as required. Repeated names are ignored.
    pub fn required(mut self, name: &str) -> Self {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = Some(allowed);
        self
    }

    pub fn build(self) -> ToolParameters {
        let mut schema = json!({
            "type": "object",
            "properties": Value::Object(self.properties),
            "required": self.required,
        });
        if let Some(allowed) = self.additional_properties {
            schema["additionalProperties"] = json!(allowed);
        }
        ToolParameters(schema)
    }
}

fn with_description(mut schema: Value, description: Option<&str>) -> Value {
    if let Some(d) = description {
        schema["description"] = json!(d);
    }
    schema
}
