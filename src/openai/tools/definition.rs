use std::sync::Arc;

use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use color_eyre::Result;
use serde::Serialize;
use serde_json::Value;

use super::ToolParameters;

/// ランタイムで実行するツール関数の型。
/// Receives the decoded argument object and returns a JSON result.
pub type ToolHandler = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync + 'static>;

/// Declarative description advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSignature {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
    #[serde(skip)]
    pub strict: bool,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: ToolParameters) -> Self {
        Self { name: name.into(), description: description.into(), parameters, strict: false }
    }

    /// OpenAI SDK の `FunctionObject` に変換
    pub fn function_object(&self) -> FunctionObject {
        FunctionObject {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            parameters: Some(self.parameters.as_value().clone()),
            strict: Some(self.strict),
        }
    }

    /// ChatCompletionTool 形式（APIへ渡す vector 用）
    pub fn as_chat_tool(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: self.function_object(),
        }
    }
}

/// Signature plus the local handler that implements it.
#[derive(Clone)]
pub struct ToolDefinition {
    signature: FunctionSignature,
    handler: ToolHandler,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: ToolHandler,
    ) -> Self {
        Self { signature: FunctionSignature::new(name, description, parameters), handler }
    }

    pub fn from_signature(signature: FunctionSignature, handler: ToolHandler) -> Self {
        Self { signature, handler }
    }

    /// strict フラグを設定（OpenAI の strict function 呼び出しモード用）
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.signature.strict = strict;
        self
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    /// ツールを実行
    pub fn execute(&self, args: &Value) -> Result<Value> {
        (self.handler)(args)
    }
}
