use std::collections::HashMap;

use crate::error::RegistryError;

use super::{FunctionSignature, ToolDefinition};

/// Catalog of callable functions, keyed by unique name.
///
/// Built once at startup and shared read-only (`Arc<ToolRegistry>`) between
/// sessions; registration order is the advertisement order.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A name that is already taken is rejected and the first
    /// registration is kept.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<&mut Self, RegistryError> {
        if self.index.contains_key(tool.name()) {
            return Err(RegistryError::DuplicateName(tool.name().to_string()));
        }
        self.index.insert(tool.name().to_string(), self.tools.len());
        self.tools.push(tool);
        Ok(self)
    }

    pub fn resolve(&self, name: &str) -> Result<&ToolDefinition, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| RegistryError::UnknownFunction(name.to_string()))
    }

    pub fn signatures(&self) -> Vec<FunctionSignature> {
        self.tools.iter().map(|t| t.signature().clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolDefinition::name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
