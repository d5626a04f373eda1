//! Tool definitions advertised to the reasoning backend

use agent_tools::{ToolRegistry, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition for LLM provider
///
/// This describes a tool that the backend can use, including its name,
/// description, and input schema in JSON Schema format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the tool in ToolRegistry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

impl From<&ToolSpec> for ToolDefinition {
    fn from(spec: &ToolSpec) -> Self {
        Self::new(
            spec.name(),
            spec.description(),
            spec.schema().to_json_schema(),
        )
    }
}

/// Definitions for every tool in a registry, in name order
pub fn definitions(registry: &ToolRegistry) -> Vec<ToolDefinition> {
    registry.specs().map(ToolDefinition::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::Result;
    use agent_tools::{ParamType, ParameterSchema, Tool};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct SearchTool;

    #[async_trait]
    impl Tool for SearchTool {
        async fn execute(&self, _arguments: Value) -> Result<Value> {
            Ok(json!([]))
        }

        fn name(&self) -> &str {
            "search_news"
        }

        fn description(&self) -> &str {
            "Search recent news"
        }

        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::new().required("query", ParamType::String, "Search query")
        }
    }

    #[test]
    fn test_definitions_from_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SearchTool)).unwrap();

        let defs = definitions(&registry);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "search_news");
        assert_eq!(defs[0].description, "Search recent news");
        assert_eq!(defs[0].input_schema["required"], json!(["query"]));
    }
}
