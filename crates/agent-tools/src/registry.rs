//! Tool registry for managing available tools

use crate::{ParameterSchema, Tool};
use agent_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A registered tool with its schema captured at registration time
#[derive(Clone)]
pub struct ToolSpec {
    name: String,
    description: String,
    schema: ParameterSchema,
    tool: Arc<dyn Tool>,
}

impl ToolSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    /// The bound executable
    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Registry mapping tool names to executables
///
/// Registration happens at setup time through `&mut self`; once wrapped in an
/// `Arc` the registry is read-only.
#[derive(Default, Clone, Debug)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolSpec>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// Fails with `DuplicateTool` if the name is taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }

        debug!(tool_name = %name, "Registering tool");
        let spec = ToolSpec {
            name: name.clone(),
            description: tool.description().to_string(),
            schema: tool.parameters(),
            tool,
        };
        self.tools.insert(name, spec);
        Ok(())
    }

    /// Resolve a tool by exact name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.spec(name).map(|spec| Arc::clone(&spec.tool))
    }

    /// Declared parameter schema of a tool
    pub fn schema_for(&self, name: &str) -> Result<&ParameterSchema> {
        self.spec(name).map(|spec| &spec.schema)
    }

    /// Full spec of a tool
    pub fn spec(&self, name: &str) -> Result<&ToolSpec> {
        self.tools
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))
    }

    /// All specs in name order
    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Build a registry that exposes only the named tools
    pub fn subset(&self, names: &[&str]) -> Result<ToolRegistry> {
        let mut tools = BTreeMap::new();
        for name in names {
            let spec = self.spec(name)?;
            tools.insert(spec.name.clone(), spec.clone());
        }
        Ok(ToolRegistry { tools })
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
