//! Tool trait definition

use crate::ParameterSchema;
use agent_core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Tools are the only way a reasoning step touches the outside world. Each
/// tool provides a name, a description, and the typed parameters it accepts.
/// Implementations must be safe to call repeatedly with the same arguments,
/// since the runtime does not promise at-most-once invocation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with already-validated arguments
    ///
    /// # Arguments
    ///
    /// * `arguments` - Argument mapping matching `parameters()`
    ///
    /// # Returns
    ///
    /// A structured success payload. Failures should use
    /// `agent_core::Error::ToolExecution` or `InvalidArguments`.
    async fn execute(&self, arguments: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description helps the reasoning backend decide when to use the tool
    fn description(&self) -> &str;

    /// Declared parameters
    fn parameters(&self) -> ParameterSchema;
}

/// Deserialize tool arguments into a typed parameter struct
///
/// Errors map to `InvalidArguments` so they surface as failure observations.
pub fn parse_arguments<T: serde::de::DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| agent_core::Error::invalid_arguments(tool, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Params {
        symbol: String,
        #[serde(default)]
        max_peers: Option<usize>,
    }

    #[test]
    fn test_parse_arguments() {
        let params: Params = parse_arguments("peers", json!({"symbol": "PPL"})).unwrap();
        assert_eq!(params.symbol, "PPL");
        assert_eq!(params.max_peers, None);
    }

    #[test]
    fn test_parse_arguments_error_kind() {
        let err = parse_arguments::<Params>("peers", json!({"max_peers": 3})).unwrap_err();
        assert!(matches!(err, agent_core::Error::InvalidArguments { .. }));
    }
}
