//! Tool invocations and the observations they produce

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A request to run one tool, produced by a reasoning step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Identifier linking the invocation to its observation
    pub id: String,
    /// Tool name, resolved by exact match against a registry
    pub name: String,
    /// Argument mapping (a JSON object)
    pub arguments: Value,
}

impl ToolInvocation {
    /// Create an invocation with a generated id
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: format!("toolu_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }

    /// Create an invocation with an explicit id
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Category of a failed invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The tool name is not registered
    NotFound,
    /// Arguments failed schema validation
    InvalidArguments,
    /// The tool ran and failed
    Execution,
}

/// Typed failure descriptor carried by an observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// JSON form sent back to the reasoning backend
    pub fn to_value(&self) -> Value {
        json!({ "error": self.kind, "message": self.message })
    }
}

impl From<Error> for ToolFailure {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::ToolNotFound(_) => FailureKind::NotFound,
            Error::InvalidArguments { .. } => FailureKind::InvalidArguments,
            _ => FailureKind::Execution,
        };
        let message = match err {
            Error::ToolExecution { message, .. } | Error::InvalidArguments { message, .. } => {
                message
            }
            other => other.to_string(),
        };
        Self { kind, message }
    }
}

/// Result of running one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolObservation {
    /// Id of the invocation this observation answers
    pub invocation_id: String,
    /// Tool name (the merge key)
    pub tool_name: String,
    /// Success payload or failure descriptor
    pub outcome: std::result::Result<Value, ToolFailure>,
}

impl ToolObservation {
    /// Successful observation
    pub fn success(invocation: &ToolInvocation, payload: Value) -> Self {
        Self {
            invocation_id: invocation.id.clone(),
            tool_name: invocation.name.clone(),
            outcome: Ok(payload),
        }
    }

    /// Failed observation
    pub fn failure(invocation: &ToolInvocation, failure: ToolFailure) -> Self {
        Self {
            invocation_id: invocation.id.clone(),
            tool_name: invocation.name.clone(),
            outcome: Err(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Success payload, if any
    pub fn payload(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    /// Failure descriptor, if any
    pub fn failure_info(&self) -> Option<&ToolFailure> {
        self.outcome.as_ref().err()
    }

    /// Content string placed in the conversation
    pub fn content(&self) -> String {
        match &self.outcome {
            Ok(value) => serde_json::to_string(value).unwrap_or_else(|_| value.to_string()),
            Err(failure) => failure.to_value().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ToolInvocation::new("search_news", json!({"query": "OGDC"}));
        let b = ToolInvocation::new("search_news", json!({"query": "OGDC"}));
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("toolu_"));
    }

    #[test]
    fn test_failure_from_error() {
        let failure = ToolFailure::from(Error::ToolNotFound("nope".into()));
        assert_eq!(failure.kind, FailureKind::NotFound);

        let failure = ToolFailure::from(Error::invalid_arguments("dcf", "missing 'years'"));
        assert_eq!(failure.kind, FailureKind::InvalidArguments);
        assert_eq!(failure.message, "missing 'years'");

        let failure = ToolFailure::from(Error::tool("dcf", "negative discount"));
        assert_eq!(failure.kind, FailureKind::Execution);
        assert_eq!(failure.message, "negative discount");
    }

    #[test]
    fn test_observation_content() {
        let invocation = ToolInvocation::with_id("t1", "list_companies", json!({}));
        let ok = ToolObservation::success(&invocation, json!({"count": 2}));
        assert_eq!(ok.content(), r#"{"count":2}"#);

        let err = ToolObservation::failure(
            &invocation,
            ToolFailure::new(FailureKind::Execution, "offline"),
        );
        let value: Value = serde_json::from_str(&err.content()).unwrap();
        assert_eq!(value["error"], "execution");
        assert_eq!(value["message"], "offline");
        assert!(!err.is_success());
    }
}
