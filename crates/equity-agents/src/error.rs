//! Error types for equity analysis

use thiserror::Error;

/// Equity analysis specific errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Failure reported by the agent runtime
    #[error(transparent)]
    Agent(#[from] agent_core::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// A data, news or document collaborator failed
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<agent_utils::ConfigError> for AnalysisError {
    fn from(err: agent_utils::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::unavailable("LSECL", "not listed");
        assert_eq!(err.to_string(), "Data not available for LSECL: not listed");

        let err = AnalysisError::Config("max_peers must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: max_peers must be greater than 0"
        );
    }

    #[test]
    fn test_agent_error_is_transparent() {
        let err: AnalysisError = agent_core::Error::NoSymbolsResolved("hello".into()).into();
        assert_eq!(
            err.to_string(),
            agent_core::Error::NoSymbolsResolved("hello".into()).to_string()
        );
        assert!(matches!(err, AnalysisError::Agent(_)));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AnalysisError = agent_utils::ConfigError {
            key: "EQUITY_MAX_PEERS".into(),
            value: "many".into(),
            reason: "invalid digit found in string".into(),
        }
        .into();
        assert!(matches!(err, AnalysisError::Config(ref m) if m.contains("EQUITY_MAX_PEERS")));
    }
}
