use thiserror::Error;

/// Errors produced while bridging accumulated metrics onto the wire.
#[derive(Error, Debug)]
pub enum RelayError {
    /// An internal defect in the reporting path: a metric-kind URN with no
    /// wire-type mapping, or a record the controller could never decode.
    /// Never recoverable.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A metric-kind URN string that is not part of the closed supported set.
    #[error("unknown metric urn: {urn}")]
    UnknownUrn { urn: String },

    /// A gauge observation time outside the representable epoch-millisecond
    /// range. Internally produced timestamps are always valid, so this is a
    /// defect upstream, not input to validate.
    #[error("timestamp outside representable range: {reason}")]
    Timestamp { reason: String },

    /// Metric labels that fail validation (empty transform id or name).
    #[error("invalid metric labels: {0}")]
    InvalidLabels(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error from the legacy report surface.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The reporter's sink rejected a published snapshot.
    #[error("snapshot sink error: {0}")]
    Sink(String),
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Creates a new protocol-violation error
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new sink error
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::Sink(msg.into())
    }

    /// Returns true if this error indicates an internal defect rather than
    /// a condition the caller could meaningfully handle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ProtocolViolation(_) | Self::UnknownUrn { .. } | Self::Timestamp { .. }
        )
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::ProtocolViolation(_) | Self::UnknownUrn { .. } => "protocol",
            Self::Timestamp { .. } => "timestamp",
            Self::InvalidLabels(_) => "validation",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Sink(_) => "sink",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RelayError::protocol("urn without wire type");
        assert_eq!(err.to_string(), "protocol violation: urn without wire type");
        assert_eq!(err.category(), "protocol");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RelayError::UnknownUrn {
            urn: "beam:metric:bogus:v1".to_string()
        }
        .is_fatal());
        assert!(RelayError::Timestamp {
            reason: "before epoch".to_string()
        }
        .is_fatal());
        assert!(!RelayError::config("bad interval").is_fatal());
        assert!(!RelayError::sink("closed").is_fatal());
    }

    #[test]
    fn test_unknown_urn_display() {
        let err = RelayError::UnknownUrn {
            urn: "beam:metric:bogus:v1".to_string(),
        };
        assert_eq!(err.to_string(), "unknown metric urn: beam:metric:bogus:v1");
    }
}
