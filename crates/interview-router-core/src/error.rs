//! Error types for the interview router
//!
//! Separates caller-input failures (empty or unknown simulation ids) from
//! configuration and loading failures. Probe failures are not represented
//! here: they are absorbed by the health monitor and never reach a caller.

use thiserror::Error;

/// Main error type for router operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Missing or empty simulation identifier
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No simulation is configured under the requested identifier
    #[error("Simulation not found: {0}")]
    SimulationNotFound(String),

    /// Settings failed validation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// File access or I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Settings file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RouterError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        RouterError::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        RouterError::Configuration(msg.into())
    }

    /// Check if this error was caused by the caller's request
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RouterError::InvalidInput(_) | RouterError::SimulationNotFound(_)
        )
    }
}

impl From<std::io::Error> for RouterError {
    fn from(err: std::io::Error) -> Self {
        RouterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        RouterError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for RouterError {
    fn from(err: serde_yaml::Error) -> Self {
        RouterError::Parse(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for RouterError {
    fn from(err: toml::de::Error) -> Self {
        RouterError::Parse(format!("TOML error: {}", err))
    }
}

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouterError::SimulationNotFound("sim-42".to_string());
        assert_eq!(err.to_string(), "Simulation not found: sim-42");

        let err = RouterError::invalid_input("simulationId is required");
        assert_eq!(err.to_string(), "Invalid input: simulationId is required");
    }

    #[test]
    fn test_is_user_error() {
        assert!(RouterError::InvalidInput("x".to_string()).is_user_error());
        assert!(RouterError::SimulationNotFound("x".to_string()).is_user_error());
        assert!(!RouterError::Configuration("x".to_string()).is_user_error());
        assert!(!RouterError::Io("x".to_string()).is_user_error());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RouterError = io.into();
        assert!(matches!(err, RouterError::Io(_)));
    }
}
