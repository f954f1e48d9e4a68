use thiserror::Error;

/// Common error types for the scanner.
///
/// The engine core itself never fails; these errors surface at the edges,
/// when loading configuration or wiring the process together.
#[derive(Error, Debug, PartialEq)]
pub enum ScannerError {
    /// Represents an error during I/O operations.
    #[error("I/O error: {0}")]
    Io(String),

    /// Represents an error during data parsing or deserialization.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Represents an invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
