use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PvFinanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PvFinanceError {
    fn from(e: serde_json::Error) -> Self {
        PvFinanceError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for PvFinanceError {
    fn from(e: std::io::Error) -> Self {
        PvFinanceError::Io(e.to_string())
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for PvFinanceError {
    fn from(e: csv::Error) -> Self {
        PvFinanceError::Csv(e.to_string())
    }
}
