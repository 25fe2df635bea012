use miette::Diagnostic;
use thiserror::Error;

/// Core error type for magnetar value construction
#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    /// Negative resource quantity
    #[error("Negative resource quantity: {value}")]
    #[diagnostic(
        code(magnetar::negative_quantity),
        help("Resource quantities must be zero or positive")
    )]
    NegativeQuantity { value: f64 },

    /// Non-finite resource quantity
    #[error("Resource quantity is not finite: {value}")]
    #[diagnostic(
        code(magnetar::not_finite),
        help("Resource quantities must be finite numbers")
    )]
    NotFinite { value: f64 },

    /// Available resources exceed the node total
    #[error("Available resources exceed total capacity")]
    #[diagnostic(
        code(magnetar::available_exceeds_total),
        help("A node's available resources can never exceed its total capacity")
    )]
    AvailableExceedsTotal,
}

/// Result type alias for magnetar core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a NegativeQuantity error
    pub fn negative_quantity(value: f64) -> Self {
        Self::NegativeQuantity { value }
    }

    /// Create a NotFinite error
    pub fn not_finite(value: f64) -> Self {
        Self::NotFinite { value }
    }
}
