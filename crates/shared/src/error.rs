use thiserror::Error;

/// Local form-validation failure. Never reaches the network; the messages
/// are fixed and shown to the user verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields, including location.")]
    MissingField,
    #[error("Nutrient values must be nonnegative numbers.")]
    InvalidNumber,
}
