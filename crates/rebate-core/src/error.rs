use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RebateError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing field: {field} (looked for {})", .aliases.join(", "))]
    MissingField { field: String, aliases: Vec<String> },

    #[error("Malformed number in {field}: '{value}' treated as 0")]
    MalformedNumber { field: String, value: String },

    #[error("Arithmetic overflow computing {field}; treated as 0")]
    Overflow { field: String },

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}
