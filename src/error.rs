use thiserror::Error;

/// Errors returned by the amortization and rate computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinancingError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Offer has no counter-offer rate to compare against")]
    NoCounterOffer,

    #[error("Numeric overflow while computing {context}")]
    Overflow { context: String },
}

impl FinancingError {
    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        FinancingError::InvalidInput {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn overflow(context: &str) -> Self {
        FinancingError::Overflow {
            context: context.to_string(),
        }
    }
}

pub type FinancingResult<T> = Result<T, FinancingError>;
