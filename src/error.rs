use crate::domain::payment::SessionPaymentStatus;
use crate::domain::principal::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketplaceError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Payment gateway error: {0}")]
    GatewayError(String),
    #[error("Invalid checkout session: {0}")]
    InvalidSession(String),
    #[error("Payment not completed: session status is {0}")]
    PaymentNotCompleted(SessionPaymentStatus),
    #[error("Inconsistent state: {0}")]
    Inconsistency(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[cfg(feature = "gateway-stripe")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, MarketplaceError>;

impl MarketplaceError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable name of the variant, used as the `type` of serialized errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated(..) => "Unauthenticated",
            Self::Forbidden(..) => "Forbidden",
            Self::NotFound { .. } => "NotFound",
            Self::Conflict(..) => "Conflict",
            Self::ValidationError(..) => "ValidationError",
            Self::GatewayError(..) => "GatewayError",
            Self::InvalidSession(..) => "InvalidSession",
            Self::PaymentNotCompleted(..) => "PaymentNotCompleted",
            Self::Inconsistency(..) => "Inconsistency",
            Self::StorageError(..) => "StorageError",
            Self::IoError(..) => "IoError",
            Self::JsonError(..) => "JsonError",
            Self::CsvError(..) => "CsvError",
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDbError(..) => "RocksDbError",
            #[cfg(feature = "gateway-stripe")]
            Self::HttpError(..) => "HttpError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = MarketplaceError::not_found("parcel", "abc");
        assert_eq!(err.kind(), "NotFound");
        assert_eq!(err.to_string(), "parcel not found: abc");

        let err = MarketplaceError::from(AuthError::MissingCredential);
        assert_eq!(err.kind(), "Unauthenticated");
    }
}
