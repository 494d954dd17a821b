//! Service layer error types

use thiserror::Error;

use vademecum_domain::DomainError;

use crate::ports::outbound::{ConnectionError, StoreError};

/// Errors that can occur in service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ServiceError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found(),
            Self::Domain(e) => matches!(e, DomainError::NotFound { .. }),
            Self::Connection(_) => false,
        }
    }

    /// Check if this is an authorization error
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Store(e) => e.is_unauthorized(),
            Self::Domain(e) => matches!(e, DomainError::NotOwner { .. }),
            Self::Connection(_) => false,
        }
    }
}
