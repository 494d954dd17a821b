//! Structured failure body shared by HTTP errors and connection admission

use serde::{Deserialize, Serialize};

pub const UNAUTHORIZED_DETAIL: &str = "Unauthorized.";
pub const INVALID_QUERY_PARAMS_DETAIL: &str = "Invalid query params.";

/// `{ "detail": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(UNAUTHORIZED_DETAIL)
    }

    pub fn invalid_query_params() -> Self {
        Self::new(INVALID_QUERY_PARAMS_DETAIL)
    }
}

/// Liveness response for `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_bodies() {
        assert_eq!(
            serde_json::to_string(&ErrorBody::unauthorized()).unwrap(),
            r#"{"detail":"Unauthorized."}"#
        );
        assert_eq!(
            serde_json::to_string(&ErrorBody::invalid_query_params()).unwrap(),
            r#"{"detail":"Invalid query params."}"#
        );
    }
}
