//! Unified error handling for slservd.
//!
//! One taxonomy covers every validation failure a registry or the live
//! state can report. The service command layer turns these into exactly
//! one user-facing notice per rejected command; the core itself never
//! formats user-facing text.

use thiserror::Error;

/// Errors returned by registry and state operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("no such entry: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The entity is administratively blocked (a stronger PermissionDenied).
    #[error("entry is forbidden: {0}")]
    Forbidden(String),

    #[error("permission denied")]
    PermissionDenied,

    /// Wrong password. Distinct from any I/O failure while verifying it.
    #[error("bad credential")]
    BadCredential,

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(i64),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Services are running read-only; mutations are refused.
    #[error("services are in read-only mode")]
    ReadOnly,

    /// A structural invariant was about to be violated. Recovered
    /// locally: skip the offending mutation, log, continue degraded.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}

impl ServiceError {
    /// Static code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::Forbidden(_) => "forbidden",
            Self::PermissionDenied => "permission_denied",
            Self::BadCredential => "bad_credential",
            Self::RateLimited(_) => "rate_limited",
            Self::CapacityExceeded(_) => "capacity_exceeded",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::ReadOnly => "read_only",
            Self::Inconsistent(_) => "inconsistent",
        }
    }
}

/// Result type for registry and state operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ServiceError::NotFound("alice".into()).error_code(),
            "not_found"
        );
        assert_eq!(ServiceError::BadCredential.error_code(), "bad_credential");
        assert_eq!(ServiceError::ReadOnly.error_code(), "read_only");
    }
}
