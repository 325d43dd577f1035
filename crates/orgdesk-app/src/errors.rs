// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOperation {
    Create,
    Update,
}

impl SubmitOperation {
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// What a screen shows when a remote call fails. Transport and status
/// detail is logged where the failure happens and never carried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("No authentication token found")]
    AuthenticationMissing,
    #[error("Session expired -- sign in again")]
    SessionExpired,
    #[error("Failed to fetch {} data", .0.as_str())]
    FetchFailed(EntityKind),
    #[error("Failed to {} {}", .operation.verb(), .kind.as_str())]
    SubmitFailed {
        kind: EntityKind,
        operation: SubmitOperation,
    },
    #[error("Failed to delete {}", .0.as_str())]
    DeleteFailed(EntityKind),
    #[error("Sign in failed -- check username and password")]
    SignInFailed,
    #[error("Access denied")]
    PermissionDenied,
}

impl RequestError {
    /// Whether the failure should move the user off the current screen.
    pub const fn redirects(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    pub const fn needs_sign_in(&self) -> bool {
        matches!(self, Self::AuthenticationMissing | Self::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::{RequestError, SubmitOperation};
    use crate::EntityKind;

    #[test]
    fn messages_name_the_entity() {
        assert_eq!(
            RequestError::FetchFailed(EntityKind::Branch).to_string(),
            "Failed to fetch branch data"
        );
        assert_eq!(
            RequestError::SubmitFailed {
                kind: EntityKind::Branch,
                operation: SubmitOperation::Create,
            }
            .to_string(),
            "Failed to create branch"
        );
        assert_eq!(
            RequestError::AuthenticationMissing.to_string(),
            "No authentication token found"
        );
    }

    #[test]
    fn only_permission_denied_redirects() {
        assert!(RequestError::PermissionDenied.redirects());
        assert!(!RequestError::FetchFailed(EntityKind::Role).redirects());
        assert!(RequestError::SessionExpired.needs_sign_in());
    }
}
