// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared error taxonomy. Components return one of these kinds rather than
//! an HTTP status directly; the HTTP and WebSocket layers each map a kind to
//! their own transport-level representation.

use serde::Serialize;
use thiserror::Error;

/// A conflict sub-kind, kept distinct from the outer [`CoreError`] so callers
/// can match on the exact reason without string comparison.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    AlreadyInGame,
    AlreadyQueued,
    AlreadyPendingRequest,
    Blocked,
    OpponentOffline,
    SelfAction,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("authentication cookie missing")]
    AuthMissing,
    #[error("authentication token invalid")]
    AuthInvalid,
    #[error("authentication token expired")]
    AuthExpired,
    #[error("permission denied")]
    PermissionDenied,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(ConflictKind),
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// A machine-readable tag for the `{status:"error", message}` HTTP body
    /// and for logging; intentionally coarser than [`std::fmt::Display`].
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Self::AuthMissing => "AUTH_MISSING",
            Self::AuthInvalid => "AUTH_INVALID",
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::Validation(_) => "VALIDATION",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether cookies must be cleared when this error terminates a request.
    /// Only `AUTH_INVALID`/`AUTH_EXPIRED` do; `AUTH_MISSING` has no cookies
    /// to clear and a bare refresh attempt is handled upstream of this error.
    pub fn clears_cookies(&self) -> bool {
        matches!(self, Self::AuthInvalid | Self::AuthExpired)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
