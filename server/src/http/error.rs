// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Maps `CoreError` (the typed taxonomy every component boundary returns,
//! common::error) onto an HTTP status and a `{status:"error", message}`
//! body exactly once, at the transport edge (spec.md §7). A local newtype
//! is required here rather than `impl ResponseError for CoreError` directly
//! because neither `CoreError` nor `ResponseError` is defined in this
//! crate.

use actix_web::cookie::Cookie;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use common::error::CoreError;
use serde::Serialize;
use std::fmt;

/// The cookie names to clear if `self.0` turns out to be one of
/// `clears_cookies()`'s variants (spec.md §7). Only [`crate::http::authenticate`]
/// populates this; every other `From<CoreError>` conversion leaves it `None`,
/// since most call sites never had a cookie jar in scope to begin with.
pub struct ApiError(pub CoreError, pub Option<(String, String)>);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e, None)
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    kind: &'static str,
    message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            CoreError::AuthMissing | CoreError::AuthInvalid | CoreError::AuthExpired => {
                StatusCode::UNAUTHORIZED
            }
            CoreError::PermissionDenied => StatusCode::FORBIDDEN,
            CoreError::Validation(_) | CoreError::Conflict(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if self.0.clears_cookies() {
            if let Some((access_name, refresh_name)) = &self.1 {
                for name in [access_name.clone(), refresh_name.clone()] {
                    let mut cookie = Cookie::new(name, "");
                    cookie.set_path("/");
                    cookie.set_max_age(actix_web::cookie::time::Duration::ZERO);
                    builder.cookie(cookie);
                }
            }
        }
        builder.json(ErrorBody {
            status: "error",
            kind: self.0.kind_tag(),
            message: self.0.to_string(),
        })
    }
}
