// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::token::IssueError;
use crate::context::{MalformedContextError, UnsupportedProductError};
use crate::credentials::{CredentialNotFound, CredentialScope};

/// Authentication error type.
///
/// Every variant is terminal for the request. Token verification failures
/// share one public response so callers cannot tell which check fired; the
/// precise reason is only logged.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Invalid authorization header format
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// No capability token in the query string or authorization header
    #[error("Capability token is required")]
    MissingToken,
    /// Token is malformed or has a blank subject
    #[error("Token is malformed")]
    MalformedToken,
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,
    /// Token was minted for a different operation
    #[error("Token audience does not match the requested operation")]
    AudienceMismatch,
    /// Embedded context claim is missing or has the wrong shape
    #[error(transparent)]
    MalformedContext(#[from] MalformedContextError),
    /// Host token issuer is invalid
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// Host token audience is not a configured app id
    #[error("Token was issued for an unknown application")]
    UnknownApplication,
    /// A required host credential header is absent
    #[error("Required header '{0}' is not present")]
    MissingCredentialHeader(String),
    /// Host credential cannot be decoded or carries no expiry
    #[error("{0} token is malformed or has no expiration claim")]
    MalformedCredential(CredentialScope),
    /// Host credential is past its expiry
    #[error("{0} token has expired")]
    CredentialExpired(CredentialScope),
    /// Host credential expires within its refresh threshold
    #[error("{0} token expires within its refresh threshold")]
    CredentialNearExpiry(CredentialScope),
    /// No credential cached for the tenant
    #[error(transparent)]
    CredentialNotFound(#[from] CredentialNotFound),
    /// Operation does not support the context's product
    #[error(transparent)]
    UnsupportedProduct(#[from] UnsupportedProductError),
    /// JWKS fetch failed
    #[error("Failed to fetch JWKS: {0}")]
    JwksFetchError(String),
    /// No matching key in JWKS
    #[error("No matching key found in JWKS")]
    NoMatchingKey,
    /// Internal error
    #[error("Internal authentication error: {0}")]
    InternalError(String),
}

impl From<IssueError> for AuthError {
    fn from(error: IssueError) -> Self {
        AuthError::InternalError(error.to_string())
    }
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Whether this is a principal/capability token rejection whose reason
    /// must not be disclosed.
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken
                | AuthError::InvalidSignature
                | AuthError::TokenExpired
                | AuthError::AudienceMismatch
                | AuthError::MalformedContext(_)
                | AuthError::InvalidIssuer
                | AuthError::UnknownApplication
                | AuthError::NoMatchingKey
        )
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::MalformedContext(_) => "malformed_context",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::UnknownApplication => "unknown_application",
            AuthError::MissingCredentialHeader(_) => "missing_credential_header",
            AuthError::MalformedCredential(_) => "malformed_credential",
            AuthError::CredentialExpired(_) => "credential_expired",
            AuthError::CredentialNearExpiry(_) => "credential_near_expiry",
            AuthError::CredentialNotFound(_) => "credential_not_found",
            AuthError::UnsupportedProduct(_) => "unsupported_product",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentialHeader(_) | AuthError::UnsupportedProduct(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::JwksFetchError(_) | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(
            error_code = self.error_code(),
            status = status.as_u16(),
            reason = %self,
            "Request rejected"
        );

        let body = if self.is_token_rejection() {
            AuthErrorBody {
                error: "Unauthorized".to_string(),
                error_code: "unauthorized".to_string(),
            }
        } else {
            AuthErrorBody {
                error: self.to_string(),
                error_code: self.error_code().to_string(),
            }
        };
        (status, Json(body)).into_response()
    }
}
