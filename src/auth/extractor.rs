// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for verified callers.
//!
//! Use `Auth` in handlers that sit behind the credential interceptor:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity.principal, identity.keys
//! }
//! ```
//!
//! Use `CapabilityToken` in endpoints reached through signed URLs:
//!
//! ```rust,ignore
//! async fn download(CapabilityToken(capability): CapabilityToken) -> impl IntoResponse {
//!     // capability.subject, capability.context
//! }
//! ```

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::middleware::RequestIdentity;
use super::signed_url::TOKEN_QUERY_PARAM;
use super::token::VerifiedCapability;
use super::AuthError;
use crate::state::AppState;

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Path the request was originally sent to, before any router nesting.
pub fn request_path(parts: &Parts) -> String {
    parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

/// Identity admitted by the credential interceptor.
pub struct Auth(pub RequestIdentity);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| AuthError::InternalError("credential interceptor not applied".into()))
    }
}

/// Capability token from the `token` query parameter (or a bearer header),
/// verified with the request's own path as audience.
pub struct CapabilityToken(pub VerifiedCapability);

impl FromRequestParts<AppState> for CapabilityToken {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let from_query = parts.uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == TOKEN_QUERY_PARAM)
                .map(|(_, value)| value.into_owned())
        });

        let token = match from_query {
            Some(token) => token,
            None => match bearer_token(&parts.headers) {
                Ok(token) => token.to_string(),
                Err(AuthError::MissingAuthHeader) => return Err(AuthError::MissingToken),
                Err(e) => return Err(e),
            },
        };

        let path = request_path(parts);
        state.tokens.verify(&token, &path).map(CapabilityToken)
    }
}
