// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification of the host platform's invocation token.
//!
//! The host signs one token per invocation with a key from its JWKS. The
//! token's audience is the app id, which is the only way to know which
//! product the call came from; the `context` claim names the installation.

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};

use super::claims::{HostClaims, Principal};
use super::error::AuthError;
use super::jwks::JwksManager;
use crate::context::{AppIdentityLookup, Installation, MalformedContextError};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifies host invocation tokens and turns them into principals.
pub struct HostTokenVerifier {
    /// Absent in development setups without a JWKS endpoint
    jwks: Option<JwksManager>,
    /// Expected issuer
    issuer: String,
    /// Accepted audiences (configured app ids)
    audiences: Vec<String>,
    apps: Arc<dyn AppIdentityLookup>,
}

impl HostTokenVerifier {
    pub fn new(
        jwks: Option<JwksManager>,
        issuer: impl Into<String>,
        audiences: Vec<String>,
        apps: Arc<dyn AppIdentityLookup>,
    ) -> Self {
        Self {
            jwks,
            issuer: issuer.into(),
            audiences,
            apps,
        }
    }

    pub fn jwks(&self) -> Option<&JwksManager> {
        self.jwks.as_ref()
    }

    /// Verify a bearer token presented by the host platform.
    pub async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let Some(jwks) = &self.jwks else {
            return self.verify_unsigned(token);
        };

        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let (decoding_key, algorithm) = match &header.kid {
            Some(kid) => jwks.get_decoding_key(kid).await?,
            None => jwks.get_any_decoding_key().await?,
        };

        self.verify_with_key(token, &decoding_key, algorithm)
    }

    /// Verify against a known key.
    pub fn verify_with_key(
        &self,
        token: &str,
        decoding_key: &DecodingKey,
        algorithm: Algorithm,
    ) -> Result<Principal, AuthError> {
        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        if self.audiences.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.audiences);
        }

        let token_data =
            decode::<HostClaims>(token, decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::UnknownApplication,
                _ => AuthError::MalformedToken,
            })?;

        self.principal_from(token_data.claims)
    }

    fn principal_from(&self, claims: HostClaims) -> Result<Principal, AuthError> {
        if claims.sub.trim().is_empty() {
            return Err(AuthError::MalformedToken);
        }

        let product = claims
            .aud
            .as_ref()
            .and_then(|aud| aud.first())
            .and_then(|app_id| self.apps.product_for_app(app_id))
            .ok_or(AuthError::UnknownApplication)?;

        let context = claims
            .context
            .ok_or_else(|| MalformedContextError("host token carries no context".into()))?;

        Ok(Principal::from_host(
            claims.sub,
            Installation {
                product,
                cloud_id: context.cloud_id,
                environment_id: context.environment_id,
            },
        ))
    }

    /// Development mode: structure validation only (no signature check).
    #[cfg(feature = "dev")]
    fn verify_unsigned(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = jsonwebtoken::dangerous::insecure_decode::<HostClaims>(token)
            .map_err(|_| AuthError::MalformedToken)?
            .claims;

        if claims.exp > 0 && claims.exp < chrono::Utc::now().timestamp() - CLOCK_SKEW_LEEWAY as i64 {
            return Err(AuthError::TokenExpired);
        }

        self.principal_from(claims)
    }

    #[cfg(not(feature = "dev"))]
    fn verify_unsigned(&self, _token: &str) -> Result<Principal, AuthError> {
        Err(AuthError::InternalError(
            "host JWKS endpoint is not configured".to_string(),
        ))
    }
}
