// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Expiry checks for host-issued credentials.
//!
//! The host platform is the trusted issuer of these tokens and re-verifying
//! their signatures is its job, so they are only decoded to read `exp`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::CredentialScope;
use crate::auth::AuthError;

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    #[serde(default)]
    exp: Option<i64>,
}

/// Read the `exp` claim of a host credential.
pub fn credential_expiry(token: &str, scope: CredentialScope) -> Result<DateTime<Utc>, AuthError> {
    let data = jsonwebtoken::dangerous::insecure_decode::<ExpiryClaim>(token)
        .map_err(|_| AuthError::MalformedCredential(scope))?;

    data.claims
        .exp
        .and_then(|exp| DateTime::from_timestamp(exp, 0))
        .ok_or(AuthError::MalformedCredential(scope))
}

/// Validate a host credential against `now` and its scope's refresh threshold.
///
/// Returns the credential's expiry when it is usable for at least
/// `threshold` longer.
pub fn check_credential(
    token: &str,
    scope: CredentialScope,
    threshold: Duration,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, AuthError> {
    let expires_at = credential_expiry(token, scope)?;

    if now >= expires_at {
        return Err(AuthError::CredentialExpired(scope));
    }

    let refresh_at = chrono::Duration::from_std(threshold)
        .ok()
        .and_then(|threshold| expires_at.checked_sub_signed(threshold))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    if now >= refresh_at {
        return Err(AuthError::CredentialNearExpiry(scope));
    }

    Ok(expires_at)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    /// Unsigned host-style JWT carrying `claims`.
    pub(crate) fn host_credential(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.fake_signature")
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn accepts_credential_outside_threshold() {
        let token = host_credential(serde_json::json!({"exp": 1_700_003_600, "sub": "x"}));
        let expires_at =
            check_credential(&token, CredentialScope::User, Duration::from_secs(300), now())
                .unwrap();
        assert_eq!(expires_at.timestamp(), 1_700_003_600);
    }

    #[test]
    fn rejects_credential_inside_threshold() {
        let token = host_credential(serde_json::json!({"exp": 1_700_000_030}));
        assert!(matches!(
            check_credential(&token, CredentialScope::User, Duration::from_secs(300), now()),
            Err(AuthError::CredentialNearExpiry(CredentialScope::User))
        ));
        assert!(
            check_credential(&token, CredentialScope::User, Duration::from_secs(10), now()).is_ok()
        );
    }

    #[test]
    fn rejects_expired_credential() {
        let token = host_credential(serde_json::json!({"exp": 1_699_999_999}));
        assert!(matches!(
            check_credential(&token, CredentialScope::System, Duration::ZERO, now()),
            Err(AuthError::CredentialExpired(CredentialScope::System))
        ));
    }

    #[test]
    fn missing_exp_is_malformed() {
        let token = host_credential(serde_json::json!({"sub": "x"}));
        assert!(matches!(
            check_credential(&token, CredentialScope::System, Duration::ZERO, now()),
            Err(AuthError::MalformedCredential(CredentialScope::System))
        ));
    }

    #[test]
    fn undecodable_token_is_malformed() {
        assert!(matches!(
            credential_expiry("definitely-not-a-jwt", CredentialScope::User),
            Err(AuthError::MalformedCredential(CredentialScope::User))
        ));
    }
}
