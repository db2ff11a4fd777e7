// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Capability tokens.
//!
//! A capability token is an HS256 JWT signed with the service secret. It is
//! self-contained (no session store) and audience-bound: the `aud` claim is
//! the one operation path the token unlocks, so a leaked download link cannot
//! be replayed against the save callback.
//!
//! ## Verification order
//!
//! 1. Signature (`InvalidSignature`), before any claim is trusted
//! 2. Expiry (`TokenExpired`)
//! 3. Non-blank subject (`MalformedToken`)
//! 4. Context claim shape (`MalformedContext`)
//! 5. Audience equals the expected path (`AudienceMismatch`)

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::{Map, Value};

use super::claims::CapabilityClaims;
use super::clock::Clock;
use super::error::AuthError;
use crate::context::{Context, MalformedContextError};

/// Token issuance failed because of the caller's inputs.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("subject must not be blank")]
    BlankSubject,

    #[error("audience must not be empty")]
    EmptyAudience,

    #[error("lifetime must be at least one second")]
    LifetimeBelowOneSecond,

    #[error("failed to encode token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Subject and context recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCapability {
    pub subject: String,
    pub context: Context,
}

/// Signs and verifies capability tokens with one shared secret.
pub struct CapabilityTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl CapabilityTokenService {
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            clock,
        }
    }

    /// Mint a token for `subject` that unlocks `audience` for `lifetime`.
    pub fn issue(
        &self,
        subject: &str,
        audience: &str,
        lifetime: Duration,
        context: &Context,
    ) -> Result<String, IssueError> {
        if subject.trim().is_empty() {
            return Err(IssueError::BlankSubject);
        }
        if audience.is_empty() {
            return Err(IssueError::EmptyAudience);
        }
        let lifetime_secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        if lifetime_secs == 0 {
            return Err(IssueError::LifetimeBelowOneSecond);
        }

        let issued_at = self.clock.now().timestamp();
        let claims = CapabilityClaims {
            sub: subject.to_string(),
            aud: audience.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime_secs),
            context: context.to_claims(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        tracing::debug!(
            audience,
            product = %context.product(),
            expires_at = claims.exp,
            "Issued capability token"
        );

        Ok(token)
    }

    /// Verify `token` for the operation at `expected_audience`.
    pub fn verify(
        &self,
        token: &str,
        expected_audience: &str,
    ) -> Result<VerifiedCapability, AuthError> {
        // Claim checks are done below, against our own clock and in a fixed order.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let mut claims = decode::<Map<String, Value>>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::Base64(_) if only_signature_unreadable(token) => {
                    AuthError::InvalidSignature
                }
                _ => AuthError::MalformedToken,
            })?
            .claims;

        let expires_at = claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(AuthError::MalformedToken)?;
        if self.clock.now().timestamp() >= expires_at {
            return Err(AuthError::TokenExpired);
        }

        let subject = match claims.remove("sub") {
            Some(Value::String(sub)) if !sub.trim().is_empty() => sub,
            _ => return Err(AuthError::MalformedToken),
        };

        let context = match claims.remove("context") {
            Some(Value::Object(map)) => Context::from_claims(map)?,
            Some(_) => {
                return Err(MalformedContextError("context claim is not an object".into()).into())
            }
            None => return Err(MalformedContextError("context claim is missing".into()).into()),
        };

        let audience_matches = match claims.get("aud") {
            Some(Value::String(aud)) => aud == expected_audience,
            Some(Value::Array(auds)) => {
                auds.len() == 1 && auds[0].as_str() == Some(expected_audience)
            }
            _ => false,
        };
        if !audience_matches {
            return Err(AuthError::AudienceMismatch);
        }

        Ok(VerifiedCapability { subject, context })
    }
}

/// Header and payload decode, so a base64 failure came from the signature
/// segment.
fn only_signature_unreadable(token: &str) -> bool {
    jsonwebtoken::dangerous::insecure_decode::<Map<String, Value>>(token).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::context::tests::arb_context;
    use crate::context::{ConfluenceContext, ContentReference, JiraContext};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use proptest::prelude::*;
    use chrono::DateTime;
    use uuid::Uuid;

    const SECRET: &[u8] = b"test-secret-which-is-at-least-32-bytes-long";

    fn service() -> (CapabilityTokenService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        (CapabilityTokenService::new(SECRET, clock.clone()), clock)
    }

    fn jira() -> Context {
        Context::Jira(JiraContext {
            cloud_id: Uuid::new_v4(),
            environment_id: Some(Uuid::new_v4()),
            issue_id: "10042".into(),
            attachment_id: "att-1".into(),
        })
    }

    fn confluence() -> Context {
        Context::Confluence(ConfluenceContext {
            cloud_id: Uuid::new_v4(),
            environment_id: None,
            parent_id: ContentReference::new("page", "98305").unwrap(),
            attachment_id: "att-2".into(),
        })
    }

    /// Sign arbitrary claims with the test secret.
    fn sign_raw(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[test]
    fn issued_token_verifies_for_its_audience() {
        let (tokens, _) = service();
        for context in [jira(), confluence()] {
            let token = tokens
                .issue("acct-1", "/api/v1/download/jira", Duration::from_secs(600), &context)
                .unwrap();
            let verified = tokens.verify(&token, "/api/v1/download/jira").unwrap();
            assert_eq!(verified.subject, "acct-1");
            assert_eq!(verified.context, context);
        }
    }

    proptest! {
        #[test]
        fn issued_tokens_verify_for_exactly_their_audience(
            subject in "\\S.{0,31}",
            audience in "/[a-z0-9/_-]{0,40}",
            other in "/?[a-z0-9/_-]{0,40}",
            lifetime in 1u64..=86_400,
            context in arb_context(),
        ) {
            let (tokens, clock) = service();
            let token = tokens
                .issue(&subject, &audience, Duration::from_secs(lifetime), &context)
                .unwrap();

            if other != audience {
                prop_assert!(matches!(
                    tokens.verify(&token, &other),
                    Err(AuthError::AudienceMismatch)
                ));
            }

            clock.advance(chrono::Duration::seconds(lifetime as i64 - 1));
            let verified = tokens.verify(&token, &audience).unwrap();
            prop_assert_eq!(verified.subject, subject);
            prop_assert_eq!(verified.context, context);
        }
    }

    #[test]
    fn other_audience_is_rejected_before_expiry() {
        let (tokens, _) = service();
        let token = tokens
            .issue("acct-1", "/api/v1/download/jira", Duration::from_secs(600), &jira())
            .unwrap();

        for other in ["/api/v1/callback/jira", "/editor/jira", "/api/v1/download/jira/", ""] {
            assert!(matches!(
                tokens.verify(&token, other),
                Err(AuthError::AudienceMismatch)
            ));
        }
    }

    #[test]
    fn expiry_boundary() {
        let (tokens, clock) = service();
        let token = tokens
            .issue("acct-1", "/editor/jira", Duration::from_secs(300), &jira())
            .unwrap();

        clock.advance(chrono::Duration::seconds(299));
        assert!(tokens.verify(&token, "/editor/jira").is_ok());

        clock.advance(chrono::Duration::seconds(2));
        assert!(matches!(
            tokens.verify(&token, "/editor/jira"),
            Err(AuthError::TokenExpired)
        ));
    }

    const BASE64URL_ALPHABET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    #[test]
    fn tampered_signature_is_invalid_signature() {
        let (tokens, _) = service();
        let token = tokens
            .issue("acct-1", "/editor/jira", Duration::from_secs(300), &jira())
            .unwrap();

        let (message, signature) = token.rsplit_once('.').unwrap();
        // Every position, including the last one whose padding bits the
        // decoder rejects, and a byte outside the alphabet.
        for position in 0..signature.len() {
            let original = signature.as_bytes()[position];
            for &replacement in BASE64URL_ALPHABET.iter().chain(b"*") {
                if replacement == original {
                    continue;
                }
                let mut bytes = signature.as_bytes().to_vec();
                bytes[position] = replacement;
                let tampered = format!("{message}.{}", String::from_utf8(bytes).unwrap());
                let result = tokens.verify(&tampered, "/editor/jira");
                assert!(
                    matches!(result, Err(AuthError::InvalidSignature)),
                    "position {position}, byte {:?}: {result:?}",
                    replacement as char
                );
            }
        }
    }

    #[test]
    fn truncated_or_empty_signature_is_invalid_signature() {
        let (tokens, _) = service();
        let token = tokens
            .issue("acct-1", "/editor/jira", Duration::from_secs(300), &jira())
            .unwrap();
        let (message, signature) = token.rsplit_once('.').unwrap();

        for tampered in [
            format!("{message}."),
            format!("{message}.{}", &signature[..signature.len() - 1]),
            format!("{message}.{signature}A"),
        ] {
            assert!(matches!(
                tokens.verify(&tampered, "/editor/jira"),
                Err(AuthError::InvalidSignature)
            ));
        }
    }

    #[test]
    fn unreadable_header_stays_malformed() {
        let (tokens, _) = service();
        let token = tokens
            .issue("acct-1", "/editor/jira", Duration::from_secs(300), &jira())
            .unwrap();
        let (_, rest) = token.split_once('.').unwrap();
        assert!(matches!(
            tokens.verify(&format!("*{rest}"), "/editor/jira"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn token_from_other_secret_is_invalid_signature() {
        let (tokens, clock) = service();
        let other = CapabilityTokenService::new(b"another-secret-another-secret-another", clock);
        let token = other
            .issue("acct-1", "/editor/jira", Duration::from_secs(300), &jira())
            .unwrap();
        assert!(matches!(
            tokens.verify(&token, "/editor/jira"),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn signature_is_checked_before_expiry() {
        let (tokens, clock) = service();
        let token = tokens
            .issue("acct-1", "/editor/jira", Duration::from_secs(60), &jira())
            .unwrap();
        clock.advance(chrono::Duration::hours(2));

        let (message, _) = token.rsplit_once('.').unwrap();
        let forged = format!("{message}.{}", URL_SAFE_NO_PAD.encode([7u8; 32]));
        assert!(matches!(
            tokens.verify(&forged, "/editor/jira"),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn blank_subject_is_malformed() {
        let (tokens, _) = service();
        let token = sign_raw(serde_json::json!({
            "sub": "  ",
            "aud": "/editor/jira",
            "iat": 1_700_000_000,
            "exp": 1_700_000_600,
            "context": jira().to_claims()
        }));
        assert!(matches!(
            tokens.verify(&token, "/editor/jira"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn missing_or_invalid_context_is_malformed_context() {
        let (tokens, _) = service();
        let missing = sign_raw(serde_json::json!({
            "sub": "acct-1",
            "aud": "/editor/confluence",
            "iat": 1_700_000_000,
            "exp": 1_700_000_600
        }));
        assert!(matches!(
            tokens.verify(&missing, "/editor/confluence"),
            Err(AuthError::MalformedContext(_))
        ));

        let mut claims = confluence().to_claims();
        claims.remove("attachmentId");
        let invalid = sign_raw(serde_json::json!({
            "sub": "acct-1",
            "aud": "/editor/confluence",
            "iat": 1_700_000_000,
            "exp": 1_700_000_600,
            "context": claims
        }));
        assert!(matches!(
            tokens.verify(&invalid, "/editor/confluence"),
            Err(AuthError::MalformedContext(_))
        ));
    }

    #[test]
    fn context_is_checked_before_audience() {
        let (tokens, _) = service();
        let token = sign_raw(serde_json::json!({
            "sub": "acct-1",
            "aud": "/editor/jira",
            "iat": 1_700_000_000,
            "exp": 1_700_000_600,
            "context": {"product": "BITBUCKET"}
        }));
        assert!(matches!(
            tokens.verify(&token, "/somewhere/else"),
            Err(AuthError::MalformedContext(_))
        ));
    }

    #[test]
    fn single_entry_audience_list_is_accepted() {
        let (tokens, _) = service();
        let token = sign_raw(serde_json::json!({
            "sub": "acct-1",
            "aud": ["/editor/jira"],
            "iat": 1_700_000_000,
            "exp": 1_700_000_600,
            "context": jira().to_claims()
        }));
        assert!(tokens.verify(&token, "/editor/jira").is_ok());
    }

    #[test]
    fn garbage_is_malformed() {
        let (tokens, _) = service();
        assert!(matches!(
            tokens.verify("not-a-jwt", "/editor/jira"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn issue_rejects_bad_inputs() {
        let (tokens, _) = service();
        assert!(matches!(
            tokens.issue(" ", "/editor/jira", Duration::from_secs(60), &jira()),
            Err(IssueError::BlankSubject)
        ));
        assert!(matches!(
            tokens.issue("acct", "", Duration::from_secs(60), &jira()),
            Err(IssueError::EmptyAudience)
        ));
        assert!(matches!(
            tokens.issue("acct", "/editor/jira", Duration::from_millis(500), &jira()),
            Err(IssueError::LifetimeBelowOneSecond)
        ));
        assert!(matches!(
            tokens.issue("acct", "/editor/jira", Duration::ZERO, &jira()),
            Err(IssueError::LifetimeBelowOneSecond)
        ));
        assert!(tokens
            .issue("acct", "/editor/jira", Duration::from_millis(1500), &jira())
            .is_ok());
    }
}
