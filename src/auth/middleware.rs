// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Inbound credential interceptor.
//!
//! Runs before every handler that calls back into the host platform. Stage
//! order:
//!
//! 1. Both host credential headers are present (`400` otherwise)
//! 2. User credential, then system credential, are outside their refresh
//!    thresholds
//! 3. The principal token is verified
//! 4. Both credentials are written to the tenant cache
//!
//! Nothing is cached unless every stage passes. On success the admitted
//! [`RequestIdentity`] is placed in the request extensions for the `Auth`
//! extractor.
//!
//! ```rust,ignore
//! let editor = Router::new()
//!     .route("/editor/jira", get(editor_session))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         InterceptorState::new(state.clone(), PrincipalSource::Capability),
//!         credential_interceptor,
//!     ));
//! ```

use axum::{
    extract::{OriginalUri, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::bearer_token;
use super::{AuthError, Principal};
use crate::credentials::{check_credential, CredentialScope, TenantKeys};
use crate::state::AppState;

/// How a route group authenticates its principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalSource {
    /// Host platform invocation token (JWKS-verified)
    HostInvocation,
    /// Capability token minted by this service, audience = request path
    Capability,
}

/// Middleware state: the app plus the route group's principal source.
#[derive(Clone)]
pub struct InterceptorState {
    pub app: AppState,
    pub source: PrincipalSource,
}

impl InterceptorState {
    pub fn new(app: AppState, source: PrincipalSource) -> Self {
        Self { app, source }
    }
}

/// Verified principal plus the cache keys its credentials were stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub principal: Principal,
    pub keys: TenantKeys,
}

/// Credential interceptor middleware function.
pub async fn credential_interceptor(
    State(interceptor): State<InterceptorState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    match admit(&interceptor, request.headers(), &path).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Validate host credentials, verify the principal and populate the cache.
pub async fn admit(
    interceptor: &InterceptorState,
    headers: &HeaderMap,
    path: &str,
) -> Result<RequestIdentity, AuthError> {
    let state = &interceptor.app;
    let config = &state.config;

    let user_token = credential_header(headers, config.user_header.as_str())?;
    let system_token = credential_header(headers, config.system_header.as_str())?;

    let now = state.clock.now();
    let thresholds = &config.refresh_thresholds;
    let check = |token: &str, scope: CredentialScope| {
        check_credential(token, scope, thresholds.for_scope(scope), now)
    };
    let user_expires_at = check(user_token, CredentialScope::User)?;
    let system_expires_at = check(system_token, CredentialScope::System)?;

    let principal = authenticate(interceptor, headers, path).await?;
    let keys = TenantKeys::for_principal(&principal);

    for (scope, token, expires_at) in [
        (CredentialScope::System, system_token, system_expires_at),
        (CredentialScope::User, user_token, user_expires_at),
    ] {
        state
            .credentials
            .put(keys.for_scope(scope).clone(), scope, token.to_string(), expires_at);
    }

    Ok(RequestIdentity { principal, keys })
}

async fn authenticate(
    interceptor: &InterceptorState,
    headers: &HeaderMap,
    path: &str,
) -> Result<Principal, AuthError> {
    let token = bearer_token(headers)?;
    match interceptor.source {
        PrincipalSource::HostInvocation => interceptor.app.host.verify(token).await,
        PrincipalSource::Capability => {
            let capability = interceptor.app.tokens.verify(token, path)?;
            Ok(Principal::from_capability(
                capability.subject,
                capability.context,
            ))
        }
    }
}

fn credential_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AuthError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AuthError::MissingCredentialHeader(name.to_string()))
}
