// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{
    AppUrls, AuthError, CapabilityTokenService, Clock, HostTokenVerifier, JwksManager,
    SystemClock, UrlSigner,
};
use crate::config::AppConfig;
use crate::context::Product;
use crate::credentials::TenantCredentialCache;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<CapabilityTokenService>,
    pub signer: UrlSigner,
    pub urls: Arc<AppUrls>,
    pub credentials: Arc<TenantCredentialCache>,
    pub host: Arc<HostTokenVerifier>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, AuthError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build state around an explicit time source.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let jwks = match &config.jwks_url {
            Some(url) => Some(JwksManager::new(url.clone())?),
            None => {
                tracing::warn!("FORGE_JWKS_URL not set, host invocation tokens cannot be verified");
                None
            }
        };

        for product in [Product::Jira, Product::Confluence] {
            match config.apps.app_id(product) {
                Some(app_id) => tracing::info!(%product, app_id, "Accepting host invocations"),
                None => tracing::warn!(
                    %product,
                    "No app id configured, host invocations for this product are rejected"
                ),
            }
        }

        let host = HostTokenVerifier::new(
            jwks,
            config.issuer.clone(),
            config.apps.app_ids(),
            Arc::new(config.apps.clone()),
        );

        let tokens = Arc::new(CapabilityTokenService::new(
            config.secret.as_bytes(),
            clock.clone(),
        ));

        Ok(Self {
            clock,
            signer: UrlSigner::new(tokens.clone()),
            tokens,
            urls: Arc::new(AppUrls::new(config.base_url.clone())),
            credentials: Arc::new(TenantCredentialCache::new()),
            host: Arc::new(host),
            config: Arc::new(config),
        })
    }
}

/// State with a manual clock, no JWKS and fixed test settings.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, Arc<crate::auth::ManualClock>) {
    use crate::config::{APP_BASE_URL_ENV, APP_SECURITY_SECRET_ENV, FORGE_CONFLUENCE_APP_ID_ENV, FORGE_JIRA_APP_ID_ENV};

    let config = AppConfig::from_lookup(|name| match name {
        APP_BASE_URL_ENV => Some("https://docs.example.com".to_string()),
        APP_SECURITY_SECRET_ENV => Some("test-secret-test-secret-test-secret!".to_string()),
        FORGE_JIRA_APP_ID_ENV => Some("ari:cloud:ecosystem::app/jira-app".to_string()),
        FORGE_CONFLUENCE_APP_ID_ENV => Some("ari:cloud:ecosystem::app/wiki-app".to_string()),
        _ => None,
    })
    .unwrap();

    let start = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let clock = Arc::new(crate::auth::ManualClock::new(start));
    let state = AppState::with_clock(config, clock.clone()).unwrap();
    (state, clock)
}
