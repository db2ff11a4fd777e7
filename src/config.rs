// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into an [`AppConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_BASE_URL` | Public base URL of this service | Required |
//! | `APP_SECURITY_SECRET` | Capability token signing secret (>= 32 bytes) | Required |
//! | `APP_SECURITY_TTL_DEFAULT_SECS` | Editor and download token lifetime | `3600` |
//! | `APP_SECURITY_TTL_CALLBACK_SECS` | Save-callback token lifetime | `86400` |
//! | `FORGE_TOKEN_USER_HEADER` | Header carrying the user credential | `x-forge-oauth-user` |
//! | `FORGE_TOKEN_SYSTEM_HEADER` | Header carrying the system credential | `x-forge-oauth-system` |
//! | `FORGE_TOKEN_USER_REFRESH_THRESHOLD_SECS` | User credential safety margin | `300` |
//! | `FORGE_TOKEN_SYSTEM_REFRESH_THRESHOLD_SECS` | System credential safety margin | `300` |
//! | `FORGE_JIRA_APP_ID` | App id of the issue-tracker installation | Optional |
//! | `FORGE_CONFLUENCE_APP_ID` | App id of the wiki installation | Optional |
//! | `FORGE_JWKS_URL` | Host platform JWKS endpoint | Required for production |
//! | `FORGE_ISSUER` | Expected host token issuer | `forge/invocation-token` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate and key (both or neither) | Plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderName;
use url::Url;

use crate::context::{Product, ProductApps};
use crate::credentials::RefreshThresholds;

pub const APP_BASE_URL_ENV: &str = "APP_BASE_URL";

/// Shared secret for capability token signatures.
///
/// Every replica must use the same value or tokens minted by one instance
/// will fail verification on another.
pub const APP_SECURITY_SECRET_ENV: &str = "APP_SECURITY_SECRET";

pub const APP_SECURITY_TTL_DEFAULT_ENV: &str = "APP_SECURITY_TTL_DEFAULT_SECS";
pub const APP_SECURITY_TTL_CALLBACK_ENV: &str = "APP_SECURITY_TTL_CALLBACK_SECS";
pub const FORGE_TOKEN_USER_HEADER_ENV: &str = "FORGE_TOKEN_USER_HEADER";
pub const FORGE_TOKEN_SYSTEM_HEADER_ENV: &str = "FORGE_TOKEN_SYSTEM_HEADER";
pub const FORGE_TOKEN_USER_THRESHOLD_ENV: &str = "FORGE_TOKEN_USER_REFRESH_THRESHOLD_SECS";
pub const FORGE_TOKEN_SYSTEM_THRESHOLD_ENV: &str = "FORGE_TOKEN_SYSTEM_REFRESH_THRESHOLD_SECS";
pub const FORGE_JIRA_APP_ID_ENV: &str = "FORGE_JIRA_APP_ID";
pub const FORGE_CONFLUENCE_APP_ID_ENV: &str = "FORGE_CONFLUENCE_APP_ID";

/// Host platform JWKS endpoint.
///
/// Without it host invocation tokens are refused, unless the crate is built
/// with the `dev` feature.
pub const FORGE_JWKS_URL_ENV: &str = "FORGE_JWKS_URL";

pub const FORGE_ISSUER_ENV: &str = "FORGE_ISSUER";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_TTL_SECS: u64 = 3600;
pub const DEFAULT_CALLBACK_TTL_SECS: u64 = 86_400;
pub const DEFAULT_USER_HEADER: &str = "x-forge-oauth-user";
pub const DEFAULT_SYSTEM_HEADER: &str = "x-forge-oauth-system";
pub const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 300;
pub const DEFAULT_ISSUER: &str = "forge/invocation-token";

/// Minimum signing secret length for HS256.
pub const MIN_SECRET_LEN: usize = 32;

/// Invalid or missing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Signing secret bytes. `Debug` never prints the value.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningSecret([REDACTED; {} bytes])", self.0.len())
    }
}

/// PEM files for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Url,
    pub secret: SigningSecret,
    /// Lifetime of editor and download tokens
    pub ttl_default: Duration,
    /// Lifetime of save-callback tokens
    pub ttl_callback: Duration,
    pub user_header: HeaderName,
    pub system_header: HeaderName,
    pub refresh_thresholds: RefreshThresholds,
    pub apps: ProductApps,
    pub jwks_url: Option<String>,
    pub issuer: String,
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsPaths>,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = get(APP_BASE_URL_ENV).ok_or(ConfigError::Missing(APP_BASE_URL_ENV))?;
        let base_url = Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            name: APP_BASE_URL_ENV,
            reason: e.to_string(),
        })?;

        let secret = get(APP_SECURITY_SECRET_ENV).ok_or(ConfigError::Missing(APP_SECURITY_SECRET_ENV))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: APP_SECURITY_SECRET_ENV,
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let seconds = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match get(name) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::Invalid {
                        name,
                        reason: e.to_string(),
                    }),
            }
        };

        let ttl_default = seconds(APP_SECURITY_TTL_DEFAULT_ENV, DEFAULT_TTL_SECS)?;
        let ttl_callback = seconds(APP_SECURITY_TTL_CALLBACK_ENV, DEFAULT_CALLBACK_TTL_SECS)?;
        for (name, ttl) in [
            (APP_SECURITY_TTL_DEFAULT_ENV, ttl_default),
            (APP_SECURITY_TTL_CALLBACK_ENV, ttl_callback),
        ] {
            if ttl.is_zero() {
                return Err(ConfigError::Invalid {
                    name,
                    reason: "must be positive".to_string(),
                });
            }
        }

        let header = |name: &'static str, default: &str| -> Result<HeaderName, ConfigError> {
            let raw = get(name).unwrap_or_else(|| default.to_string());
            HeaderName::from_bytes(raw.to_ascii_lowercase().as_bytes()).map_err(|e| {
                ConfigError::Invalid {
                    name,
                    reason: e.to_string(),
                }
            })
        };

        let refresh_thresholds = RefreshThresholds {
            user: seconds(FORGE_TOKEN_USER_THRESHOLD_ENV, DEFAULT_REFRESH_THRESHOLD_SECS)?,
            system: seconds(FORGE_TOKEN_SYSTEM_THRESHOLD_ENV, DEFAULT_REFRESH_THRESHOLD_SECS)?,
        };

        let mut apps = ProductApps::new();
        if let Some(app_id) = get(FORGE_JIRA_APP_ID_ENV) {
            apps = apps.with_app(Product::Jira, app_id);
        }
        if let Some(app_id) = get(FORGE_CONFLUENCE_APP_ID_ENV) {
            apps = apps.with_app(Product::Confluence, app_id);
        }

        let port = match get(PORT_ENV) {
            None => 8080,
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("'{raw}' is not a port number"),
            })?,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(Self {
            base_url,
            secret: SigningSecret::new(secret),
            ttl_default,
            ttl_callback,
            user_header: header(FORGE_TOKEN_USER_HEADER_ENV, DEFAULT_USER_HEADER)?,
            system_header: header(FORGE_TOKEN_SYSTEM_HEADER_ENV, DEFAULT_SYSTEM_HEADER)?,
            refresh_thresholds,
            apps,
            jwks_url: get(FORGE_JWKS_URL_ENV),
            issuer: get(FORGE_ISSUER_ENV).unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            host: get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            tls,
        })
    }
}
