// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Tenant Credentials
//!
//! The host platform attaches two short-lived OAuth bearer tokens to every
//! invocation: one acting as the user, one acting as the installation. They
//! are needed later to call back into the host APIs, so each inbound request
//! refreshes them in a process-wide cache.
//!
//! ## Keys
//!
//! | Scope | Key |
//! |-------|-----|
//! | `SYSTEM` | `{PRODUCT}:{cloudId}` |
//! | `USER` | `{PRODUCT}:{cloudId}:{accountId}` |

pub mod cache;
pub mod external;
pub mod session;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Principal;
use crate::context::Product;

pub use cache::{CachedCredential, TenantCredentialCache};
pub use external::check_credential;
pub use session::session_expiry;

/// Privilege level a host credential was granted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialScope {
    /// Acting as the end user
    User,
    /// Acting as the installation itself
    System,
}

impl std::fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialScope::User => write!(f, "USER"),
            CredentialScope::System => write!(f, "SYSTEM"),
        }
    }
}

/// Cache key identifying whose credential an entry is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantKey(String);

impl TenantKey {
    pub fn system(product: Product, cloud_id: Uuid) -> Self {
        Self(format!("{product}:{cloud_id}"))
    }

    pub fn user(product: Product, cloud_id: Uuid, account_id: &str) -> Self {
        Self(format!("{product}:{cloud_id}:{account_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The pair of keys a request's credentials are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantKeys {
    pub user: TenantKey,
    pub system: TenantKey,
}

impl TenantKeys {
    pub fn for_principal(principal: &Principal) -> Self {
        let installation = &principal.installation;
        Self {
            user: TenantKey::user(
                installation.product,
                installation.cloud_id,
                &principal.account_id,
            ),
            system: TenantKey::system(installation.product, installation.cloud_id),
        }
    }

    pub fn for_scope(&self, scope: CredentialScope) -> &TenantKey {
        match scope {
            CredentialScope::User => &self.user,
            CredentialScope::System => &self.system,
        }
    }
}

/// Safety margin subtracted from each scope's raw expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshThresholds {
    pub user: Duration,
    pub system: Duration,
}

impl RefreshThresholds {
    pub fn for_scope(&self, scope: CredentialScope) -> Duration {
        match scope {
            CredentialScope::User => self.user,
            CredentialScope::System => self.system,
        }
    }
}

/// No credential has been cached for the tenant and scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No {scope} credential cached for this tenant")]
pub struct CredentialNotFound {
    pub key: TenantKey,
    pub scope: CredentialScope,
}
