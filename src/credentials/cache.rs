// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process store for host credentials.
//!
//! Writes are last-write-wins per key and readers never wait on each other.
//! The cache does not enforce expiry: a read may return a credential that has
//! since expired. Callers that care check [`TenantCredentialCache::expires_at`].

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{CredentialNotFound, CredentialScope, TenantKey};

/// Cached entry: bearer token + its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Per-scope concurrent maps keyed by tenant.
#[derive(Debug, Default)]
pub struct TenantCredentialCache {
    user: DashMap<TenantKey, CachedCredential>,
    system: DashMap<TenantKey, CachedCredential>,
}

impl TenantCredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, scope: CredentialScope) -> &DashMap<TenantKey, CachedCredential> {
        match scope {
            CredentialScope::User => &self.user,
            CredentialScope::System => &self.system,
        }
    }

    /// Store the latest credential for `(key, scope)`, replacing any previous one.
    pub fn put(
        &self,
        key: TenantKey,
        scope: CredentialScope,
        token: String,
        expires_at: DateTime<Utc>,
    ) {
        tracing::debug!(tenant = %key, %scope, %expires_at, "Caching host credential");
        self.shard(scope)
            .insert(key, CachedCredential { token, expires_at });
    }

    /// Current bearer token for `(key, scope)`.
    pub fn get(&self, key: &TenantKey, scope: CredentialScope) -> Result<String, CredentialNotFound> {
        self.shard(scope)
            .get(key)
            .map(|entry| entry.token.clone())
            .ok_or_else(|| not_found(key, scope))
    }

    /// Expiry recorded for `(key, scope)`.
    pub fn expires_at(
        &self,
        key: &TenantKey,
        scope: CredentialScope,
    ) -> Result<DateTime<Utc>, CredentialNotFound> {
        self.shard(scope)
            .get(key)
            .map(|entry| entry.expires_at)
            .ok_or_else(|| not_found(key, scope))
    }

    /// Number of cached entries across both scopes.
    pub fn len(&self) -> usize {
        self.user.len() + self.system.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn not_found(key: &TenantKey, scope: CredentialScope) -> CredentialNotFound {
    CredentialNotFound {
        key: key.clone(),
        scope,
    }
}
