// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Editor session expiry.
//!
//! A session lasts only as long as its weakest credential: each scope's
//! expiry is pulled forward by its refresh threshold and the earlier of the
//! two wins.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{
    CredentialNotFound, CredentialScope, RefreshThresholds, TenantCredentialCache, TenantKeys,
};

/// Latest safe moment to keep working, in epoch milliseconds.
pub fn session_expiry(
    cache: &TenantCredentialCache,
    keys: &TenantKeys,
    thresholds: &RefreshThresholds,
) -> Result<i64, CredentialNotFound> {
    let bound = |scope: CredentialScope| -> Result<DateTime<Utc>, CredentialNotFound> {
        let expires_at = cache.expires_at(keys.for_scope(scope), scope)?;
        Ok(pull_forward(expires_at, thresholds.for_scope(scope)))
    };

    let user = bound(CredentialScope::User)?;
    let system = bound(CredentialScope::System)?;

    Ok(user.min(system).timestamp_millis())
}

fn pull_forward(expires_at: DateTime<Utc>, threshold: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(threshold)
        .ok()
        .and_then(|threshold| expires_at.checked_sub_signed(threshold))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Product;
    use crate::credentials::TenantKey;
    use uuid::Uuid;

    fn keys() -> TenantKeys {
        let cloud = Uuid::new_v4();
        TenantKeys {
            user: TenantKey::user(Product::Jira, cloud, "acct"),
            system: TenantKey::system(Product::Jira, cloud),
        }
    }

    fn t() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn seed(cache: &TenantCredentialCache, keys: &TenantKeys, user_secs: i64, system_secs: i64) {
        cache.put(
            keys.user.clone(),
            CredentialScope::User,
            "user".into(),
            t() + chrono::Duration::seconds(user_secs),
        );
        cache.put(
            keys.system.clone(),
            CredentialScope::System,
            "system".into(),
            t() + chrono::Duration::seconds(system_secs),
        );
    }

    #[test]
    fn system_bound_wins_when_earlier() {
        let cache = TenantCredentialCache::new();
        let keys = keys();
        seed(&cache, &keys, 3600, 1800);

        let thresholds = RefreshThresholds {
            user: Duration::from_secs(300),
            system: Duration::from_secs(60),
        };
        let expires = session_expiry(&cache, &keys, &thresholds).unwrap();
        assert_eq!(
            expires,
            (t() + chrono::Duration::seconds(1740)).timestamp_millis()
        );
    }

    #[test]
    fn threshold_can_make_user_bound_win() {
        let cache = TenantCredentialCache::new();
        let keys = keys();
        seed(&cache, &keys, 1800, 1800);

        let thresholds = RefreshThresholds {
            user: Duration::from_secs(600),
            system: Duration::from_secs(60),
        };
        let expires = session_expiry(&cache, &keys, &thresholds).unwrap();
        assert_eq!(
            expires,
            (t() + chrono::Duration::seconds(1200)).timestamp_millis()
        );
    }

    #[test]
    fn missing_scope_is_not_found() {
        let cache = TenantCredentialCache::new();
        let keys = keys();
        cache.put(
            keys.user.clone(),
            CredentialScope::User,
            "user".into(),
            t(),
        );

        let thresholds = RefreshThresholds {
            user: Duration::ZERO,
            system: Duration::ZERO,
        };
        let error = session_expiry(&cache, &keys, &thresholds).unwrap_err();
        assert_eq!(error.scope, CredentialScope::System);
    }
}
