// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed operation URLs handed back to clients and the document server.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::token::{CapabilityTokenService, IssueError};
use crate::context::{Context, Product};

/// Query parameter carrying the capability token.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Public operation URLs of this service.
#[derive(Debug, Clone)]
pub struct AppUrls {
    base: Url,
}

impl AppUrls {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// File download endpoint for a product.
    pub fn download_url(&self, product: Product) -> Url {
        self.with_path(&format!("/api/v1/download/{}", product.path_segment()))
    }

    /// Save-callback endpoint for a product.
    pub fn callback_url(&self, product: Product) -> Url {
        self.with_path(&format!("/api/v1/callback/{}", product.path_segment()))
    }

    /// Editor bootstrap path, used as the editor token audience.
    pub fn editor_path(product: Product) -> String {
        format!("/editor/{}", product.path_segment())
    }

    /// Append `path` to the base URL's own path.
    fn with_path(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{}", self.base.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }
}

/// Attaches capability tokens to URLs.
#[derive(Clone)]
pub struct UrlSigner {
    tokens: Arc<CapabilityTokenService>,
}

impl UrlSigner {
    pub fn new(tokens: Arc<CapabilityTokenService>) -> Self {
        Self { tokens }
    }

    /// Return `base` with a `token` query parameter whose audience is
    /// `base`'s path.
    pub fn sign(
        &self,
        base: &Url,
        subject: &str,
        context: &Context,
        lifetime: Duration,
    ) -> Result<Url, IssueError> {
        let token = self.tokens.issue(subject, base.path(), lifetime, context)?;

        let mut url = base.clone();
        url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, &token);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::AuthError;
    use crate::context::JiraContext;
    use chrono::DateTime;
    use uuid::Uuid;

    fn signer() -> (UrlSigner, Arc<CapabilityTokenService>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let tokens = Arc::new(CapabilityTokenService::new(
            b"test-secret-which-is-at-least-32-bytes-long",
            clock,
        ));
        (UrlSigner::new(tokens.clone()), tokens)
    }

    fn context() -> Context {
        Context::Jira(JiraContext {
            cloud_id: Uuid::new_v4(),
            environment_id: None,
            issue_id: "10042".into(),
            attachment_id: "att-1".into(),
        })
    }

    fn token_of(url: &Url) -> String {
        url.query_pairs()
            .find(|(key, _)| key == TOKEN_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .unwrap()
    }

    #[test]
    fn builds_operation_urls_under_base_path() {
        let urls = AppUrls::new(Url::parse("https://docs.example.com/forge/").unwrap());
        assert_eq!(
            urls.download_url(Product::Jira).as_str(),
            "https://docs.example.com/forge/api/v1/download/jira"
        );
        assert_eq!(
            urls.callback_url(Product::Confluence).as_str(),
            "https://docs.example.com/forge/api/v1/callback/confluence"
        );
        assert_eq!(AppUrls::editor_path(Product::Confluence), "/editor/confluence");
    }

    #[test]
    fn signed_url_token_is_bound_to_url_path() {
        let (signer, tokens) = signer();
        let urls = AppUrls::new(Url::parse("https://docs.example.com").unwrap());
        let download = urls.download_url(Product::Jira);

        let signed = signer
            .sign(&download, "acct-1", &context(), Duration::from_secs(600))
            .unwrap();
        assert_eq!(signed.path(), "/api/v1/download/jira");

        let token = token_of(&signed);
        let verified = tokens.verify(&token, "/api/v1/download/jira").unwrap();
        assert_eq!(verified.subject, "acct-1");
        assert_eq!(verified.context, context());

        assert!(matches!(
            tokens.verify(&token, "/api/v1/callback/jira"),
            Err(AuthError::AudienceMismatch)
        ));
    }

    #[test]
    fn existing_query_is_preserved() {
        let (signer, _) = signer();
        let base = Url::parse("https://docs.example.com/api/v1/download/jira?mode=view").unwrap();
        let signed = signer
            .sign(&base, "acct-1", &context(), Duration::from_secs(60))
            .unwrap();
        assert!(signed.query_pairs().any(|(k, v)| k == "mode" && v == "view"));
        assert!(!token_of(&signed).is_empty());
    }
}
