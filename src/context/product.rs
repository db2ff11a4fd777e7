// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Host products and the app-id lookup used to tell them apart.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Host products the integration is installed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Product {
    /// Issue tracker; documents are attachments on issues.
    Jira,
    /// Wiki; documents are attachments on content nodes.
    Confluence,
}

impl Product {
    /// Lowercase segment used in operation paths (`/editor/jira`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            Product::Jira => "jira",
            Product::Confluence => "confluence",
        }
    }

    /// Parse a path segment back into a product.
    pub fn from_path_segment(segment: &str) -> Option<Product> {
        match segment {
            "jira" => Some(Product::Jira),
            "confluence" => Some(Product::Confluence),
            _ => None,
        }
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Product::Jira => write!(f, "JIRA"),
            Product::Confluence => write!(f, "CONFLUENCE"),
        }
    }
}

/// Resolves which product an app identifier belongs to.
///
/// The host platform issues one invocation token audience per installed app,
/// so the audience is the only reliable product discriminator.
pub trait AppIdentityLookup: Send + Sync {
    fn product_for_app(&self, app_id: &str) -> Option<Product>;
}

/// Config-backed app id table.
#[derive(Debug, Clone, Default)]
pub struct ProductApps {
    apps: HashMap<Product, String>,
}

impl ProductApps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the app id for a product.
    pub fn with_app(mut self, product: Product, app_id: impl Into<String>) -> Self {
        self.apps.insert(product, app_id.into());
        self
    }

    /// App id configured for a product, if any.
    pub fn app_id(&self, product: Product) -> Option<&str> {
        self.apps.get(&product).map(String::as_str)
    }

    /// All configured app ids, used as accepted token audiences.
    pub fn app_ids(&self) -> Vec<String> {
        self.apps.values().cloned().collect()
    }
}

impl AppIdentityLookup for ProductApps {
    fn product_for_app(&self, app_id: &str) -> Option<Product> {
        self.apps
            .iter()
            .find(|(_, configured)| configured.as_str() == app_id)
            .map(|(product, _)| *product)
    }
}
