// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Context
//!
//! A [`Context`] describes which host product, tenant and document a request
//! concerns. It travels inside capability tokens as the `context` claim:
//!
//! ```json
//! {
//!   "product": "CONFLUENCE",
//!   "cloudId": "5d3d5c8c-8d5e-4b33-9c0f-6f0a3f7e2c11",
//!   "environmentId": "0b9b0c1e-2a76-4b6d-9e0c-1fd1b4a1b2c3",
//!   "parentId": "page:98305",
//!   "attachmentId": "att123"
//! }
//! ```
//!
//! The `product` tag selects the variant. Unknown fields are ignored, a
//! missing or mistyped required field fails closed with
//! [`MalformedContextError`]. This is the only place a context claim is
//! validated; everything downstream receives an already-typed value.

pub mod product;
pub mod reference;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub use product::{AppIdentityLookup, Product, ProductApps};
pub use reference::{ContentReference, InvalidContentReference};

/// Context claim could not be turned into a known product shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed context claim: {0}")]
pub struct MalformedContextError(pub String);

/// A product was recognised but the calling operation does not support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported product: {0}")]
pub struct UnsupportedProductError(pub Product);

/// Per-request identity, tagged by host product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "product", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Context {
    Jira(JiraContext),
    Confluence(ConfluenceContext),
}

/// An attachment on a Jira issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraContext {
    pub cloud_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<Uuid>,
    pub issue_id: String,
    pub attachment_id: String,
}

/// An attachment on a Confluence content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfluenceContext {
    pub cloud_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<Uuid>,
    pub parent_id: ContentReference,
    pub attachment_id: String,
}

/// The tenant part of a context: one installation of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Installation {
    pub product: Product,
    pub cloud_id: Uuid,
    /// Absent for installations created before environments existed.
    pub environment_id: Option<Uuid>,
}

impl Context {
    pub fn product(&self) -> Product {
        match self {
            Context::Jira(_) => Product::Jira,
            Context::Confluence(_) => Product::Confluence,
        }
    }

    pub fn cloud_id(&self) -> Uuid {
        match self {
            Context::Jira(ctx) => ctx.cloud_id,
            Context::Confluence(ctx) => ctx.cloud_id,
        }
    }

    pub fn environment_id(&self) -> Option<Uuid> {
        match self {
            Context::Jira(ctx) => ctx.environment_id,
            Context::Confluence(ctx) => ctx.environment_id,
        }
    }

    pub fn attachment_id(&self) -> &str {
        match self {
            Context::Jira(ctx) => &ctx.attachment_id,
            Context::Confluence(ctx) => &ctx.attachment_id,
        }
    }

    pub fn installation(&self) -> Installation {
        Installation {
            product: self.product(),
            cloud_id: self.cloud_id(),
            environment_id: self.environment_id(),
        }
    }

    /// Borrow the Confluence shape, for operations only Confluence supports.
    pub fn as_confluence(&self) -> Result<&ConfluenceContext, UnsupportedProductError> {
        match self {
            Context::Confluence(ctx) => Ok(ctx),
            Context::Jira(_) => Err(UnsupportedProductError(Product::Jira)),
        }
    }

    /// Serialize into the claim map embedded in capability tokens.
    pub fn to_claims(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // Every variant is a struct; serde always produces an object here.
            _ => Map::new(),
        }
    }

    /// Rebuild a context from a claim map.
    pub fn from_claims(claims: Map<String, Value>) -> Result<Self, MalformedContextError> {
        serde_json::from_value(Value::Object(claims))
            .map_err(|e| MalformedContextError(e.to_string()))
    }
}

impl Installation {
    /// Attach a document to this installation, producing a full context.
    ///
    /// For Jira the parent is the issue id, for Confluence it must parse as a
    /// `content-type:id` reference.
    pub fn with_document(
        &self,
        parent_id: &str,
        attachment_id: &str,
    ) -> Result<Context, InvalidContentReference> {
        Ok(match self.product {
            Product::Jira => Context::Jira(JiraContext {
                cloud_id: self.cloud_id,
                environment_id: self.environment_id,
                issue_id: parent_id.to_string(),
                attachment_id: attachment_id.to_string(),
            }),
            Product::Confluence => Context::Confluence(ConfluenceContext {
                cloud_id: self.cloud_id,
                environment_id: self.environment_id,
                parent_id: ContentReference::parse(parent_id)?,
                attachment_id: attachment_id.to_string(),
            }),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<u128>().prop_map(Uuid::from_u128)
    }

    fn arb_content_reference() -> impl Strategy<Value = ContentReference> {
        ("[^:]{1,16}", ".{1,24}").prop_filter_map("blank half", |(content_type, id)| {
            ContentReference::new(content_type, id).ok()
        })
    }

    /// Any context the public constructors can build.
    pub(crate) fn arb_context() -> impl Strategy<Value = Context> {
        let jira = (
            arb_uuid(),
            proptest::option::of(arb_uuid()),
            any::<String>(),
            any::<String>(),
        )
            .prop_map(|(cloud_id, environment_id, issue_id, attachment_id)| {
                Context::Jira(JiraContext {
                    cloud_id,
                    environment_id,
                    issue_id,
                    attachment_id,
                })
            });
        let confluence = (
            arb_uuid(),
            proptest::option::of(arb_uuid()),
            arb_content_reference(),
            any::<String>(),
        )
            .prop_map(|(cloud_id, environment_id, parent_id, attachment_id)| {
                Context::Confluence(ConfluenceContext {
                    cloud_id,
                    environment_id,
                    parent_id,
                    attachment_id,
                })
            });
        prop_oneof![jira, confluence]
    }

    proptest! {
        #[test]
        fn any_context_round_trips_through_claims(context in arb_context()) {
            let restored = Context::from_claims(context.to_claims());
            prop_assert_eq!(restored, Ok(context));
        }
    }

    fn cloud() -> Uuid {
        Uuid::parse_str("5d3d5c8c-8d5e-4b33-9c0f-6f0a3f7e2c11").unwrap()
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn jira() -> Context {
        Context::Jira(JiraContext {
            cloud_id: cloud(),
            environment_id: Some(Uuid::new_v4()),
            issue_id: "10042".to_string(),
            attachment_id: "att-1".to_string(),
        })
    }

    fn confluence() -> Context {
        Context::Confluence(ConfluenceContext {
            cloud_id: cloud(),
            environment_id: None,
            parent_id: ContentReference::parse("page:98305").unwrap(),
            attachment_id: "att-2".to_string(),
        })
    }

    #[test]
    fn contexts_round_trip_through_claims() {
        for context in [jira(), confluence()] {
            let restored = Context::from_claims(context.to_claims()).unwrap();
            assert_eq!(restored, context);
        }
    }

    #[test]
    fn claims_use_camel_case_and_product_tag() {
        let claims = confluence().to_claims();
        assert_eq!(claims["product"], "CONFLUENCE");
        assert_eq!(claims["parentId"], "page:98305");
        assert_eq!(claims["attachmentId"], "att-2");
        assert!(!claims.contains_key("environmentId"));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let claims = as_map(json!({
            "product": "CONFLUENCE",
            "cloudId": cloud(),
            "parentId": "page:98305"
        }));
        assert!(Context::from_claims(claims).is_err());
    }

    #[test]
    fn unknown_product_tag_is_malformed() {
        let claims = as_map(json!({
            "product": "BITBUCKET",
            "cloudId": cloud(),
            "issueId": "1",
            "attachmentId": "2"
        }));
        assert!(Context::from_claims(claims).is_err());
    }

    #[test]
    fn tag_must_match_shape() {
        // Confluence fields under a Jira tag: issueId is missing.
        let claims = as_map(json!({
            "product": "JIRA",
            "cloudId": cloud(),
            "parentId": "page:98305",
            "attachmentId": "att"
        }));
        assert!(Context::from_claims(claims).is_err());
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let claims = as_map(json!({
            "product": "JIRA",
            "cloudId": "not-a-uuid",
            "issueId": "1",
            "attachmentId": "2"
        }));
        assert!(Context::from_claims(claims).is_err());

        let claims = as_map(json!({
            "product": "CONFLUENCE",
            "cloudId": cloud(),
            "parentId": "98305",
            "attachmentId": "2"
        }));
        assert!(Context::from_claims(claims).is_err());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let claims = as_map(json!({
            "product": "JIRA",
            "cloudId": cloud(),
            "issueId": "1",
            "attachmentId": "2",
            "moduleKey": "onlyoffice-docs"
        }));
        let context = Context::from_claims(claims).unwrap();
        assert_eq!(context.product(), Product::Jira);
        assert_eq!(context.attachment_id(), "2");
    }

    #[test]
    fn installation_builds_product_specific_context() {
        let installation = Installation {
            product: Product::Confluence,
            cloud_id: cloud(),
            environment_id: None,
        };
        let context = installation.with_document("page:1", "att").unwrap();
        assert_eq!(context.installation(), installation);
        assert!(installation.with_document("1", "att").is_err());

        let jira = Installation {
            product: Product::Jira,
            ..installation
        };
        assert!(matches!(
            jira.with_document("10001", "att").unwrap(),
            Context::Jira(JiraContext { ref issue_id, .. }) if issue_id == "10001"
        ));
    }

    #[test]
    fn as_confluence_rejects_jira() {
        assert!(confluence().as_confluence().is_ok());
        assert_eq!(
            jira().as_confluence().unwrap_err(),
            UnsupportedProductError(Product::Jira)
        );
    }
}
