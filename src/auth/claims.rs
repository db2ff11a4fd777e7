// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the verified request principal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::context::{Context, Installation};

/// Claims carried by capability tokens minted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityClaims {
    /// Acting account id
    pub sub: String,
    /// The one operation path this token unlocks
    pub aud: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Serialized [`Context`]
    pub context: Map<String, Value>,
}

/// Claims of the host platform's invocation token.
///
/// Only the fields this service reads are modelled; the host sends many more.
#[derive(Debug, Clone, Deserialize)]
pub struct HostClaims {
    /// Account id of the invoking user
    pub sub: String,
    /// Expiration timestamp (validated by jsonwebtoken)
    #[serde(default)]
    #[allow(dead_code)]
    pub exp: i64,
    /// App id the token was issued for
    #[serde(default)]
    pub aud: Option<Audience>,
    /// Installation details
    #[serde(default)]
    pub context: Option<HostContext>,
}

/// `aud` may be a single string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// First audience entry, which names the app.
    pub fn first(&self) -> Option<&str> {
        match self {
            Audience::One(aud) => Some(aud),
            Audience::Many(auds) => auds.first().map(String::as_str),
        }
    }
}

/// Installation part of the host token's `context` claim.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    pub cloud_id: Uuid,
    #[serde(default)]
    pub environment_id: Option<Uuid>,
}

/// Verified identity of the caller.
///
/// Built once at the request boundary and handed to every stage that needs
/// it; there is no ambient lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Account id (token `sub`)
    pub account_id: String,
    /// Installation the request belongs to
    pub installation: Installation,
    /// Document context, present when the principal came from a capability token
    pub context: Option<Context>,
}

impl Principal {
    /// Principal derived from a verified capability token.
    pub fn from_capability(account_id: String, context: Context) -> Self {
        Self {
            account_id,
            installation: context.installation(),
            context: Some(context),
        }
    }

    /// Principal derived from a verified host invocation token.
    pub fn from_host(account_id: String, installation: Installation) -> Self {
        Self {
            account_id,
            installation,
            context: None,
        }
    }
}
