// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoints reached through signed URLs.
//!
//! The document server never carries host credentials. It follows the
//! download and save-callback links handed out with an editor session, and
//! the capability token in each link is verified against the link's own path.
//! The host credentials these operations run under are the ones the credential
//! interceptor cached when the editor session was opened.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{CapabilityToken, Principal, VerifiedCapability},
    context::{Context, Product, UnsupportedProductError},
    credentials::{CredentialScope, TenantKeys},
    error::{ApiError, HandlerError},
    state::AppState,
};

/// Document server callback statuses that carry an edited document.
const SAVE_STATUSES: [i32; 2] = [2, 6];

/// Attachment a download link grants, plus the credential that fetches it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSource {
    pub product: Product,
    pub cloud_id: Uuid,
    /// `issue` for Jira, the content type for Confluence.
    pub parent_type: String,
    pub parent_id: String,
    pub attachment_id: String,
    pub credential_scope: CredentialScope,
    /// Epoch milliseconds at which the cached host credential expires.
    pub credential_expires: i64,
}

/// Document server save callback.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CallbackRequest {
    /// Document key the editor session was opened with.
    #[serde(default)]
    pub key: Option<String>,
    /// Document server status code.
    pub status: i32,
    /// Location of the edited document, present when it is ready to save.
    #[serde(default)]
    pub url: Option<String>,
}

/// Acknowledgement in the shape the document server expects.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallbackResponse {
    pub error: i32,
}

#[utoipa::path(
    get,
    path = "/api/v1/download/{product}",
    tag = "Document",
    params(
        ("product" = String, Path, description = "jira or confluence"),
        ("token" = String, Query, description = "Capability token from the signed link")
    ),
    responses(
        (status = 200, body = DocumentSource),
        (status = 400, description = "Link product differs from the token's document"),
        (status = 401, description = "Capability token rejected or no cached credential")
    )
)]
pub async fn download(
    CapabilityToken(capability): CapabilityToken,
    Path(segment): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DocumentSource>, HandlerError> {
    let (context, keys) = resolve(&capability, &segment)?;
    let scope = CredentialScope::User;
    let credential_expires = state
        .credentials
        .expires_at(keys.for_scope(scope), scope)?
        .timestamp_millis();

    let (parent_type, parent_id) = match context {
        Context::Jira(jira) => ("issue".to_string(), jira.issue_id.clone()),
        Context::Confluence(confluence) => (
            confluence.parent_id.content_type().to_string(),
            confluence.parent_id.id().to_string(),
        ),
    };

    Ok(Json(DocumentSource {
        product: context.product(),
        cloud_id: context.cloud_id(),
        parent_type,
        parent_id,
        attachment_id: context.attachment_id().to_string(),
        credential_scope: scope,
        credential_expires,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/callback/{product}",
    tag = "Document",
    request_body = CallbackRequest,
    params(
        ("product" = String, Path, description = "jira or confluence"),
        ("token" = String, Query, description = "Capability token from the signed link")
    ),
    responses(
        (status = 200, body = CallbackResponse),
        (status = 400, description = "Link product differs from the token's document"),
        (status = 401, description = "Capability token rejected or no cached credential")
    )
)]
pub async fn callback(
    CapabilityToken(capability): CapabilityToken,
    Path(segment): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, HandlerError> {
    let (context, keys) = resolve(&capability, &segment)?;

    // Saves can arrive after every user has left the editor.
    if SAVE_STATUSES.contains(&request.status) {
        let scope = CredentialScope::System;
        state.credentials.get(keys.for_scope(scope), scope)?;
    }

    tracing::info!(
        product = %context.product(),
        cloud_id = %context.cloud_id(),
        attachment_id = context.attachment_id(),
        status = request.status,
        key = request.key.as_deref().unwrap_or_default(),
        has_url = request.url.is_some(),
        "Document server callback"
    );

    Ok(Json(CallbackResponse { error: 0 }))
}

/// The token's document, checked against the product in the link path.
fn resolve<'a>(
    capability: &'a VerifiedCapability,
    segment: &str,
) -> Result<(&'a Context, TenantKeys), HandlerError> {
    let product = Product::from_path_segment(segment).ok_or_else(|| {
        ApiError::new(StatusCode::NOT_FOUND, format!("Unknown product '{segment}'"))
    })?;

    let context = &capability.context;
    if context.product() != product {
        return Err(UnsupportedProductError(context.product()).into());
    }

    let principal = Principal::from_capability(capability.subject.clone(), context.clone());
    Ok((context, TenantKeys::for_principal(&principal)))
}
