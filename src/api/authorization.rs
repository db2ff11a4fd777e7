// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{AppUrls, Auth},
    error::HandlerError,
    state::AppState,
};

/// Document the host frontend wants to open.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// Issue id, or `content-type:id` for wiki content.
    pub parent_id: String,
    /// Attachment id.
    pub entity_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResponse {
    /// Public base URL of this service.
    pub base_url: String,
    /// Capability token for the product's editor page.
    pub token: String,
}

/// Exchange a host invocation for an editor capability token.
#[utoipa::path(
    post,
    path = "/api/v1/remote/authorization",
    request_body = AuthorizationRequest,
    tag = "Authorization",
    responses(
        (status = 200, body = AuthorizationResponse),
        (status = 400, description = "Missing credential header or invalid parent reference"),
        (status = 401, description = "Host token or credentials rejected")
    )
)]
pub async fn authorize(
    Auth(identity): Auth,
    State(state): State<AppState>,
    Json(request): Json<AuthorizationRequest>,
) -> Result<Json<AuthorizationResponse>, HandlerError> {
    let installation = &identity.principal.installation;
    let context = installation.with_document(&request.parent_id, &request.entity_id)?;

    let token = state.tokens.issue(
        &identity.principal.account_id,
        &AppUrls::editor_path(installation.product),
        state.config.ttl_default,
        &context,
    )?;

    tracing::info!(
        product = %installation.product,
        cloud_id = %installation.cloud_id,
        "Issued editor capability token"
    );

    Ok(Json(AuthorizationResponse {
        base_url: state.urls.base().to_string(),
        token,
    }))
}
