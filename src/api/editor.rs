// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{Auth, AuthError, RequestIdentity},
    context::{Context, MalformedContextError, Product, UnsupportedProductError},
    credentials::session_expiry,
    error::HandlerError,
    state::AppState,
};

/// Editor bootstrap data.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditorResponse {
    pub product: Product,
    pub attachment_id: String,
    /// Wiki parent content reference (`content-type:id`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<String>,
    /// Epoch milliseconds after which the editor must re-authenticate.
    pub session_expires: i64,
    /// Signed download URL for the document.
    pub document_url: String,
    /// Signed save-callback URL.
    pub callback_url: String,
}

#[utoipa::path(
    get,
    path = "/editor/jira",
    tag = "Editor",
    responses(
        (status = 200, body = EditorResponse),
        (status = 400, description = "Missing credential header or wrong product"),
        (status = 401, description = "Capability token or credentials rejected")
    )
)]
pub async fn jira_editor(
    Auth(identity): Auth,
    State(state): State<AppState>,
) -> Result<Json<EditorResponse>, HandlerError> {
    let context = document_context(&identity)?;
    if context.product() != Product::Jira {
        return Err(UnsupportedProductError(context.product()).into());
    }
    editor_session(&state, &identity, context, None).map(Json)
}

#[utoipa::path(
    get,
    path = "/editor/confluence",
    tag = "Editor",
    responses(
        (status = 200, body = EditorResponse),
        (status = 400, description = "Missing credential header or wrong product"),
        (status = 401, description = "Capability token or credentials rejected")
    )
)]
pub async fn confluence_editor(
    Auth(identity): Auth,
    State(state): State<AppState>,
) -> Result<Json<EditorResponse>, HandlerError> {
    let context = document_context(&identity)?;
    let parent_id = context.as_confluence()?.parent_id.to_string();
    editor_session(&state, &identity, context, Some(parent_id)).map(Json)
}

fn document_context(identity: &RequestIdentity) -> Result<&Context, AuthError> {
    identity.principal.context.as_ref().ok_or_else(|| {
        MalformedContextError("editor principal carries no document context".into()).into()
    })
}

/// Session expiry plus signed document and callback links.
fn editor_session(
    state: &AppState,
    identity: &RequestIdentity,
    context: &Context,
    parent_id: Option<String>,
) -> Result<EditorResponse, HandlerError> {
    let session_expires = session_expiry(
        &state.credentials,
        &identity.keys,
        &state.config.refresh_thresholds,
    )?;

    let product = context.product();
    let subject = &identity.principal.account_id;
    let document_url = state.signer.sign(
        &state.urls.download_url(product),
        subject,
        context,
        state.config.ttl_default,
    )?;
    let callback_url = state.signer.sign(
        &state.urls.callback_url(product),
        subject,
        context,
        state.config.ttl_callback,
    )?;

    Ok(EditorResponse {
        product,
        attachment_id: context.attachment_id().to_string(),
        parent_id,
        session_expires,
        document_url: document_url.to_string(),
        callback_url: callback_url.to_string(),
    })
}
