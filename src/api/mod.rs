// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{credential_interceptor, InterceptorState, PrincipalSource},
    context::Product,
    state::AppState,
};

pub mod authorization;
pub mod document;
pub mod editor;
pub mod health;

pub fn router(state: AppState) -> Router {
    let remote_routes = Router::new()
        .route(
            "/api/v1/remote/authorization",
            post(authorization::authorize),
        )
        .route_layer(from_fn_with_state(
            InterceptorState::new(state.clone(), PrincipalSource::HostInvocation),
            credential_interceptor,
        ));

    let editor_routes = Router::new()
        .route("/editor/jira", get(editor::jira_editor))
        .route("/editor/confluence", get(editor::confluence_editor))
        .route_layer(from_fn_with_state(
            InterceptorState::new(state.clone(), PrincipalSource::Capability),
            credential_interceptor,
        ));

    // Capability token in the link is the only credential.
    let document_routes = Router::new()
        .route("/api/v1/download/{product}", get(document::download))
        .route("/api/v1/callback/{product}", post(document::callback));

    let app_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .merge(document_routes)
        .merge(remote_routes)
        .merge(editor_routes)
        .with_state(state);

    Router::new()
        .merge(app_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        authorization::authorize,
        editor::jira_editor,
        editor::confluence_editor,
        document::download,
        document::callback
    ),
    components(
        schemas(
            Product,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            authorization::AuthorizationRequest,
            authorization::AuthorizationResponse,
            editor::EditorResponse,
            document::DocumentSource,
            document::CallbackRequest,
            document::CallbackResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and dependency checks"),
        (name = "Authorization", description = "Host invocation to capability token exchange"),
        (name = "Editor", description = "Editor session bootstrap"),
        (name = "Document", description = "Signed download and save-callback links")
    )
)]
struct ApiDoc;
