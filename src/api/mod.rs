// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_auth,
    config::Mode,
    error::ErrorBody,
    models::{Note, NoteStatus},
    service::TokenPair,
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod notes;
pub mod validate;

pub fn router(state: AppState, mode: Mode) -> Router {
    let auth_routes = Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/refresh", post(auth::refresh))
        .route("/sign-out", post(auth::sign_out));

    let v1_routes = Router::new()
        .route("/note", post(notes::create_note))
        .route(
            "/note/{id}",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route(
            "/notes",
            get(notes::list_notes).delete(notes::delete_notes),
        )
        .route("/notes/{page}", post(notes::list_notes_extended))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/auth", auth_routes)
        .nest("/api/v1", v1_routes)
        .with_state(state);

    if !mode.is_production() {
        app = app.merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));
    }

    app.layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        auth::sign_up,
        auth::sign_in,
        auth::refresh,
        auth::sign_out,
        notes::create_note,
        notes::get_note,
        notes::update_note,
        notes::delete_note,
        notes::list_notes,
        notes::list_notes_extended,
        notes::delete_notes
    ),
    components(
        schemas(
            Note,
            NoteStatus,
            TokenPair,
            ErrorBody,
            auth::SignUpRequest,
            auth::SignUpResponse,
            auth::SignInRequest,
            auth::RefreshRequest,
            notes::CreateNoteRequest,
            notes::CreateNoteResponse,
            notes::UpdateNoteRequest,
            notes::ListNotesRequest,
            notes::NoteResponse,
            notes::NoteListResponse,
            notes::MessageResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and storage probes"),
        (name = "Auth", description = "Registration and sessions"),
        (name = "Notes", description = "Per-user notes")
    )
)]
pub struct ApiDoc;
