// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Note management API endpoints.
//!
//! All routes sit behind the authentication middleware and act only on the
//! caller's own notes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validate;
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{NewNote, Note, NoteId, NoteUpdate},
    service::Pagination,
    state::AppState,
};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    #[schema(example = "Groceries")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `YYYY-MM-DD`; defaults to today.
    #[schema(example = "2024-01-31")]
    pub date: Option<String>,
    /// `done` or `not_done`; defaults to `not_done`.
    pub status: Option<String>,
}

/// Partial update; empty or missing fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListNotesRequest {
    pub status: Option<String>,
    pub date: Option<String>,
    /// Page size; absent or 0 means 5.
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteResponse {
    pub id: NoteId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub note: Note,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteListResponse {
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Create a note for the authenticated user.
#[utoipa::path(
    post,
    path = "/api/v1/note",
    tag = "Notes",
    security(("bearer" = [])),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = CreateNoteResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Title already used by another note", body = ErrorBody)
    )
)]
pub async fn create_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<CreateNoteResponse>), ApiError> {
    validate::title(&request.title)?;
    let status = validate::status(request.status.as_deref())?.unwrap_or_default();
    let date = validate::date(request.date.as_deref())?.unwrap_or_else(validate::today);

    let id = state.notes.create_note(NewNote {
        user_id: user.user_id,
        title: request.title,
        description: request.description,
        date,
        status,
    })?;

    Ok((StatusCode::CREATED, Json(CreateNoteResponse { id })))
}

#[utoipa::path(
    get,
    path = "/api/v1/note/{id}",
    tag = "Notes",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "Note id")),
    responses(
        (status = 200, body = NoteResponse),
        (status = 400, description = "Invalid id", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such note for this user", body = ErrorBody)
    )
)]
pub async fn get_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NoteResponse>, ApiError> {
    let id = validate::positive_id("id", &id)?;
    let note = state.notes.get_note_by_id(id, user.user_id)?;
    Ok(Json(NoteResponse { note }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/note/{id}",
    tag = "Notes",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "Note id")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 202, description = "Note updated", body = MessageResponse),
        (status = 400, description = "Invalid input or nothing to update", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such note for this user", body = ErrorBody),
        (status = 409, description = "Title already used by another note", body = ErrorBody)
    )
)]
pub async fn update_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let id = validate::positive_id("id", &id)?;
    if !request.title.is_empty() {
        validate::title(&request.title)?;
    }
    let status = validate::status(Some(request.status.as_str()))?;

    let update = NoteUpdate::from_raw(&request.title, &request.description, status);
    if update.is_empty() {
        return Err(ApiError::bad_request(
            "at least one of title, description or status is required",
        ));
    }

    state.notes.update_note(id, update, user.user_id)?;
    Ok((StatusCode::ACCEPTED, MessageResponse::new("Note updated")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/note/{id}",
    tag = "Notes",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse),
        (status = 400, description = "Invalid id", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such note for this user", body = ErrorBody)
    )
)]
pub async fn delete_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = validate::positive_id("id", &id)?;
    state.notes.delete_note_by_id(id, user.user_id)?;
    Ok(MessageResponse::new("Note deleted"))
}

/// List all notes of the authenticated user, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/notes",
    tag = "Notes",
    security(("bearer" = [])),
    responses(
        (status = 200, body = NoteListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_notes(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<NoteListResponse>, ApiError> {
    let notes = state.notes.get_notes(user.user_id)?;
    Ok(Json(NoteListResponse { notes }))
}

/// Filtered, paginated listing. `page` starts at 1.
#[utoipa::path(
    post,
    path = "/api/v1/notes/{page}",
    tag = "Notes",
    security(("bearer" = [])),
    params(("page" = u64, Path, description = "1-based page number")),
    request_body = ListNotesRequest,
    responses(
        (status = 200, body = NoteListResponse),
        (status = 400, description = "Invalid page, limit, status or date", body = ErrorBody),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_notes_extended(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(page): Path<String>,
    Json(request): Json<ListNotesRequest>,
) -> Result<Json<NoteListResponse>, ApiError> {
    let page = validate::positive_id("page", &page)?;
    let limit = match request.limit {
        Some(limit) if limit < 0 => return Err(ApiError::bad_request("limit must not be negative")),
        Some(limit) => limit as usize,
        None => 0,
    };
    let status = validate::status(request.status.as_deref())?;
    let date = validate::date(request.date.as_deref())?;

    let window = Pagination::from_page(page as usize, limit)?;
    let notes = state
        .notes
        .get_notes_extended(window.limit, window.offset, status, date, user.user_id)?;
    Ok(Json(NoteListResponse { notes }))
}

/// Delete every note of the authenticated user.
#[utoipa::path(
    delete,
    path = "/api/v1/notes",
    tag = "Notes",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Notes deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn delete_notes(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state.notes.delete_notes(user.user_id)?;
    Ok(MessageResponse::new(format!("Deleted {removed} notes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::models::NoteStatus;

    fn auth(user_id: u64) -> Auth {
        Auth(AuthenticatedUser::new(user_id))
    }

    fn create_request(title: &str) -> CreateNoteRequest {
        CreateNoteRequest {
            title: title.to_string(),
            ..Default::default()
        }
    }

    async fn create(state: &AppState, user_id: u64, request: CreateNoteRequest) -> NoteId {
        let (status, Json(body)) = create_note(auth(user_id), State(state.clone()), Json(request))
            .await
            .expect("note creation succeeds");
        assert_eq!(status, StatusCode::CREATED);
        body.id
    }

    #[tokio::test]
    async fn create_note_applies_defaults() {
        let (state, _dir) = AppState::for_tests();
        let id = create(&state, 1, create_request("X")).await;

        let Json(body) = get_note(auth(1), State(state.clone()), Path(id.to_string()))
            .await
            .unwrap();
        assert_eq!(body.note.title, "X");
        assert_eq!(body.note.status, NoteStatus::NotDone);
        assert_eq!(body.note.date, validate::today());
    }

    #[tokio::test]
    async fn create_note_rejects_bad_fields() {
        let (state, _dir) = AppState::for_tests();

        let bad_requests = [
            create_request(""),
            create_request(&"t".repeat(81)),
            CreateNoteRequest {
                status: Some("finished".to_string()),
                ..create_request("X")
            },
            CreateNoteRequest {
                date: Some("31-01-2024".to_string()),
                ..create_request("X")
            },
        ];
        for request in bad_requests {
            let err = create_note(auth(1), State(state.clone()), Json(request))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn duplicate_title_conflicts_for_same_user_only() {
        let (state, _dir) = AppState::for_tests();
        create(&state, 1, create_request("Shopping")).await;
        create(&state, 2, create_request("Shopping")).await;

        let err = create_note(auth(1), State(state.clone()), Json(create_request("Shopping")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn notes_of_other_users_are_invisible() {
        let (state, _dir) = AppState::for_tests();
        let id = create(&state, 1, create_request("Private")).await;

        let err = get_note(auth(2), State(state.clone()), Path(id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let Json(listing) = list_notes(auth(2), State(state.clone())).await.unwrap();
        assert!(listing.notes.is_empty());
    }

    #[tokio::test]
    async fn invalid_id_is_bad_request() {
        let (state, _dir) = AppState::for_tests();
        for raw in ["0", "abc", "-3"] {
            let err = get_note(auth(1), State(state.clone()), Path(raw.to_string()))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn update_note_is_partial() {
        let (state, _dir) = AppState::for_tests();
        let id = create(
            &state,
            1,
            CreateNoteRequest {
                status: Some("done".to_string()),
                ..create_request("Groceries")
            },
        )
        .await;

        let (status, _) = update_note(
            auth(1),
            State(state.clone()),
            Path(id.to_string()),
            Json(UpdateNoteRequest {
                description: "new description".to_string(),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);

        let note = state.notes.get_note_by_id(id, 1).unwrap();
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.description, "new description");
        assert_eq!(note.status, NoteStatus::Done);
    }

    #[tokio::test]
    async fn empty_update_is_bad_request() {
        let (state, _dir) = AppState::for_tests();
        let id = create(&state, 1, create_request("A")).await;

        let err = update_note(
            auth(1),
            State(state.clone()),
            Path(id.to_string()),
            Json(UpdateNoteRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn extended_listing_paginates_with_default_limit() {
        let (state, _dir) = AppState::for_tests();
        for i in 0..7 {
            create(&state, 1, create_request(&format!("note {i}"))).await;
        }

        let Json(first) = list_notes_extended(
            auth(1),
            State(state.clone()),
            Path("1".to_string()),
            Json(ListNotesRequest::default()),
        )
        .await
        .unwrap();
        assert_eq!(first.notes.len(), 5);

        let Json(second) = list_notes_extended(
            auth(1),
            State(state.clone()),
            Path("2".to_string()),
            Json(ListNotesRequest::default()),
        )
        .await
        .unwrap();
        assert_eq!(second.notes.len(), 2);
        assert_eq!(second.notes[0].title, "note 5");
    }

    #[tokio::test]
    async fn extended_listing_rejects_bad_page_and_limit() {
        let (state, _dir) = AppState::for_tests();

        let err = list_notes_extended(
            auth(1),
            State(state.clone()),
            Path("0".to_string()),
            Json(ListNotesRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = list_notes_extended(
            auth(1),
            State(state.clone()),
            Path("1".to_string()),
            Json(ListNotesRequest {
                limit: Some(-1),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_notes_succeeds_when_empty() {
        let (state, _dir) = AppState::for_tests();
        let Json(body) = delete_notes(auth(1), State(state.clone())).await.unwrap();
        assert_eq!(body.message, "Deleted 0 notes");
    }

    #[tokio::test]
    async fn delete_note_then_get_is_not_found() {
        let (state, _dir) = AppState::for_tests();
        let id = create(&state, 1, create_request("A")).await;

        let Json(body) = delete_note(auth(1), State(state.clone()), Path(id.to_string()))
            .await
            .unwrap();
        assert_eq!(body.message, "Note deleted");
        let err = get_note(auth(1), State(state.clone()), Path(id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
