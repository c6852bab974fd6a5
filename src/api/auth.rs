// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account and session endpoints.
//!
//! Sign-up, sign-in, and refresh are public. Sign-out needs a valid access
//! token and revokes the caller's refresh token.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validate;
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::UserId,
    service::TokenPair,
    state::AppState,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignUpRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignUpResponse {
    pub id: UserId,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/auth/sign-up",
    tag = "Auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User created", body = SignUpResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Email or login already registered", body = ErrorBody)
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    validate::length("login", &request.login, validate::LOGIN_LEN)?;
    validate::email(&request.email)?;
    validate::length("password", &request.password, validate::PASSWORD_LEN)?;

    let id = state
        .auth
        .sign_up(&request.email, &request.login, &request.password)?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            id,
            message: "User created successfully".to_string(),
        }),
    ))
}

/// Exchange login and password for an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "Auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenPair),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "No user with these credentials", body = ErrorBody)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    validate::length("login", &request.login, validate::LOGIN_LEN)?;
    validate::length("password", &request.password, validate::PASSWORD_LEN)?;

    let tokens = state.auth.sign_in(&request.login, &request.password)?;
    Ok(Json(tokens))
}

/// Rotate the session. The presented refresh token stops working.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 400, description = "Missing refresh token", body = ErrorBody),
        (status = 401, description = "Unknown, rotated, or expired refresh token", body = ErrorBody)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    if request.refresh_token.is_empty() {
        return Err(ApiError::bad_request("refresh_token is required"));
    }

    let tokens = state.auth.refresh_tokens(&request.refresh_token)?;
    Ok(Json(tokens))
}

/// Revoke the caller's session.
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn sign_out(Auth(user): Auth, State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.auth.sign_out(user.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;

    fn sign_up_request(email: &str, login: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    fn sign_in_request(login: &str, password: &str) -> SignInRequest {
        SignInRequest {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    async fn register(state: &AppState, email: &str, login: &str) -> UserId {
        let (status, Json(body)) = sign_up(
            State(state.clone()),
            Json(sign_up_request(email, login, "pw123456")),
        )
        .await
        .expect("sign-up succeeds");
        assert_eq!(status, StatusCode::CREATED);
        body.id
    }

    #[tokio::test]
    async fn sign_up_returns_created_id() {
        let (state, _dir) = AppState::for_tests();

        let (status, Json(body)) = sign_up(
            State(state.clone()),
            Json(sign_up_request("a@x.com", "alice", "pw123456")),
        )
        .await
        .expect("sign-up succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.id, 1);
    }

    #[tokio::test]
    async fn sign_up_conflict_on_duplicate_email() {
        let (state, _dir) = AppState::for_tests();
        register(&state, "a@x.com", "alice").await;

        let err = sign_up(
            State(state.clone()),
            Json(sign_up_request("a@x.com", "bob", "pw654321")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn sign_up_validates_fields() {
        let (state, _dir) = AppState::for_tests();

        for request in [
            sign_up_request("a@x.com", "a", "pw123456"),
            sign_up_request("not-an-email", "alice", "pw123456"),
            sign_up_request("a@x.com", "alice", "short"),
        ] {
            let err = sign_up(State(state.clone()), Json(request)).await.unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn sign_in_and_refresh_flow() {
        let (state, _dir) = AppState::for_tests();
        register(&state, "a@x.com", "alice").await;

        let Json(first) = sign_in(State(state.clone()), Json(sign_in_request("alice", "pw123456")))
            .await
            .expect("sign-in succeeds");

        let Json(second) = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: first.refresh_token.clone(),
            }),
        )
        .await
        .expect("refresh succeeds");
        assert_ne!(second.refresh_token, first.refresh_token);

        let err = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: first.refresh_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_refresh_token_is_unauthorized() {
        let (state, _dir) = AppState::for_tests_with(crate::config::AuthSettings {
            secret: "test-secret".to_string(),
            salt: "test-salt".to_string(),
            access_token_ttl: chrono::Duration::minutes(15),
            refresh_token_ttl: chrono::Duration::seconds(-1),
        });
        register(&state, "a@x.com", "alice").await;
        let Json(tokens) = sign_in(State(state.clone()), Json(sign_in_request("alice", "pw123456")))
            .await
            .unwrap();

        let err = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: tokens.refresh_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_in_with_unknown_credentials_is_not_found() {
        let (state, _dir) = AppState::for_tests();
        let err = sign_in(State(state), Json(sign_in_request("ghost", "pw123456")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sign_out_revokes_refresh_token() {
        let (state, _dir) = AppState::for_tests();
        let user_id = register(&state, "a@x.com", "alice").await;
        let Json(tokens) = sign_in(State(state.clone()), Json(sign_in_request("alice", "pw123456")))
            .await
            .unwrap();

        let status = sign_out(Auth(AuthenticatedUser::new(user_id)), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: tokens.refresh_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
