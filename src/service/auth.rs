// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-up, sign-in, token refresh, and sign-out.
//!
//! ## Session Lifecycle
//!
//! ```text
//! [Unregistered] --sign_up--> [Registered, NoSession]
//! [NoSession]    --sign_in--> [ActiveSession]
//! [ActiveSession] --sign_in / refresh_tokens--> [ActiveSession] (replaced)
//! [ActiveSession] --sign_out--> [NoSession]
//! ```
//!
//! Every token pair is minted by `new_session`. Sign-in overwrites the stored
//! session; refresh swaps it only while the presented token is still current,
//! so at most one refresh token per user is ever valid and each is spent once.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::error::{ServiceError, ServiceResult};
use crate::auth::{PasswordHasher, TokenManager};
use crate::models::{NewUser, Session, UserId};
use crate::storage::{StorageError, UsersRepository};

/// Access token plus the refresh token that can replace it.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    users: Arc<dyn UsersRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenManager>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenManager>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Register a new user. Email and login are checked independently; either
    /// one being taken is a conflict.
    pub fn sign_up(&self, email: &str, login: &str, password: &str) -> ServiceResult<UserId> {
        if self.is_taken(self.users.get_user_by_email(email))?
            || self.is_taken(self.users.get_user_by_login(login))?
        {
            return Err(ServiceError::UserExists);
        }

        let password_hash = self.hasher.hash(password)?;
        let user_id = self
            .users
            .create_user(NewUser {
                email: email.to_string(),
                login: login.to_string(),
                password_hash,
            })
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => ServiceError::UserExists,
                other => other.into(),
            })?;

        tracing::info!(user_id, "User signed up");
        Ok(user_id)
    }

    pub fn sign_in(&self, login: &str, password: &str) -> ServiceResult<TokenPair> {
        let password_hash = self.hasher.hash(password)?;
        let user = self
            .users
            .get_user_by_credentials(login, &password_hash)
            .map_err(|e| not_found_as(e, ServiceError::UserNotExist))?;

        let tokens = self.create_session(user.id)?;
        tracing::info!(user_id = user.id, "User signed in");
        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair. The presented token is
    /// invalidated by the new session.
    pub fn refresh_tokens(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        let user = self
            .users
            .get_user_by_refresh_token(refresh_token)
            .map_err(|e| not_found_as(e, ServiceError::SessionNotFound))?;

        match &user.session {
            Some(session) if session.refresh_token == refresh_token => {
                if session.is_expired_at(Utc::now()) {
                    tracing::info!(user_id = user.id, "Rejected expired refresh token");
                    return Err(ServiceError::SessionExpired);
                }
            }
            _ => return Err(ServiceError::SessionNotFound),
        }

        let (tokens, next) = self.new_session(user.id)?;
        self.users
            .rotate_session(user.id, refresh_token, Utc::now(), next)
            .map_err(|e| not_found_as(e, ServiceError::SessionNotFound))?;
        tracing::info!(user_id = user.id, "Tokens refreshed");
        Ok(tokens)
    }

    /// Drop the user's session so the current refresh token stops working.
    /// Issued access tokens stay valid until they expire.
    pub fn sign_out(&self, user_id: UserId) -> ServiceResult<()> {
        self.users
            .clear_session(user_id)
            .map_err(|e| not_found_as(e, ServiceError::UserNotExist))?;
        tracing::info!(user_id, "User signed out");
        Ok(())
    }

    fn create_session(&self, user_id: UserId) -> ServiceResult<TokenPair> {
        let (tokens, session) = self.new_session(user_id)?;
        self.users
            .set_session(user_id, session)
            .map_err(|e| not_found_as(e, ServiceError::UserNotExist))?;
        Ok(tokens)
    }

    /// Mint a token pair and the session record backing its refresh token.
    fn new_session(&self, user_id: UserId) -> ServiceResult<(TokenPair, Session)> {
        let access_token = self.tokens.new_access_token(user_id, self.access_ttl)?;
        let refresh_token = self.tokens.new_refresh_token()?;
        let session = Session {
            refresh_token: refresh_token.clone(),
            expires_at: Utc::now() + self.refresh_ttl,
        };

        Ok((
            TokenPair {
                access_token,
                refresh_token,
            },
            session,
        ))
    }

    fn is_taken<T>(&self, lookup: Result<T, StorageError>) -> ServiceResult<bool> {
        match lookup {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Translate the store's "no rows" signal into a domain error.
pub(crate) fn not_found_as(err: StorageError, domain: ServiceError) -> ServiceError {
    if err.is_not_found() {
        domain
    } else {
        err.into()
    }
}
