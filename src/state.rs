// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{SaltedHasher, TokenManager};
use crate::config::AuthSettings;
use crate::service::{AuthService, NotesService};
use crate::storage::Repository;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub notes: Arc<NotesService>,
    /// Used by the middleware to validate access tokens.
    pub tokens: Arc<TokenManager>,
    /// Backing store, for health probes.
    pub repository: Arc<dyn Repository>,
}

impl AppState {
    pub fn new<R: Repository + 'static>(repository: Arc<R>, settings: &AuthSettings) -> Self {
        let tokens = Arc::new(TokenManager::new(&settings.secret));
        let auth = AuthService::new(
            repository.clone(),
            Arc::new(SaltedHasher::new(&settings.salt)),
            tokens.clone(),
            settings.access_token_ttl,
            settings.refresh_token_ttl,
        );
        let notes = NotesService::new(repository.clone());

        Self {
            auth: Arc::new(auth),
            notes: Arc::new(notes),
            tokens,
            repository,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over a throwaway database with fixed test secrets.
    pub(crate) fn for_tests() -> (Self, tempfile::TempDir) {
        Self::for_tests_with(AuthSettings {
            secret: "test-secret".to_string(),
            salt: "test-salt".to_string(),
            access_token_ttl: chrono::Duration::minutes(15),
            refresh_token_ttl: chrono::Duration::days(30),
        })
    }

    pub(crate) fn for_tests_with(settings: AuthSettings) -> (Self, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let db = crate::storage::Database::open_in(dir.path()).unwrap();
        (Self::new(Arc::new(db), &settings), dir)
    }
}
