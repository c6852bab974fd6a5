// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence boundary for users, sessions, and notes.
//!
//! The capability is split into two narrow traits, [`UsersRepository`] and
//! [`NotesRepository`]. Services depend only on the trait they need;
//! [`Repository`] is the intersection used where both are wired together.
//!
//! ## Ownership Scoping
//!
//! Every note operation takes the owning user id and includes it in the lookup
//! predicate. A note that belongs to somebody else is reported exactly like a
//! note that does not exist.
//!
//! ## Backends
//!
//! - [`Database`] - embedded ACID store (redb), one file under `DATA_DIR`

pub mod database;

pub use database::Database;

use chrono::{DateTime, Utc};

use crate::models::{
    NewNote, NewUser, Note, NoteFilter, NoteId, NoteUpdate, Session, User, UserId,
};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True for the "no rows" signal that services translate into domain errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// User and session persistence.
pub trait UsersRepository: Send + Sync {
    /// Persist a new user and return its id.
    ///
    /// Fails with `AlreadyExists` if the login or email is taken.
    fn create_user(&self, user: NewUser) -> StorageResult<UserId>;

    /// Fails with `NotFound` if no user has this login.
    fn get_user_by_login(&self, login: &str) -> StorageResult<User>;

    /// Fails with `NotFound` if no user has this email.
    fn get_user_by_email(&self, email: &str) -> StorageResult<User>;

    /// Look up a user matching both login and password digest.
    fn get_user_by_credentials(&self, login: &str, password_hash: &str) -> StorageResult<User>;

    /// Look up the user currently holding this exact refresh token.
    fn get_user_by_refresh_token(&self, refresh_token: &str) -> StorageResult<User>;

    /// Replace the user's session, invalidating any previous refresh token.
    fn set_session(&self, user_id: UserId, session: Session) -> StorageResult<()>;

    /// Replace the session only if `presented` is still the user's live,
    /// unexpired refresh token at `now`. Check and write share one transaction.
    ///
    /// Fails with `NotFound` if the token was rotated, revoked, or has expired.
    fn rotate_session(
        &self,
        user_id: UserId,
        presented: &str,
        now: DateTime<Utc>,
        next: Session,
    ) -> StorageResult<()>;

    /// Remove the user's session, if any.
    fn clear_session(&self, user_id: UserId) -> StorageResult<()>;
}

/// Note persistence, scoped by owner.
pub trait NotesRepository: Send + Sync {
    fn create_note(&self, note: NewNote) -> StorageResult<NoteId>;

    fn get_note_by_title(&self, title: &str, user_id: UserId) -> StorageResult<Note>;

    fn get_note_by_id(&self, id: NoteId, user_id: UserId) -> StorageResult<Note>;

    /// All notes of the user, ordered by id ascending.
    fn get_notes(&self, user_id: UserId) -> StorageResult<Vec<Note>>;

    /// Filtered listing ordered by id ascending. When both `limit` and `offset`
    /// are zero no pagination is applied.
    fn get_notes_extended(
        &self,
        limit: usize,
        offset: usize,
        filter: NoteFilter,
        user_id: UserId,
    ) -> StorageResult<Vec<Note>>;

    fn update_note(&self, id: NoteId, user_id: UserId, update: &NoteUpdate) -> StorageResult<()>;

    fn delete_note_by_id(&self, id: NoteId, user_id: UserId) -> StorageResult<()>;

    /// Delete every note of the user; returns how many were removed.
    fn delete_notes(&self, user_id: UserId) -> StorageResult<usize>;
}

/// Both capabilities plus a liveness probe.
pub trait Repository: UsersRepository + NotesRepository {
    fn health_check(&self) -> StorageResult<()>;
}
