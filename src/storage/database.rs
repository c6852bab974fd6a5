// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user/note database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized User (including the current session)
//! - `user_logins`: login → user_id (unique)
//! - `user_emails`: email → user_id (unique)
//! - `refresh_tokens`: refresh token → user_id (at most one per user)
//! - `notes`: note_id → serialized Note
//! - `user_notes`: (user_id, note_id) → () for owner-scoped, id-ordered scans
//! - `note_titles`: (user_id, title) → note_id (title unique per owner)
//! - `sequences`: name → last assigned id

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;

use super::{NotesRepository, Repository, StorageError, StorageResult, UsersRepository};
use crate::models::{
    NewNote, NewUser, Note, NoteFilter, NoteId, NoteUpdate, Session, User, UserId,
};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "notes.redb";

// =============================================================================
// Table Definitions
// =============================================================================

const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

const USER_LOGINS: TableDefinition<&str, u64> = TableDefinition::new("user_logins");

const USER_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("user_emails");

const REFRESH_TOKENS: TableDefinition<&str, u64> = TableDefinition::new("refresh_tokens");

const NOTES: TableDefinition<u64, &[u8]> = TableDefinition::new("notes");

/// Owner index; iterating a `(user_id, *)` range yields note ids ascending.
const USER_NOTES: TableDefinition<(u64, u64), ()> = TableDefinition::new("user_notes");

const NOTE_TITLES: TableDefinition<(u64, &str), u64> = TableDefinition::new("note_titles");

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const USER_SEQUENCE: &str = "users";
const NOTE_SEQUENCE: &str = "notes";

// =============================================================================
// Helpers
// =============================================================================

fn load_json<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StorageResult<Option<T>> {
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Allocate the next id of a sequence inside a write transaction.
fn next_id(txn: &WriteTransaction, sequence: &str) -> StorageResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

fn paginate(notes: Vec<Note>, limit: usize, offset: usize) -> Vec<Note> {
    if limit == 0 && offset == 0 {
        return notes;
    }
    notes.into_iter().skip(offset).take(limit).collect()
}

fn user_not_found(what: impl std::fmt::Display) -> StorageError {
    StorageError::NotFound(format!("User {what}"))
}

fn note_not_found(id: NoteId, user_id: UserId) -> StorageError {
    StorageError::NotFound(format!("Note {id} of user {user_id}"))
}

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID store implementing both repository capabilities.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database file inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> StorageResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }

    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_LOGINS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(REFRESH_TOKENS)?;
            let _ = write_txn.open_table(NOTES)?;
            let _ = write_txn.open_table(USER_NOTES)?;
            let _ = write_txn.open_table(NOTE_TITLES)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Database opened");

        Ok(Self { db })
    }

    fn user_by_index(
        &self,
        index: TableDefinition<'static, &'static str, u64>,
        key: &str,
    ) -> StorageResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(index)?;
        let user_id = match index.get(key)? {
            Some(v) => v.value(),
            None => return Ok(None),
        };
        let users = read_txn.open_table(USERS)?;
        load_json(&users, user_id)
    }

    fn collect_notes(&self, user_id: UserId, filter: NoteFilter) -> StorageResult<Vec<Note>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_NOTES)?;
        let notes = read_txn.open_table(NOTES)?;

        let mut results = Vec::new();
        for entry in index.range((user_id, 0u64)..=(user_id, u64::MAX))? {
            let (key, _) = entry?;
            let (_, note_id) = key.value();
            match load_json::<Note>(&notes, note_id)? {
                Some(note) if filter.matches(&note) => results.push(note),
                Some(_) => {}
                None => {
                    tracing::warn!(note_id, user_id, "Owner index points at a missing note");
                }
            }
        }
        Ok(results)
    }
}

// =============================================================================
// Users
// =============================================================================

impl UsersRepository for Database {
    fn create_user(&self, user: NewUser) -> StorageResult<UserId> {
        let write_txn = self.db.begin_write()?;
        let user_id = {
            let mut logins = write_txn.open_table(USER_LOGINS)?;
            let mut emails = write_txn.open_table(USER_EMAILS)?;

            if logins.get(user.login.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "User with login {}",
                    user.login
                )));
            }
            if emails.get(user.email.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "User with email {}",
                    user.email
                )));
            }

            let user_id = next_id(&write_txn, USER_SEQUENCE)?;
            let record = User {
                id: user_id,
                email: user.email,
                login: user.login,
                password_hash: user.password_hash,
                registered_at: Utc::now(),
                session: None,
            };
            let json = serde_json::to_vec(&record)?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(user_id, json.as_slice())?;
            logins.insert(record.login.as_str(), user_id)?;
            emails.insert(record.email.as_str(), user_id)?;
            user_id
        };
        write_txn.commit()?;
        Ok(user_id)
    }

    fn get_user_by_login(&self, login: &str) -> StorageResult<User> {
        self.user_by_index(USER_LOGINS, login)?
            .ok_or_else(|| user_not_found(format!("with login {login}")))
    }

    fn get_user_by_email(&self, email: &str) -> StorageResult<User> {
        self.user_by_index(USER_EMAILS, email)?
            .ok_or_else(|| user_not_found(format!("with email {email}")))
    }

    fn get_user_by_credentials(&self, login: &str, password_hash: &str) -> StorageResult<User> {
        match self.user_by_index(USER_LOGINS, login)? {
            Some(user) if user.password_hash == password_hash => Ok(user),
            _ => Err(user_not_found("with matching credentials")),
        }
    }

    fn get_user_by_refresh_token(&self, refresh_token: &str) -> StorageResult<User> {
        self.user_by_index(REFRESH_TOKENS, refresh_token)?
            .ok_or_else(|| user_not_found("holding refresh token"))
    }

    fn set_session(&self, user_id: UserId, session: Session) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut tokens = write_txn.open_table(REFRESH_TOKENS)?;

            let mut user: User =
                load_json(&users, user_id)?.ok_or_else(|| user_not_found(user_id))?;

            if let Some(previous) = user.session.take() {
                tokens.remove(previous.refresh_token.as_str())?;
            }
            tokens.insert(session.refresh_token.as_str(), user_id)?;
            user.session = Some(session);

            let json = serde_json::to_vec(&user)?;
            users.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn rotate_session(
        &self,
        user_id: UserId,
        presented: &str,
        now: DateTime<Utc>,
        next: Session,
    ) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut tokens = write_txn.open_table(REFRESH_TOKENS)?;

            let holder = tokens.get(presented)?.map(|v| v.value());
            if holder != Some(user_id) {
                return Err(user_not_found("holding refresh token"));
            }

            let mut user: User =
                load_json(&users, user_id)?.ok_or_else(|| user_not_found(user_id))?;
            match user.session.take() {
                Some(current)
                    if current.refresh_token == presented && !current.is_expired_at(now) => {}
                _ => return Err(user_not_found("holding live refresh token")),
            }

            tokens.remove(presented)?;
            tokens.insert(next.refresh_token.as_str(), user_id)?;
            user.session = Some(next);

            let json = serde_json::to_vec(&user)?;
            users.insert(user_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn clear_session(&self, user_id: UserId) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut tokens = write_txn.open_table(REFRESH_TOKENS)?;

            let mut user: User =
                load_json(&users, user_id)?.ok_or_else(|| user_not_found(user_id))?;

            if let Some(previous) = user.session.take() {
                tokens.remove(previous.refresh_token.as_str())?;
                let json = serde_json::to_vec(&user)?;
                users.insert(user_id, json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// Notes
// =============================================================================

impl NotesRepository for Database {
    fn create_note(&self, note: NewNote) -> StorageResult<NoteId> {
        let write_txn = self.db.begin_write()?;
        let note_id = {
            let mut titles = write_txn.open_table(NOTE_TITLES)?;
            if titles.get((note.user_id, note.title.as_str()))?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Note titled {:?} of user {}",
                    note.title, note.user_id
                )));
            }

            let note_id = next_id(&write_txn, NOTE_SEQUENCE)?;
            let record = Note {
                id: note_id,
                user_id: note.user_id,
                title: note.title,
                description: note.description,
                date: note.date,
                status: note.status,
            };
            let json = serde_json::to_vec(&record)?;

            let mut notes = write_txn.open_table(NOTES)?;
            let mut index = write_txn.open_table(USER_NOTES)?;
            notes.insert(note_id, json.as_slice())?;
            index.insert((record.user_id, note_id), ())?;
            titles.insert((record.user_id, record.title.as_str()), note_id)?;
            note_id
        };
        write_txn.commit()?;
        Ok(note_id)
    }

    fn get_note_by_title(&self, title: &str, user_id: UserId) -> StorageResult<Note> {
        let read_txn = self.db.begin_read()?;
        let titles = read_txn.open_table(NOTE_TITLES)?;
        let note_id = titles
            .get((user_id, title))?
            .map(|v| v.value())
            .ok_or_else(|| {
                StorageError::NotFound(format!("Note titled {title:?} of user {user_id}"))
            })?;
        let notes = read_txn.open_table(NOTES)?;
        load_json(&notes, note_id)?.ok_or_else(|| note_not_found(note_id, user_id))
    }

    fn get_note_by_id(&self, id: NoteId, user_id: UserId) -> StorageResult<Note> {
        let read_txn = self.db.begin_read()?;
        let notes = read_txn.open_table(NOTES)?;
        match load_json::<Note>(&notes, id)? {
            Some(note) if note.user_id == user_id => Ok(note),
            _ => Err(note_not_found(id, user_id)),
        }
    }

    fn get_notes(&self, user_id: UserId) -> StorageResult<Vec<Note>> {
        self.collect_notes(user_id, NoteFilter::default())
    }

    fn get_notes_extended(
        &self,
        limit: usize,
        offset: usize,
        filter: NoteFilter,
        user_id: UserId,
    ) -> StorageResult<Vec<Note>> {
        let notes = self.collect_notes(user_id, filter)?;
        Ok(paginate(notes, limit, offset))
    }

    fn update_note(&self, id: NoteId, user_id: UserId, update: &NoteUpdate) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut notes = write_txn.open_table(NOTES)?;
            let mut titles = write_txn.open_table(NOTE_TITLES)?;

            let mut note: Note = match load_json::<Note>(&notes, id)? {
                Some(note) if note.user_id == user_id => note,
                _ => return Err(note_not_found(id, user_id)),
            };

            if let Some(title) = update.title.as_deref().filter(|t| *t != note.title) {
                let holder = titles.get((user_id, title))?.map(|v| v.value());
                if holder.is_some_and(|holder| holder != id) {
                    return Err(StorageError::AlreadyExists(format!(
                        "Note titled {title:?} of user {user_id}"
                    )));
                }
                titles.remove((user_id, note.title.as_str()))?;
                titles.insert((user_id, title), id)?;
            }

            update.apply_to(&mut note);
            let json = serde_json::to_vec(&note)?;
            notes.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete_note_by_id(&self, id: NoteId, user_id: UserId) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut notes = write_txn.open_table(NOTES)?;
            let note: Note = match load_json::<Note>(&notes, id)? {
                Some(note) if note.user_id == user_id => note,
                _ => return Err(note_not_found(id, user_id)),
            };

            notes.remove(id)?;
            write_txn.open_table(USER_NOTES)?.remove((user_id, id))?;
            write_txn
                .open_table(NOTE_TITLES)?
                .remove((user_id, note.title.as_str()))?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete_notes(&self, user_id: UserId) -> StorageResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut index = write_txn.open_table(USER_NOTES)?;
            let mut notes = write_txn.open_table(NOTES)?;
            let mut titles = write_txn.open_table(NOTE_TITLES)?;

            let ids = index
                .range((user_id, 0u64)..=(user_id, u64::MAX))?
                .map(|entry| entry.map(|(key, _)| key.value().1))
                .collect::<Result<Vec<u64>, _>>()?;

            for id in &ids {
                if let Some(note) = load_json::<Note>(&notes, *id)? {
                    titles.remove((user_id, note.title.as_str()))?;
                }
                notes.remove(*id)?;
                index.remove((user_id, *id))?;
            }
            ids.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

impl Repository for Database {
    fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}
