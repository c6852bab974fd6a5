// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Models
//!
//! Entities shared by the storage, service, and API layers.
//!
//! ## Ownership
//!
//! Every [`Note`] carries the id of the single [`User`] that owns it, and every
//! repository call that touches notes is scoped by that id. A user holds at most
//! one [`Session`]; writing a new one replaces the previous one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Numeric user identifier assigned by the store on creation.
pub type UserId = u64;

/// Numeric note identifier assigned by the store on creation.
pub type NoteId = u64;

/// Date format accepted and produced for note dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Users & Sessions
// =============================================================================

/// A registered user.
///
/// `password_hash` is the salted digest produced by the credential hasher, never
/// the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub login: String,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
    /// The single live session, if the user has signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

/// Data needed to create a user; the id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub login: String,
    pub password_hash: String,
}

/// The refresh token currently valid for a user and when it stops being valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// =============================================================================
// Notes
// =============================================================================

/// Completion status of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    Done,
    NotDone,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Done => "done",
            NoteStatus::NotDone => "not_done",
        }
    }
}

impl Default for NoteStatus {
    fn default() -> Self {
        NoteStatus::NotDone
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is neither `done` nor `not_done`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status: {0}")]
pub struct InvalidStatus(pub String);

impl FromStr for NoteStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "done" => Ok(NoteStatus::Done),
            "not_done" => Ok(NoteStatus::NotDone),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// A note owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[schema(value_type = String, format = Date, example = "2024-01-31")]
    pub date: NaiveDate,
    pub status: NoteStatus,
}

/// A note about to be created; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub status: NoteStatus,
}

/// Partial update of a note. `None` leaves the field unchanged, so a field
/// cannot be cleared through an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<NoteStatus>,
}

impl NoteUpdate {
    /// Build an update from raw strings where an empty string means "unchanged".
    pub fn from_raw(
        title: &str,
        description: &str,
        status: Option<NoteStatus>,
    ) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            title: non_empty(title),
            description: non_empty(description),
            status,
        }
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }

    /// Apply the supplied fields to `note`.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(description) = &self.description {
            note.description = description.clone();
        }
        if let Some(status) = self.status {
            note.status = status;
        }
    }
}

/// Optional equality filters for note listings. Both filters combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub status: Option<NoteStatus>,
    pub date: Option<NaiveDate>,
}

impl NoteFilter {
    pub fn matches(&self, note: &Note) -> bool {
        self.status.map_or(true, |s| note.status == s) && self.date.map_or(true, |d| note.date == d)
    }
}

/// How a note is looked up for an existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLookup<'a> {
    ById(NoteId),
    ByTitle(&'a str),
}

/// Parse a `YYYY-MM-DD` note date.
pub fn parse_note_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
}
