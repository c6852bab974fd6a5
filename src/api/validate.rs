// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request field checks shared by the handlers.

use chrono::{NaiveDate, Utc};

use crate::error::ApiError;
use crate::models::{parse_note_date, NoteStatus};

pub const LOGIN_LEN: (usize, usize) = (2, 64);
pub const EMAIL_LEN: (usize, usize) = (6, 64);
pub const PASSWORD_LEN: (usize, usize) = (8, 64);
pub const TITLE_LEN: (usize, usize) = (1, 80);

/// Require `value` to be between `min` and `max` characters inclusive.
pub fn length(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::bad_request(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

/// Require an address shaped like `local@domain.tld`.
pub fn email(value: &str) -> Result<(), ApiError> {
    length("email", value, EMAIL_LEN)?;

    let invalid = || ApiError::bad_request("email is not a valid address");
    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !host.starts_with('.') && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Title of a new or renamed note; surrounding whitespace does not count.
pub fn title(value: &str) -> Result<(), ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    length("title", value, TITLE_LEN)
}

/// Parse an optional status; absent or empty means `None`.
pub fn status(raw: Option<&str>) -> Result<Option<NoteStatus>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: crate::models::InvalidStatus| ApiError::bad_request(e.to_string())),
        None => Ok(None),
    }
}

/// Parse an optional `YYYY-MM-DD` date; absent or empty means `None`.
pub fn date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_note_date(s)
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("invalid date {s:?}, expected YYYY-MM-DD"))),
        None => Ok(None),
    }
}

/// Today's date in UTC, used when a note is created without one.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a path parameter that must be a positive integer.
pub fn positive_id(name: &str, raw: &str) -> Result<u64, ApiError> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("{name} must be a positive integer"))),
    }
}
