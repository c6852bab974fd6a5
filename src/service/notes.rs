// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner-scoped note operations.
//!
//! Every call takes the authenticated user id and passes it into the
//! repository lookup, so a note of another user behaves exactly like a
//! missing one.

use std::sync::Arc;

use chrono::NaiveDate;

use super::auth::not_found_as;
use super::error::{ServiceError, ServiceResult};
use crate::models::{NewNote, Note, NoteFilter, NoteId, NoteLookup, NoteStatus, NoteUpdate, UserId};
use crate::storage::{NotesRepository, StorageError};

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// A limit/offset window derived from a 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Pagination {
    /// `page` starts at 1; a zero `limit` falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn from_page(page: usize, limit: usize) -> ServiceResult<Self> {
        if page == 0 {
            return Err(ServiceError::validation("page must be at least 1"));
        }
        let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| ServiceError::validation("page is out of range"))?;
        Ok(Self { limit, offset })
    }
}

pub struct NotesService {
    notes: Arc<dyn NotesRepository>,
}

impl NotesService {
    pub fn new(notes: Arc<dyn NotesRepository>) -> Self {
        Self { notes }
    }

    /// Store a new note. The title is trimmed before the uniqueness check.
    pub fn create_note(&self, mut note: NewNote) -> ServiceResult<NoteId> {
        note.title = note.title.trim().to_string();
        if note.title.is_empty() {
            return Err(ServiceError::validation("title must not be empty"));
        }
        if self.exists(NoteLookup::ByTitle(&note.title), note.user_id)? {
            return Err(ServiceError::NoteExists);
        }

        self.notes.create_note(note).map_err(conflict_as_note_exists)
    }

    pub fn get_note_by_id(&self, id: NoteId, user_id: UserId) -> ServiceResult<Note> {
        self.notes
            .get_note_by_id(id, user_id)
            .map_err(|e| not_found_as(e, ServiceError::NoteNotExists(id)))
    }

    pub fn get_notes(&self, user_id: UserId) -> ServiceResult<Vec<Note>> {
        Ok(self.notes.get_notes(user_id)?)
    }

    /// Filtered, paginated listing. `None` filters are not applied.
    pub fn get_notes_extended(
        &self,
        limit: usize,
        offset: usize,
        status: Option<NoteStatus>,
        date: Option<NaiveDate>,
        user_id: UserId,
    ) -> ServiceResult<Vec<Note>> {
        let filter = NoteFilter { status, date };
        Ok(self.notes.get_notes_extended(limit, offset, filter, user_id)?)
    }

    /// Apply a partial update. A new title may equal the note's current one;
    /// it conflicts only with a different note of the same owner.
    pub fn update_note(&self, id: NoteId, mut update: NoteUpdate, user_id: UserId) -> ServiceResult<()> {
        if update.is_empty() {
            return Err(ServiceError::validation("nothing to update"));
        }
        update.title = update.title.map(|t| t.trim().to_string());
        if update.title.as_deref().is_some_and(str::is_empty) {
            return Err(ServiceError::validation("title must not be empty"));
        }

        let current = self.get_note_by_id(id, user_id)?;

        if let Some(title) = update.title.as_deref().filter(|t| *t != current.title) {
            if self.exists(NoteLookup::ByTitle(title), user_id)? {
                return Err(ServiceError::NoteExists);
            }
        }

        self.notes
            .update_note(id, user_id, &update)
            .map_err(|e| match e {
                StorageError::NotFound(_) => ServiceError::NoteNotExists(id),
                other => conflict_as_note_exists(other),
            })
    }

    pub fn delete_note_by_id(&self, id: NoteId, user_id: UserId) -> ServiceResult<()> {
        if !self.exists(NoteLookup::ById(id), user_id)? {
            return Err(ServiceError::NoteNotExists(id));
        }
        self.notes
            .delete_note_by_id(id, user_id)
            .map_err(|e| not_found_as(e, ServiceError::NoteNotExists(id)))
    }

    /// Remove all of the user's notes. Deleting nothing is not an error.
    pub fn delete_notes(&self, user_id: UserId) -> ServiceResult<usize> {
        let removed = self.notes.delete_notes(user_id)?;
        tracing::debug!(user_id, removed, "Deleted all notes of user");
        Ok(removed)
    }

    /// Whether a note matching `lookup` exists for the owner.
    pub fn exists(&self, lookup: NoteLookup<'_>, user_id: UserId) -> ServiceResult<bool> {
        let found = match lookup {
            NoteLookup::ById(id) => self.notes.get_note_by_id(id, user_id),
            NoteLookup::ByTitle(title) => self.notes.get_note_by_title(title, user_id),
        };
        match found {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn conflict_as_note_exists(err: StorageError) -> ServiceError {
    match err {
        StorageError::AlreadyExists(_) => ServiceError::NoteExists,
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ErrorKind;
    use crate::storage::Database;
    use tempfile::TempDir;

    fn service() -> (NotesService, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open_in(dir.path()).unwrap());
        (NotesService::new(db), dir)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn note(user_id: UserId, title: &str, status: NoteStatus) -> NewNote {
        NewNote {
            user_id,
            title: title.to_string(),
            description: String::new(),
            date: day(1),
            status,
        }
    }

    #[test]
    fn notes_of_other_users_are_not_found() {
        let (notes, _dir) = service();
        let id = notes.create_note(note(1, "Secret", NoteStatus::NotDone)).unwrap();

        let err = notes.get_note_by_id(id, 2).unwrap_err();
        assert!(matches!(err, ServiceError::NoteNotExists(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(notes.get_note_by_id(id, 1).unwrap().title, "Secret");

        // Mutations are scoped the same way
        assert_eq!(
            notes.delete_note_by_id(id, 2).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        let update = NoteUpdate::from_raw("Stolen", "", None);
        assert_eq!(
            notes.update_note(id, update, 2).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn titles_are_unique_per_owner_only() {
        let (notes, _dir) = service();
        notes.create_note(note(1, "Shopping", NoteStatus::NotDone)).unwrap();
        notes.create_note(note(2, "Shopping", NoteStatus::NotDone)).unwrap();

        let err = notes
            .create_note(note(1, "Shopping", NoteStatus::Done))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoteExists));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn blank_title_is_rejected() {
        let (notes, _dir) = service();
        let err = notes.create_note(note(1, "   ", NoteStatus::Done)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn update_changes_only_supplied_fields() {
        let (notes, _dir) = service();
        let id = notes.create_note(note(1, "Groceries", NoteStatus::Done)).unwrap();

        notes
            .update_note(id, NoteUpdate::from_raw("", "new description", None), 1)
            .unwrap();

        let updated = notes.get_note_by_id(id, 1).unwrap();
        assert_eq!(updated.title, "Groceries");
        assert_eq!(updated.description, "new description");
        assert_eq!(updated.status, NoteStatus::Done);
    }

    #[test]
    fn update_title_conflicts_with_sibling_but_not_itself() {
        let (notes, _dir) = service();
        let a = notes.create_note(note(1, "A", NoteStatus::NotDone)).unwrap();
        notes.create_note(note(1, "B", NoteStatus::NotDone)).unwrap();

        notes
            .update_note(a, NoteUpdate::from_raw("A", "", Some(NoteStatus::Done)), 1)
            .unwrap();

        let err = notes
            .update_note(a, NoteUpdate::from_raw("B", "", None), 1)
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoteExists));

        notes.update_note(a, NoteUpdate::from_raw("C", "", None), 1).unwrap();
        assert!(notes.exists(NoteLookup::ByTitle("C"), 1).unwrap());
        assert!(!notes.exists(NoteLookup::ByTitle("A"), 1).unwrap());
    }

    #[test]
    fn empty_update_is_rejected() {
        let (notes, _dir) = service();
        let id = notes.create_note(note(1, "A", NoteStatus::NotDone)).unwrap();

        let err = notes.update_note(id, NoteUpdate::default(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn listing_is_scoped_to_owner() {
        let (notes, _dir) = service();
        notes.create_note(note(1, "X", NoteStatus::NotDone)).unwrap();

        assert_eq!(notes.get_notes(1).unwrap().len(), 1);
        assert!(notes.get_notes(2).unwrap().is_empty());
    }

    #[test]
    fn extended_listing_filters_by_status_with_limit() {
        let (notes, _dir) = service();
        for i in 0..8 {
            let status = if i % 4 == 3 { NoteStatus::NotDone } else { NoteStatus::Done };
            notes.create_note(note(1, &format!("mine {i}"), status)).unwrap();
        }
        notes.create_note(note(2, "theirs", NoteStatus::Done)).unwrap();

        let done = notes
            .get_notes_extended(5, 0, Some(NoteStatus::Done), None, 1)
            .unwrap();
        assert_eq!(done.len(), 5);
        assert!(done.iter().all(|n| n.status == NoteStatus::Done && n.user_id == 1));
        assert!(done.windows(2).all(|w| w[0].id < w[1].id));

        let rest = notes
            .get_notes_extended(5, 5, Some(NoteStatus::Done), None, 1)
            .unwrap();
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn extended_listing_combines_status_and_date() {
        let (notes, _dir) = service();
        let mut first = note(1, "first", NoteStatus::Done);
        first.date = day(2);
        notes.create_note(first).unwrap();
        notes.create_note(note(1, "second", NoteStatus::Done)).unwrap();
        let mut third = note(1, "third", NoteStatus::NotDone);
        third.date = day(2);
        notes.create_note(third).unwrap();

        let matched = notes
            .get_notes_extended(0, 0, Some(NoteStatus::Done), Some(day(2)), 1)
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].title, "first");

        let unfiltered = notes.get_notes_extended(0, 0, None, None, 1).unwrap();
        assert_eq!(unfiltered, notes.get_notes(1).unwrap());
    }

    #[test]
    fn delete_notes_succeeds_with_nothing_to_delete() {
        let (notes, _dir) = service();
        assert_eq!(notes.delete_notes(1).unwrap(), 0);

        notes.create_note(note(1, "A", NoteStatus::NotDone)).unwrap();
        notes.create_note(note(2, "B", NoteStatus::NotDone)).unwrap();
        assert_eq!(notes.delete_notes(1).unwrap(), 1);
        assert_eq!(notes.get_notes(2).unwrap().len(), 1);
    }

    #[test]
    fn delete_missing_note_is_not_found() {
        let (notes, _dir) = service();
        let err = notes.delete_note_by_id(99, 1).unwrap_err();
        assert!(matches!(err, ServiceError::NoteNotExists(99)));
    }

    #[test]
    fn lookup_by_id_is_owner_scoped() {
        let (notes, _dir) = service();
        let id = notes.create_note(note(1, "A", NoteStatus::NotDone)).unwrap();
        assert!(notes.exists(NoteLookup::ById(id), 1).unwrap());
        assert!(!notes.exists(NoteLookup::ById(id), 2).unwrap());

        // A foreign delete leaves the note in place
        assert!(notes.delete_note_by_id(id, 2).is_err());
        notes.delete_note_by_id(id, 1).unwrap();
        assert!(!notes.exists(NoteLookup::ById(id), 1).unwrap());
    }

    #[test]
    fn titles_are_stored_trimmed() {
        let (notes, _dir) = service();
        let id = notes.create_note(note(1, "  Shopping ", NoteStatus::NotDone)).unwrap();
        assert_eq!(notes.get_note_by_id(id, 1).unwrap().title, "Shopping");

        let err = notes.create_note(note(1, "Shopping  ", NoteStatus::NotDone)).unwrap_err();
        assert!(matches!(err, ServiceError::NoteExists));

        let other = notes.create_note(note(1, "Bills", NoteStatus::NotDone)).unwrap();
        let err = notes
            .update_note(other, NoteUpdate::from_raw(" Shopping", "", None), 1)
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoteExists));

        notes.update_note(id, NoteUpdate::from_raw(" Food ", "", None), 1).unwrap();
        assert_eq!(notes.get_note_by_id(id, 1).unwrap().title, "Food");

        let err = notes.create_note(note(1, "   ", NoteStatus::NotDone)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn pagination_from_page() {
        assert_eq!(
            Pagination::from_page(1, 0).unwrap(),
            Pagination { limit: 5, offset: 0 }
        );
        assert_eq!(
            Pagination::from_page(3, 10).unwrap(),
            Pagination { limit: 10, offset: 20 }
        );
        assert_eq!(
            Pagination::from_page(0, 5).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }
}
