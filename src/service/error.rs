// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Service-level errors and their classification.

use crate::auth::{HashError, TokenError};
use crate::models::NoteId;
use crate::storage::StorageError;

/// Coarse error classes the HTTP layer maps onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Auth,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("user with this email or login already exists")]
    UserExists,

    #[error("user does not exist")]
    UserNotExist,

    #[error("refresh token is unknown or has been rotated")]
    SessionNotFound,

    #[error("refresh token has expired")]
    SessionExpired,

    #[error("note with this title already exists")]
    NoteExists,

    #[error("note {0} does not exist")]
    NoteNotExists(NoteId),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::UserNotExist | ServiceError::NoteNotExists(_) => ErrorKind::NotFound,
            ServiceError::UserExists | ServiceError::NoteExists => ErrorKind::Conflict,
            ServiceError::SessionNotFound | ServiceError::SessionExpired => ErrorKind::Auth,
            ServiceError::Token(e) if e.is_rejection() => ErrorKind::Auth,
            ServiceError::Storage(StorageError::AlreadyExists(_)) => ErrorKind::Conflict,
            ServiceError::Token(_) | ServiceError::Hash(_) | ServiceError::Storage(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_are_classified() {
        assert_eq!(ServiceError::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(ServiceError::UserNotExist.kind(), ErrorKind::NotFound);
        assert_eq!(ServiceError::NoteNotExists(3).kind(), ErrorKind::NotFound);
        assert_eq!(ServiceError::UserExists.kind(), ErrorKind::Conflict);
        assert_eq!(ServiceError::NoteExists.kind(), ErrorKind::Conflict);
        assert_eq!(ServiceError::SessionNotFound.kind(), ErrorKind::Auth);
        assert_eq!(ServiceError::SessionExpired.kind(), ErrorKind::Auth);
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        let io = StorageError::Io(std::io::Error::other("disk gone"));
        assert_eq!(ServiceError::from(io).kind(), ErrorKind::Internal);
        assert_eq!(ServiceError::from(TokenError::Random).kind(), ErrorKind::Internal);
        assert_eq!(
            ServiceError::from(TokenError::InvalidSubject).kind(),
            ErrorKind::Auth
        );
    }

    #[test]
    fn racing_uniqueness_violation_is_conflict() {
        let err = ServiceError::from(StorageError::AlreadyExists("login".into()));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
