// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Services
//!
//! Business logic between the HTTP handlers and the storage traits. Services
//! hold only configuration and `Arc` references to their dependencies and
//! never see HTTP types.
//!
//! All service calls are blocking: each mutation is a synchronous redb write
//! transaction that fsyncs on commit. Handlers call them directly on the Tokio
//! worker thread.

pub mod auth;
pub mod error;
pub mod notes;

pub use auth::{AuthService, TokenPair};
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use notes::{NotesService, Pagination, DEFAULT_PAGE_SIZE};
