// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Credential hashing, bearer tokens, and request authentication.
//!
//! ## Auth Flow
//!
//! 1. Client signs in with login and password
//! 2. Server returns a short-lived access token (HS256 JWT) and an opaque
//!    refresh token bound to the user's single session
//! 3. Client sends `Authorization: Bearer <access token>`
//! 4. Middleware:
//!    - Verifies signature, algorithm, and expiry (no clock-skew leeway)
//!    - Extracts `sub` → numeric `user_id`
//! 5. Client exchanges the refresh token for a new pair before the access
//!    token expires; the old refresh token stops working
//!
//! ## Security
//!
//! - All `/api/v1` endpoints require authentication
//! - Access-token validation is stateless (no revocation list)
//! - Refresh tokens come from the OS CSPRNG

pub mod claims;
pub mod error;
pub mod extractor;
pub mod hasher;
pub mod middleware;
pub mod token;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::Auth;
pub use hasher::{HashError, PasswordHasher, SaltedHasher};
pub use middleware::require_auth;
pub use token::{TokenError, TokenManager};
