// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Todo List Server - Multi-tenant Notes Backend
//!
//! Users register, sign in with login and password, and manage their own
//! notes over a JSON REST API. Access is granted by short-lived bearer tokens
//! and renewed with single-use refresh tokens.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password hashing, tokens, and request authentication
//! - `service` - Auth and notes business logic
//! - `storage` - Repository traits and the embedded database (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod state;
pub mod storage;
