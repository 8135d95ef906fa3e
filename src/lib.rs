// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! Goaltrack - Encrypted Goal-Tracking Backend
//!
//! REST backend for user accounts and goals where every protected request
//! and response body travels as a hybrid RSA+AES envelope. Clients fetch the
//! server's RSA public key once, then wrap a fresh AES-256 key per request;
//! the server re-encrypts each reply under that same key.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - JWT sessions, roles and password hashing
//! - `crypto` - RSA key management and the envelope middleware
//! - `store` - In-memory persistence

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
