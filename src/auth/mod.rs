// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! # Authentication Module
//!
//! JWT session handling for the API.
//!
//! ## Auth Flow
//!
//! 1. Client signs up or logs in and receives an access token plus a
//!    refresh token (both HS256, signed with `JWT_SECRET`).
//! 2. Client sends `Authorization: Bearer <access token>` on protected
//!    routes; the [`Auth`] extractor verifies it.
//! 3. When the access token expires, `POST /api/auth/refreshToken`
//!    exchanges the refresh token for a new access token.
//!
//! Token signing and verification are delegated to the `jsonwebtoken`
//! crate; this module only decides claims shape, lifetimes and role gating.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod roles;
pub mod tokens;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use roles::Role;
pub use tokens::TokenIssuer;
