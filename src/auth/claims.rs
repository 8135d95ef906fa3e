// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Distinguishes the two token kinds so a refresh token can never be used
/// as an access token (or the other way around).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Claims carried by every token this service issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    /// User's role at issue time.
    pub role: Role,
    /// Access or refresh.
    pub token_use: TokenUse,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Authenticated user information extracted from a verified token.
///
/// This is the type handlers see; it never carries the raw token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user id (the `sub` claim).
    pub user_id: String,
    /// User's role.
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }

    /// Check if the user has the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        Claims {
            sub: "user_123".to_string(),
            role: Role::Admin,
            token_use: TokenUse::Access,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        }
    }

    #[test]
    fn from_claims_extracts_user_id_and_role() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Admin);
        assert!(user.is_admin());
    }

    #[test]
    fn has_role_checks_privilege() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert!(user.has_role(Role::Admin));
        assert!(user.has_role(Role::User));
    }

    #[test]
    fn token_use_serializes_snake_case() {
        assert_eq!(serde_json::to_value(TokenUse::Access).unwrap(), "access");
        assert_eq!(serde_json::to_value(TokenUse::Refresh).unwrap(), "refresh");
    }
}
