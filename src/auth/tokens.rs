// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! HS256 token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{Claims, TokenUse};
use super::error::AuthError;
use super::roles::Role;
use super::AuthenticatedUser;

/// Access token lifetime: 1 hour.
pub const ACCESS_TTL_SECS: i64 = 60 * 60;

/// Refresh token lifetime: 30 days.
pub const REFRESH_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Signs and verifies the service's JWTs.
///
/// Construct once at startup from `JWT_SECRET` and share via application
/// state.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a short-lived access token.
    pub fn issue_access(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        self.issue(user_id, role, TokenUse::Access, ACCESS_TTL_SECS)
    }

    /// Issue a long-lived refresh token.
    pub fn issue_refresh(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        self.issue(user_id, role, TokenUse::Refresh, REFRESH_TTL_SECS)
    }

    fn issue(
        &self,
        user_id: &str,
        role: Role,
        token_use: TokenUse,
        ttl_secs: i64,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            token_use,
            iat: now,
            exp: now + ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Verify an access token and return the authenticated user.
    pub fn verify_access(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.verify(token, TokenUse::Access)
    }

    /// Verify a refresh token and return the authenticated user.
    pub fn verify_refresh(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.verify(token, TokenUse::Refresh)
    }

    fn verify(&self, token: &str, expected_use: TokenUse) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        let token_data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        if token_data.claims.token_use != expected_use {
            return Err(AuthError::WrongTokenType);
        }

        Ok(AuthenticatedUser::from_claims(token_data.claims))
    }
}
