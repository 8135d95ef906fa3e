// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! # API Data Models
//!
//! Request and response structures for the REST API. All wire types use
//! camelCase field names and `_id` identifiers, matching the envelope
//! contract the mobile/web clients already speak.
//!
//! ## Model Categories
//!
//! - **Users**: account records and session responses
//! - **Password reset**: OTP issue/verify/reset round trip
//! - **Goals**: the per-user CRUD resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

// =============================================================================
// User Models
// =============================================================================

/// A stored user account.
///
/// Internal representation; deliberately not `Serialize` so the password
/// hash can never leak into a response body.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub onboarded: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `user` when omitted.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Response for a successful signup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    /// Short-lived access token.
    pub token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Full session payload returned by login, getUser and updateProfile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_logged_in: bool,
    pub onboarded: bool,
    pub role: Role,
    pub token: String,
    /// Only present on login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl SessionResponse {
    pub fn new(user: &User, token: String, refresh_token: Option<String>) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            is_logged_in: true,
            onboarded: user.onboarded,
            role: user.role,
            token,
            refresh_token,
        }
    }
}

/// Request to exchange a refresh token for a fresh access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// A newly issued access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Partial profile update; absent fields keep their current value.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// Required (and verified) when `newPassword` is set.
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Admin-facing user listing entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role,
        }
    }
}

/// Generic confirmation body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Password Reset Models
// =============================================================================

/// Request to start a password reset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Response after an OTP has been issued.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub token: String,
}

/// OTP check submitted by the user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub otp: u32,
}

/// Successful OTP verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub is_verified: bool,
    pub token: String,
}

/// New password after a verified reset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Confirmation of a completed reset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResponse {
    pub is_updated: bool,
}

// =============================================================================
// Goal Models
// =============================================================================

/// A user's goal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning user's id.
    #[serde(rename = "user")]
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a goal. `text` is optional in the type so the handler
/// can answer a missing field with a 400 instead of a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateGoalRequest {
    pub text: Option<String>,
}

/// Request to update a goal's text.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateGoalRequest {
    pub text: Option<String>,
}

/// Body returned after deleting a goal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedGoalResponse {
    pub id: String,
}

// =============================================================================
// Bootstrap Models
// =============================================================================

/// Response of the public-key bootstrap endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    /// PEM-encoded RSA public key.
    pub public_key: String,
}

/// Response of the decrypt self-test endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecryptTestResponse {
    pub decrypted_data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_response_uses_wire_field_names() {
        let user = User {
            id: "u1".into(),
            full_name: "Ada".into(),
            email: "ada@example.com".into(),
            phone_number: None,
            role: Role::User,
            onboarded: false,
            password_hash: "hash".into(),
            created_at: Utc::now(),
        };

        let json =
            serde_json::to_value(SessionResponse::new(&user, "tok".into(), None)).unwrap();
        assert_eq!(json["_id"], "u1");
        assert_eq!(json["fullName"], "Ada");
        assert_eq!(json["isLoggedIn"], true);
        assert!(json.get("refreshToken").is_none());
        assert!(json.get("phoneNumber").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn goal_serializes_with_mongo_style_ids() {
        let now = Utc::now();
        let goal = Goal {
            id: "g1".into(),
            user_id: "u1".into(),
            text: "ship it".into(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["_id"], "g1");
        assert_eq!(json["user"], "u1");
        assert!(json.get("createdAt").is_some());
    }
}
