// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! In-memory persistence for users, password-reset OTPs and goals.
//!
//! A single `InMemoryStore` lives behind `Arc<RwLock<_>>` in [`crate::state::AppState`].
//! Handlers take the lock for the duration of one operation; nothing here
//! blocks.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Goal, User};

/// One-time password lifetime for the reset flow.
const OTP_TTL_MINUTES: i64 = 10;

/// A pending password-reset OTP, keyed by user id. Single use.
#[derive(Debug, Clone)]
struct OtpRecord {
    otp: u32,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryStore {
    users: HashMap<String, User>,
    otps: HashMap<String, OtpRecord>,
    goals: HashMap<String, Goal>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    pub fn create_user(&mut self, user: User) -> Result<(), ApiError> {
        if self.users.values().any(|u| u.email == user.email) {
            return Err(ApiError::bad_request("User already exists"));
        }
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.users.values().find(|u| u.email == email).cloned()
    }

    pub fn user_by_id(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).cloned()
    }

    /// Replace a stored user record wholesale. The email must stay unique
    /// across users, same rule as [`Self::create_user`].
    pub fn update_user(&mut self, user: User) -> Result<(), ApiError> {
        if !self.users.contains_key(&user.id) {
            return Err(ApiError::not_found("User not found"));
        }
        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(ApiError::bad_request("User already exists"));
        }
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Remove a user and everything that belongs to them.
    pub fn delete_user(&mut self, user_id: &str) -> Result<(), ApiError> {
        if self.users.remove(user_id).is_none() {
            return Err(ApiError::not_found("User not found"));
        }
        self.otps.remove(user_id);
        self.goals.retain(|_, goal| goal.user_id != user_id);
        Ok(())
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        users
    }

    // -------------------------------------------------------------------------
    // Password-reset OTPs
    // -------------------------------------------------------------------------

    pub fn put_otp(&mut self, user_id: &str, otp: u32) {
        self.otps.insert(
            user_id.to_string(),
            OtpRecord {
                otp,
                created_at: Utc::now(),
            },
        );
    }

    /// Consume the pending OTP for a user. Whatever the outcome, a stored
    /// OTP is good for at most one attempt.
    pub fn take_otp(&mut self, user_id: &str, otp: u32) -> Result<(), ApiError> {
        let Some(record) = self.otps.remove(user_id) else {
            return Err(ApiError::bad_request("Invalid OTP!"));
        };

        if Utc::now() - record.created_at > Duration::minutes(OTP_TTL_MINUTES) {
            return Err(ApiError::bad_request("OTP expired!"));
        }

        if record.otp != otp {
            return Err(ApiError::bad_request("Invalid OTP!"));
        }

        Ok(())
    }

    /// Peek at the pending OTP without consuming it. Test hook standing in
    /// for the email delivery channel.
    #[cfg(test)]
    pub fn pending_otp(&self, user_id: &str) -> Option<u32> {
        self.otps.get(user_id).map(|record| record.otp)
    }

    // -------------------------------------------------------------------------
    // Goals
    // -------------------------------------------------------------------------

    pub fn create_goal(&mut self, user_id: &str, text: String) -> Goal {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let goal = Goal {
            id: id.clone(),
            user_id: user_id.to_string(),
            text,
            created_at: now,
            updated_at: now,
        };
        self.goals.insert(id, goal.clone());
        goal
    }

    pub fn goal_by_id(&self, goal_id: &str) -> Result<Goal, ApiError> {
        self.goals
            .get(goal_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Goal not found"))
    }

    /// Goals owned by one user, oldest first.
    pub fn goals_for_user(&self, user_id: &str) -> Vec<Goal> {
        let mut goals: Vec<Goal> = self
            .goals
            .values()
            .filter(|goal| goal.user_id == user_id)
            .cloned()
            .collect();
        goals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        goals
    }

    /// Every goal in the store, oldest first.
    pub fn all_goals(&self) -> Vec<Goal> {
        let mut goals: Vec<Goal> = self.goals.values().cloned().collect();
        goals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        goals
    }

    pub fn update_goal_text(&mut self, goal_id: &str, text: String) -> Result<Goal, ApiError> {
        let Some(goal) = self.goals.get_mut(goal_id) else {
            return Err(ApiError::not_found("Goal not found"));
        };
        goal.text = text;
        goal.updated_at = Utc::now();
        Ok(goal.clone())
    }

    pub fn delete_goal(&mut self, goal_id: &str) -> Result<(), ApiError> {
        if self.goals.remove(goal_id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("Goal not found"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use axum::http::StatusCode;

    fn sample_user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            full_name: "Test User".into(),
            email: email.to_string(),
            phone_number: None,
            role: Role::User,
            onboarded: false,
            password_hash: "hash".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut store = InMemoryStore::new();
        store.create_user(sample_user("u1", "a@example.com")).unwrap();

        let err = store
            .create_user(sample_user("u2", "a@example.com"))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "User already exists");
    }

    #[test]
    fn update_cannot_steal_another_users_email() {
        let mut store = InMemoryStore::new();
        store.create_user(sample_user("u1", "a@example.com")).unwrap();
        store.create_user(sample_user("u2", "b@example.com")).unwrap();

        let err = store
            .update_user(sample_user("u2", "a@example.com"))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "User already exists");

        // keeping your own email (or moving to a free one) is fine
        store.update_user(sample_user("u2", "b@example.com")).unwrap();
        store.update_user(sample_user("u2", "c@example.com")).unwrap();
    }

    #[test]
    fn user_lookup_by_email_and_id() {
        let mut store = InMemoryStore::new();
        store.create_user(sample_user("u1", "a@example.com")).unwrap();

        assert!(store.user_by_email("a@example.com").is_some());
        assert!(store.user_by_email("b@example.com").is_none());
        assert!(store.user_by_id("u1").is_some());
    }

    #[test]
    fn delete_user_removes_their_goals_and_otp() {
        let mut store = InMemoryStore::new();
        store.create_user(sample_user("u1", "a@example.com")).unwrap();
        store.create_goal("u1", "run".into());
        store.put_otp("u1", 123456);

        store.delete_user("u1").unwrap();
        assert!(store.goals_for_user("u1").is_empty());
        assert!(store.take_otp("u1", 123456).is_err());

        let err = store.delete_user("u1").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn otp_is_single_use() {
        let mut store = InMemoryStore::new();
        store.put_otp("u1", 424242);

        store.take_otp("u1", 424242).unwrap();
        let err = store.take_otp("u1", 424242).unwrap_err();
        assert_eq!(err.message, "Invalid OTP!");
    }

    #[test]
    fn wrong_otp_burns_the_stored_one() {
        let mut store = InMemoryStore::new();
        store.put_otp("u1", 424242);

        let err = store.take_otp("u1", 111111).unwrap_err();
        assert_eq!(err.message, "Invalid OTP!");

        // the stored OTP is gone even after a failed attempt
        let err = store.take_otp("u1", 424242).unwrap_err();
        assert_eq!(err.message, "Invalid OTP!");
    }

    #[test]
    fn expired_otp_is_rejected() {
        let mut store = InMemoryStore::new();
        store.otps.insert(
            "u1".into(),
            OtpRecord {
                otp: 424242,
                created_at: Utc::now() - Duration::minutes(OTP_TTL_MINUTES + 1),
            },
        );

        let err = store.take_otp("u1", 424242).unwrap_err();
        assert_eq!(err.message, "OTP expired!");
    }

    #[test]
    fn goals_are_scoped_per_user() {
        let mut store = InMemoryStore::new();
        let mine = store.create_goal("u1", "learn Rust".into());
        store.create_goal("u2", "learn Go".into());

        let goals = store.goals_for_user("u1");
        assert_eq!(goals, vec![mine]);
        assert_eq!(store.all_goals().len(), 2);
    }

    #[test]
    fn update_goal_bumps_updated_at() {
        let mut store = InMemoryStore::new();
        let goal = store.create_goal("u1", "first".into());

        let updated = store
            .update_goal_text(&goal.id, "second".into())
            .unwrap();
        assert_eq!(updated.text, "second");
        assert!(updated.updated_at >= goal.updated_at);
        assert_eq!(updated.created_at, goal.created_at);
    }

    #[test]
    fn missing_goal_errors_are_404() {
        let mut store = InMemoryStore::new();
        assert_eq!(
            store.goal_by_id("missing").unwrap_err().status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store
                .update_goal_text("missing", "x".into())
                .unwrap_err()
                .status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store.delete_goal("missing").unwrap_err().status,
            StatusCode::NOT_FOUND
        );
    }
}
