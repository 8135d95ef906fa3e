// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    crypto::{
        envelope::{Envelope, EncryptedRequest},
        middleware::{decrypt_request, encrypt_response},
    },
    error::ErrorResponse,
    models::{
        CreateGoalRequest, DecryptTestResponse, DeletedGoalResponse, ForgotPasswordRequest,
        ForgotPasswordResponse, Goal, LoginRequest, MessageResponse, PublicKeyResponse,
        RefreshTokenRequest, ResetPasswordRequest, ResetPasswordResponse, SessionResponse,
        SignupRequest, SignupResponse, TokenResponse, UpdateGoalRequest, UpdateProfileRequest,
        UserSummary, VerifyOtpRequest, VerifyOtpResponse,
    },
    state::AppState,
};

pub mod auth;
pub mod goals;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refreshToken", post(auth::refresh_token))
        .route("/forgotPassword", post(auth::forgot_password))
        .route("/verifyOTP", post(auth::verify_otp))
        .route("/resetPassword", post(auth::reset_password))
        .route("/getUser", get(auth::get_user))
        .route("/updateProfile", put(auth::update_profile))
        .route("/public-key", get(auth::public_key))
        .route("/encrypt-test", post(auth::encrypt_test))
        .route("/decrypt-test", post(auth::decrypt_test))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", delete(users::delete_user));

    let goal_routes = Router::new()
        .route("/", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/{goal_id}",
            put(goals::update_goal).delete(goals::delete_goal),
        )
        .route("/admin/all", get(goals::all_goals))
        .route("/admin/user/{user_id}", get(goals::user_goals))
        .route("/admin/{goal_id}", delete(goals::delete_any_goal));

    // encrypt_response is layered last so it wraps decrypt_request and sees
    // the crypto context the inbound stage attached.
    let api = Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/goals", goal_routes)
        .route("/health", get(health::health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            decrypt_request,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            encrypt_response,
        ))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup,
        auth::login,
        auth::refresh_token,
        auth::forgot_password,
        auth::verify_otp,
        auth::reset_password,
        auth::get_user,
        auth::update_profile,
        auth::public_key,
        auth::encrypt_test,
        auth::decrypt_test,
        users::list_users,
        users::delete_user,
        goals::list_goals,
        goals::create_goal,
        goals::update_goal,
        goals::delete_goal,
        goals::all_goals,
        goals::user_goals,
        goals::delete_any_goal,
        health::health
    ),
    components(
        schemas(
            SignupRequest,
            SignupResponse,
            LoginRequest,
            SessionResponse,
            RefreshTokenRequest,
            TokenResponse,
            ForgotPasswordRequest,
            ForgotPasswordResponse,
            VerifyOtpRequest,
            VerifyOtpResponse,
            ResetPasswordRequest,
            ResetPasswordResponse,
            UpdateProfileRequest,
            UserSummary,
            MessageResponse,
            Goal,
            CreateGoalRequest,
            UpdateGoalRequest,
            DeletedGoalResponse,
            PublicKeyResponse,
            DecryptTestResponse,
            Envelope,
            EncryptedRequest,
            ErrorResponse
        )
    ),
    tags(
        (name = "Auth", description = "Accounts, sessions and password reset"),
        (name = "Goals", description = "Per-user goal CRUD"),
        (name = "Crypto", description = "Key bootstrap and envelope self-tests"),
        (name = "Admin", description = "Administrative user management"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::for_tests());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
