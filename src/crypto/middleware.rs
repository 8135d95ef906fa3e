// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! Request/response encryption stages.
//!
//! Two axum middlewares share one per-request symmetric key:
//!
//! - [`decrypt_request`] unwraps the RSA-OAEP key from the inbound envelope,
//!   decrypts the body, and hands the handler plaintext JSON. The handler is
//!   unaware encryption happened.
//! - [`encrypt_response`] wraps the whole stack and re-encrypts the outbound
//!   JSON under the same key before it hits the wire, preserving the status
//!   code and content type.
//!
//! The key travels from the inbound stage to the outbound stage as a
//! [`RequestCryptoContext`] on the response extensions, so the pipeline stays
//! an explicit interceptor chain rather than a patched send function.
//!
//! Layering order matters: `encrypt_response` must be the outermost layer so
//! it observes the response after `decrypt_request` has attached the context.

use std::collections::HashSet;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::envelope::{self, CryptoError, EncryptedRequest, SymmetricKey};
use crate::state::AppState;

/// Upper bound on buffered request/response bodies (2 MiB).
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Routes excluded from the encrypt/decrypt contract.
///
/// Single source of truth for both stages: the bootstrap endpoints a client
/// must reach before it has the server's public key, plus the self-test
/// routes that exercise the codec with plaintext envelopes in the clear.
#[derive(Debug, Clone)]
pub struct ExemptRoutes {
    paths: HashSet<String>,
}

impl ExemptRoutes {
    /// Default bypass set.
    pub const DEFAULT: &'static [&'static str] = &[
        "/api/auth/public-key",
        "/api/auth/signup",
        "/api/auth/login",
        "/api/auth/encrypt-test",
        "/api/auth/decrypt-test",
        "/health",
    ];

    pub fn new(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list of exact paths (the `EXEMPT_ROUTES`
    /// environment variable format).
    pub fn from_list(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from),
        )
    }

    /// Exact-path membership; no prefix matching.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl Default for ExemptRoutes {
    fn default() -> Self {
        Self::new(Self::DEFAULT.iter().map(|p| p.to_string()))
    }
}

/// Per-request crypto state: the symmetric key recovered during inbound
/// decryption, reused for outbound encryption of the same request's response.
/// Dropped (and zeroed) when the response completes.
#[derive(Clone)]
pub struct RequestCryptoContext {
    key: SymmetricKey,
}

impl RequestCryptoContext {
    fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }
}

#[derive(Serialize)]
struct CryptoErrorBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Client-facing 400 for envelope failures. Generic message plus the
/// underlying detail string; never a stack trace or key material.
fn crypto_error_response(err: &CryptoError) -> Response {
    let body = match err {
        CryptoError::MissingEnvelope => CryptoErrorBody {
            message: "Encrypted key and data required",
            error: None,
        },
        _ => CryptoErrorBody {
            message: "Decryption failed",
            error: Some(err.to_string()),
        },
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Inbound decryption stage.
///
/// Exempt routes and body-less requests (GET, DELETE) pass through
/// untouched. Everything else must carry the
/// `{ encryptedKey, payload: { iv, encryptedData } }` shape; a malformed
/// envelope is rejected with 400 before any key material is touched.
pub async fn decrypt_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.exempt.contains(&path) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let (mut parts, body) = request.into_parts();

    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%method, %path, error = %err, "failed to buffer request body");
            return crypto_error_response(&CryptoError::MissingEnvelope);
        }
    };

    // GET/DELETE requests carry no payload to unwrap; the route handler runs
    // without a crypto context and the response goes out in the clear.
    if bytes.is_empty() {
        let request = Request::from_parts(parts, Body::empty());
        return next.run(request).await;
    }

    let envelope: EncryptedRequest = match serde_json::from_slice(&bytes) {
        Ok(envelope) => envelope,
        Err(_) => {
            tracing::warn!(%method, %path, "request body is not an encryption envelope");
            return crypto_error_response(&CryptoError::MissingEnvelope);
        }
    };

    let key = match envelope::unwrap_key(&envelope.encrypted_key, state.keys.private_key()) {
        Ok(key) => key,
        Err(err) => {
            tracing::warn!(%method, %path, error = %err, "symmetric key unwrap failed");
            return crypto_error_response(&err);
        }
    };

    let plaintext = match envelope::decrypt(&key, &envelope.payload) {
        Ok(plaintext) => plaintext,
        Err(err) => {
            tracing::warn!(%method, %path, error = %err, "request body decryption failed");
            return crypto_error_response(&err);
        }
    };

    if serde_json::from_slice::<serde_json::Value>(&plaintext).is_err() {
        tracing::warn!(%method, %path, "decrypted request body is not valid JSON");
        return crypto_error_response(&CryptoError::Decryption(
            "decrypted payload is not valid JSON".into(),
        ));
    }

    // Downstream extractors see a plain JSON request.
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(plaintext.len()));

    let request = Request::from_parts(parts, Body::from(plaintext));

    let mut response = next.run(request).await;
    // Hand the key to the outbound stage.
    response
        .extensions_mut()
        .insert(RequestCryptoContext::new(key));
    response
}

/// Outbound encryption stage.
///
/// If the inbound stage recovered a symmetric key for this request, the
/// response body is replaced with `{ iv, encryptedData }` under that key.
/// Responses on exempt routes, and responses with no key in the context, go
/// out unmodified; the latter is a deliberate fail-open so a bypass-list gap
/// degrades to plaintext instead of a dropped response.
pub async fn encrypt_response(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    let response = next.run(request).await;

    if state.exempt.contains(&path) {
        return response;
    }

    let Some(context) = response.extensions().get::<RequestCryptoContext>().cloned() else {
        tracing::debug!(%method, %path, "no symmetric key for this response; sending plaintext");
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(%method, %path, error = %err, "failed to buffer response body");
            return crate::error::ApiError::internal("Response encoding failed").into_response();
        }
    };

    // Nothing to seal (e.g. 204 No Content).
    if bytes.is_empty() {
        return Response::from_parts(parts, Body::empty());
    }

    let sealed = envelope::encrypt(context.key(), &bytes);
    match serde_json::to_vec(&sealed) {
        Ok(sealed_bytes) => {
            parts
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(sealed_bytes.len()));
            Response::from_parts(parts, Body::from(sealed_bytes))
        }
        Err(err) => {
            // Degrade to plaintext rather than dropping the response.
            tracing::error!(%method, %path, error = %err, "response encryption failed; sending plaintext");
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::crypto::envelope::Envelope;
    use crate::models::{Goal, SignupResponse};
    use axum::http::Method;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::for_tests()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).expect("response body is JSON")
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    /// Signup through the exempt route and return (user_id, bearer token).
    async fn signup(state: &AppState, email: &str) -> (String, String) {
        let response = router(state.clone())
            .oneshot(json_request(
                Method::POST,
                "/api/auth/signup",
                serde_json::json!({
                    "fullName": "Test User",
                    "email": email,
                    "password": "hunter2!",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let signup: SignupResponse = serde_json::from_value(body_json(response).await).unwrap();
        (signup.id, signup.token)
    }

    /// Client side of the envelope scheme.
    fn seal_request(state: &AppState, body: &serde_json::Value) -> (SymmetricKey, serde_json::Value) {
        let key = SymmetricKey::generate();
        let payload = envelope::encrypt(&key, &serde_json::to_vec(body).unwrap());
        let encrypted_key = envelope::wrap_key(&key, state.keys.public_key()).unwrap();
        let wire = serde_json::json!({
            "encryptedKey": encrypted_key,
            "payload": { "iv": payload.iv, "encryptedData": payload.encrypted_data },
        });
        (key, wire)
    }

    #[test]
    fn exempt_routes_from_list_trims_entries() {
        let routes = ExemptRoutes::from_list(" /a , /b,,/c ");
        assert!(routes.contains("/a"));
        assert!(routes.contains("/b"));
        assert!(routes.contains("/c"));
        assert!(!routes.contains("/d"));
    }

    #[test]
    fn exempt_matching_is_exact() {
        let routes = ExemptRoutes::default();
        assert!(routes.contains("/api/auth/public-key"));
        assert!(!routes.contains("/api/auth/public-key/"));
        assert!(!routes.contains("/api/auth"));
    }

    #[tokio::test]
    async fn public_key_endpoint_is_plaintext_both_ways() {
        let state = state();
        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/auth/public-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["publicKey"].as_str().unwrap(),
            state.keys.public_key_pem()
        );
    }

    #[tokio::test]
    async fn missing_envelope_is_rejected_with_400() {
        let state = state();
        let (_, token) = signup(&state, "envelope@example.com").await;

        let mut request = json_request(
            Method::POST,
            "/api/goals",
            serde_json::json!({ "text": "not sealed" }),
        );
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Encrypted key and data required");
    }

    #[tokio::test]
    async fn tampered_wrapped_key_is_rejected_with_400() {
        let state = state();
        let (_, token) = signup(&state, "tamper@example.com").await;

        let (_key, mut wire) = seal_request(&state, &serde_json::json!({ "text": "goal" }));
        wire["encryptedKey"] = serde_json::Value::String("AAAAbm90IGEga2V5".into());

        let mut request = json_request(Method::POST, "/api/goals", wire);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Decryption failed");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn full_round_trip_response_decrypts_under_request_key() {
        let state = state();
        let (user_id, token) = signup(&state, "roundtrip@example.com").await;

        let (key, wire) = seal_request(&state, &serde_json::json!({ "text": "learn rust" }));
        let mut request = json_request(Method::POST, "/api/goals", wire);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // The body on the wire is an envelope, not the goal.
        let sealed: Envelope = serde_json::from_value(body_json(response).await).unwrap();
        let plaintext = envelope::decrypt(&key, &sealed).expect("client can decrypt reply");
        let goal: Goal = serde_json::from_slice(&plaintext).unwrap();

        assert_eq!(goal.user_id, user_id);
        assert_eq!(goal.text, "learn rust");
    }

    #[tokio::test]
    async fn body_less_request_passes_through_in_plaintext() {
        let state = state();
        let (_, token) = signup(&state, "bodyless@example.com").await;

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/goals")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // No inbound key, so the fail-open path sends plaintext JSON.
        let body = body_json(response).await;
        assert!(body.is_array());
    }

    #[tokio::test]
    async fn error_responses_are_sealed_too() {
        let state = state();
        let (_, token) = signup(&state, "sealed-error@example.com").await;

        // Valid envelope around an invalid goal body (missing text).
        let (key, wire) = seal_request(&state, &serde_json::json!({ "note": "no text field" }));
        let mut request = json_request(Method::POST, "/api/goals", wire);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let sealed: Envelope = serde_json::from_value(body_json(response).await).unwrap();
        let plaintext = envelope::decrypt(&key, &sealed).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&plaintext).unwrap();
        assert_eq!(body["error"], "Please add a text field");
    }
}
