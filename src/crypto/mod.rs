// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! # Envelope Encryption Layer
//!
//! Hybrid RSA+AES encryption of request and response bodies.
//!
//! ## Scheme
//!
//! 1. The client fetches the server's RSA public key (`GET /api/auth/public-key`).
//! 2. For each request it generates a fresh 32-byte AES key, encrypts the JSON
//!    body with AES-256-CBC under a random IV, and wraps the AES key with
//!    RSA-OAEP. The request body becomes
//!    `{ encryptedKey: base64, payload: { iv: hex, encryptedData: hex } }`.
//! 3. [`middleware::decrypt_request`] unwraps the key, decrypts the body, and
//!    hands the handler plaintext JSON.
//! 4. [`middleware::encrypt_response`] re-encrypts the handler's JSON response
//!    under the same per-request key, so the client can decrypt the reply
//!    without a second key exchange.
//!
//! Bootstrap endpoints (public-key retrieval, signup, login, self-test routes)
//! are listed in [`middleware::ExemptRoutes`] and bypass both stages.

pub mod envelope;
pub mod keys;
pub mod middleware;

pub use envelope::{CryptoError, EncryptedRequest, Envelope, SymmetricKey};
pub use keys::{KeyPairProvider, KeySource, StartupKeyError};
pub use middleware::{ExemptRoutes, RequestCryptoContext};
