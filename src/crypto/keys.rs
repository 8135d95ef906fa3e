// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! Process-lifetime RSA key pair.
//!
//! The [`KeyPairProvider`] is constructed exactly once at startup and shared
//! immutably (via `Arc` on application state) with both encryption stages.
//! There is no rotation and no retry: malformed or missing key material is a
//! fatal [`StartupKeyError`], because serving traffic with a degraded key is
//! worse than a crashed process.
//!
//! ## Deployment modes
//!
//! - **Generate-on-boot**: a fresh 4096-bit pair per process. Keys are lost
//!   on restart; intended for demo and self-test deployments.
//! - **Load-encrypted**: the private key is provisioned as a base64 blob in
//!   OpenSSL `enc` format (`Salted__` + 8-byte salt + AES-256-CBC
//!   ciphertext of the PEM), decrypted with a PBKDF2-derived key.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::envelope::IV_LEN;
use crate::config;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// RSA modulus size for generated key pairs.
pub const MODULUS_BITS: usize = 4096;

/// PBKDF2 iteration count matching `openssl enc -pbkdf2` defaults.
const KDF_ROUNDS: u32 = 10_000;

/// Derived block: 32-byte AES key followed by a 16-byte IV.
const KDF_OUTPUT_LEN: usize = 48;

/// Magic prefix of an OpenSSL `enc` blob.
const OPENSSL_MAGIC: &[u8; 8] = b"Salted__";

/// Fatal startup errors around key material.
///
/// None of these are retried; `main` logs the error and exits before the
/// server accepts a single connection.
#[derive(Debug, thiserror::Error)]
pub enum StartupKeyError {
    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("encrypted private key is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("encrypted private key blob is truncated or missing its Salted__ header")]
    MalformedBlob,
    #[error("private key decryption failed (wrong passphrase or corrupted blob)")]
    PrivateKeyDecrypt,
    #[error("key material is not valid PEM: {0}")]
    InvalidPem(String),
    #[error("RSA key generation failed: {0}")]
    Generation(#[from] rsa::Error),
}

/// Where the key pair comes from, decided by configuration at startup.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Generate a fresh 4096-bit pair on boot.
    Generate,
    /// Decrypt a pre-provisioned private key.
    Encrypted {
        /// Public key, PEM (SPKI).
        public_key_pem: String,
        /// Base64 of the OpenSSL-encrypted private key PEM.
        private_key_b64: String,
        /// Passphrase for PBKDF2 key derivation.
        passphrase: String,
    },
}

/// Immutable process-wide RSA key pair.
///
/// Safe for unlimited concurrent reads; there is no interior mutability.
pub struct KeyPairProvider {
    public_pem: String,
    public_key: RsaPublicKey,
    private_key: RsaPrivateKey,
}

impl KeyPairProvider {
    /// Build the provider from the configured source.
    pub fn from_source(source: &KeySource) -> Result<Self, StartupKeyError> {
        match source {
            KeySource::Generate => Self::generate(),
            KeySource::Encrypted {
                public_key_pem,
                private_key_b64,
                passphrase,
            } => Self::from_encrypted(public_key_pem, private_key_b64, passphrase),
        }
    }

    /// Generate a fresh 4096-bit pair.
    pub fn generate() -> Result<Self, StartupKeyError> {
        Self::generate_with_bits(MODULUS_BITS)
    }

    fn generate_with_bits(bits: usize) -> Result<Self, StartupKeyError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)?;
        let public_key = RsaPublicKey::from(&private_key);
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| StartupKeyError::InvalidPem(e.to_string()))?;

        Ok(Self {
            public_pem,
            public_key,
            private_key,
        })
    }

    /// Load a pair whose private half is an encrypted-at-rest blob.
    pub fn from_encrypted(
        public_key_pem: &str,
        private_key_b64: &str,
        passphrase: &str,
    ) -> Result<Self, StartupKeyError> {
        let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
            .map_err(|e| StartupKeyError::InvalidPem(e.to_string()))?;

        let private_pem = decrypt_private_key_blob(private_key_b64, passphrase)?;
        let private_key = parse_private_key_pem(&private_pem)?;

        Ok(Self {
            public_pem: public_key_pem.to_string(),
            public_key,
            private_key,
        })
    }

    /// PEM text of the public key. Idempotent and safe to expose over an
    /// unauthenticated endpoint.
    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Process-internal only; never serialized into a response.
    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Resolve the key source from the environment.
    ///
    /// `PRIVATE_KEY` set means load-encrypted mode, which then requires
    /// `PUBLIC_KEY` and `KEY_PASSWORD` as well. There is no silent fallback
    /// to a generated key in that mode.
    pub fn source_from_env() -> Result<KeySource, StartupKeyError> {
        let private_key_b64 = match std::env::var(config::PRIVATE_KEY_ENV) {
            Ok(v) if !v.is_empty() => v,
            _ => return Ok(KeySource::Generate),
        };

        let public_key_pem = std::env::var(config::PUBLIC_KEY_ENV)
            .map_err(|_| StartupKeyError::MissingEnv(config::PUBLIC_KEY_ENV))?;
        let passphrase = std::env::var(config::KEY_PASSWORD_ENV)
            .map_err(|_| StartupKeyError::MissingEnv(config::KEY_PASSWORD_ENV))?;

        Ok(KeySource::Encrypted {
            public_key_pem,
            private_key_b64,
            passphrase,
        })
    }
}

impl std::fmt::Debug for KeyPairProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairProvider")
            .field("public_pem", &self.public_pem)
            .finish_non_exhaustive()
    }
}

/// Decrypt an OpenSSL `enc`-format blob into the private key PEM.
fn decrypt_private_key_blob(
    private_key_b64: &str,
    passphrase: &str,
) -> Result<Zeroizing<String>, StartupKeyError> {
    let blob = BASE64.decode(private_key_b64.trim())?;

    if blob.len() <= 16 || &blob[..8] != OPENSSL_MAGIC {
        return Err(StartupKeyError::MalformedBlob);
    }
    let salt = &blob[8..16];
    let ciphertext = &blob[16..];

    // openssl enc -aes-256-cbc -pbkdf2: 48 derived bytes, split key || iv.
    let mut derived = Zeroizing::new([0u8; KDF_OUTPUT_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, KDF_ROUNDS, derived.as_mut());

    let aes_key: &[u8; 32] = derived[..32].try_into().expect("split is 32 bytes");
    let iv: &[u8; IV_LEN] = derived[32..].try_into().expect("split is 16 bytes");

    let plaintext = Zeroizing::new(
        Aes256CbcDec::new(aes_key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| StartupKeyError::PrivateKeyDecrypt)?,
    );

    String::from_utf8(plaintext.to_vec())
        .map(Zeroizing::new)
        .map_err(|_| StartupKeyError::PrivateKeyDecrypt)
}

/// Accept both PKCS#8 (`BEGIN PRIVATE KEY`) and PKCS#1 (`BEGIN RSA PRIVATE
/// KEY`) encodings; provisioning tooling produces either.
fn parse_private_key_pem(pem: &str) -> Result<RsaPrivateKey, StartupKeyError> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| StartupKeyError::InvalidPem(e.to_string()))
}

/// Shared small-modulus key pair for tests. 4096-bit generation is too slow
/// to repeat per test case.
#[cfg(test)]
pub(crate) fn test_key_pair() -> std::sync::Arc<KeyPairProvider> {
    use std::sync::{Arc, OnceLock};
    static PAIR: OnceLock<Arc<KeyPairProvider>> = OnceLock::new();
    PAIR.get_or_init(|| {
        Arc::new(KeyPairProvider::generate_with_bits(2048).expect("test key generation"))
    })
    .clone()
}
