// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! Stateless envelope codec: AES-256-CBC payload encryption plus RSA-OAEP
//! key wrapping.
//!
//! All functions here are pure with respect to process state; the only
//! side effect is drawing randomness for keys and IVs. Binary fields are
//! wire-encoded uniformly: IV and ciphertext as hex, wrapped keys as base64.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::{rngs::OsRng, RngCore};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use utoipa::ToSchema;
use zeroize::{Zeroize, Zeroizing};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES-256 key length in bytes.
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// Errors surfaced by the envelope layer.
///
/// All variants map to HTTP 400 when they occur during request processing.
/// Messages carry enough detail for the client to diagnose a malformed
/// envelope, never internal state or key material.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Request to a protected route without `encryptedKey`/`payload`.
    #[error("Encrypted key and data required")]
    MissingEnvelope,
    /// RSA-OAEP wrap of a symmetric key failed.
    #[error("key wrap failed: {0}")]
    KeyWrap(String),
    /// RSA-OAEP unwrap failed: bad base64, wrong key, or padding mismatch.
    #[error("key unwrap failed: {0}")]
    KeyUnwrap(String),
    /// AES decrypt failed: bad hex, wrong key, or tampered ciphertext.
    #[error("payload decryption failed: {0}")]
    Decryption(String),
}

/// An ephemeral 32-byte AES key.
///
/// Generated per request (client-side for real traffic, server-side for the
/// self-test endpoints), transported once under RSA-OAEP, and held only for
/// the lifetime of the request that carried it. Zeroed on drop.
#[derive(Clone, Zeroize, zeroize::ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_LEN]);

impl SymmetricKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SYMMETRIC_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        SymmetricKey(bytes)
    }

    /// Build a key from raw bytes, enforcing the AES-256 length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SYMMETRIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::KeyUnwrap(format!(
                "symmetric key must be {SYMMETRIC_KEY_LEN} bytes"
            ))
        })?;
        Ok(SymmetricKey(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key bytes.
        f.write_str("SymmetricKey(..)")
    }
}

/// One symmetrically encrypted payload: `{ iv, encryptedData }`, both hex.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Envelope {
    /// 16-byte CBC initialization vector, hex-encoded.
    pub iv: String,
    /// AES-256-CBC ciphertext with PKCS#7 padding, hex-encoded.
    #[serde(rename = "encryptedData")]
    pub encrypted_data: String,
}

/// The full inbound request body shape for protected routes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EncryptedRequest {
    /// The symmetric key wrapped with RSA-OAEP, base64-encoded.
    #[serde(rename = "encryptedKey")]
    pub encrypted_key: String,
    /// The encrypted JSON body.
    pub payload: Envelope,
}

/// Encrypt a plaintext under `key` with a fresh random IV.
///
/// The IV is unique per call; reusing one under the same key would break
/// confidentiality for CBC mode.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Envelope {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Envelope {
        iv: hex::encode(iv),
        encrypted_data: hex::encode(ciphertext),
    }
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// Fails with [`CryptoError::Decryption`] on malformed hex, a wrong-length
/// IV, a wrong key, or tampered ciphertext. Padding failures never surface
/// as anything other than this error.
pub fn decrypt(key: &SymmetricKey, envelope: &Envelope) -> Result<Vec<u8>, CryptoError> {
    let iv_bytes = hex::decode(&envelope.iv)
        .map_err(|_| CryptoError::Decryption("iv is not valid hex".into()))?;
    let iv: [u8; IV_LEN] = iv_bytes
        .try_into()
        .map_err(|_| CryptoError::Decryption(format!("iv must be {IV_LEN} bytes")))?;

    let ciphertext = hex::decode(&envelope.encrypted_data)
        .map_err(|_| CryptoError::Decryption("encryptedData is not valid hex".into()))?;

    Aes256CbcDec::new(key.as_bytes().into(), (&iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CryptoError::Decryption("bad padding or wrong key".into()))
}

/// Wrap a symmetric key under an RSA public key with OAEP (SHA-256).
pub fn wrap_key(key: &SymmetricKey, public_key: &RsaPublicKey) -> Result<String, CryptoError> {
    let wrapped = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_bytes())
        .map_err(|e| CryptoError::KeyWrap(e.to_string()))?;
    Ok(BASE64.encode(wrapped))
}

/// Unwrap a base64 RSA-OAEP wrapped key with the private key.
pub fn unwrap_key(wrapped: &str, private_key: &RsaPrivateKey) -> Result<SymmetricKey, CryptoError> {
    let ciphertext = BASE64
        .decode(wrapped)
        .map_err(|_| CryptoError::KeyUnwrap("encrypted key is not valid base64".into()))?;

    let raw = Zeroizing::new(
        private_key
            .decrypt(Oaep::new::<Sha256>(), &ciphertext)
            .map_err(|_| {
                CryptoError::KeyUnwrap("OAEP unwrap failed (wrong key or corrupted data)".into())
            })?,
    );

    SymmetricKey::from_bytes(&raw)
}
