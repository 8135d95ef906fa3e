// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `JWT_SECRET` | HS256 signing secret for access/refresh tokens | Required |
//! | `PUBLIC_KEY` | PEM-encoded RSA public key handed to clients | Optional |
//! | `PRIVATE_KEY` | Base64 passphrase-encrypted RSA private key blob | Optional |
//! | `KEY_PASSWORD` | Passphrase for `PRIVATE_KEY` | Required with `PRIVATE_KEY` |
//! | `EXEMPT_ROUTES` | Comma-separated extra paths that skip envelope crypto | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! When the key material variables are absent a fresh RSA key pair is
//! generated at startup. Encrypted traffic then only survives until the
//! next restart, which is fine for development but not for production.

use std::env;

use crate::crypto::{ExemptRoutes, KeyPairProvider, KeySource, StartupKeyError};

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the JWT signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable name for the PEM-encoded RSA public key.
pub const PUBLIC_KEY_ENV: &str = "PUBLIC_KEY";

/// Environment variable name for the base64, passphrase-encrypted RSA
/// private key blob (OpenSSL `Salted__` format).
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Environment variable name for the private key passphrase.
pub const KEY_PASSWORD_ENV: &str = "KEY_PASSWORD";

/// Environment variable name for extra crypto-exempt route paths,
/// comma-separated. Replaces the built-in list when set.
pub const EXEMPT_ROUTES_ENV: &str = "EXEMPT_ROUTES";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 5000;

/// Resolved runtime configuration.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub key_source: KeySource,
    pub exempt_routes: ExemptRoutes,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Only `JWT_SECRET` is strictly required; everything else has a
    /// development-friendly default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var(PORT_ENV) {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let jwt_secret =
            env::var(JWT_SECRET_ENV).map_err(|_| ConfigError::Missing(JWT_SECRET_ENV))?;

        let key_source = KeyPairProvider::source_from_env()?;

        let exempt_routes = match env::var(EXEMPT_ROUTES_ENV) {
            Ok(raw) => ExemptRoutes::from_list(&raw),
            Err(_) => ExemptRoutes::default(),
        };

        Ok(Self {
            host,
            port,
            jwt_secret,
            key_source,
            exempt_routes,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("PORT is not a valid port number: {0}")]
    InvalidPort(String),
    #[error(transparent)]
    Keys(#[from] StartupKeyError),
}
