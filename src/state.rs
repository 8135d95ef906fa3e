// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::TokenIssuer;
use crate::crypto::{ExemptRoutes, KeyPairProvider};
use crate::store::InMemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub keys: Arc<KeyPairProvider>,
    pub tokens: Arc<TokenIssuer>,
    pub exempt: Arc<ExemptRoutes>,
}

impl AppState {
    pub fn new(
        store: InMemoryStore,
        keys: KeyPairProvider,
        tokens: TokenIssuer,
        exempt: ExemptRoutes,
    ) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            keys: Arc::new(keys),
            tokens: Arc::new(tokens),
            exempt: Arc::new(exempt),
        }
    }

    /// State wired for tests: empty store, a process-wide RSA test key pair
    /// and a fixed JWT secret.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            store: Arc::new(RwLock::new(InMemoryStore::new())),
            keys: crate::crypto::keys::test_key_pair(),
            tokens: Arc::new(TokenIssuer::new("test-secret")),
            exempt: Arc::new(ExemptRoutes::default()),
        }
    }
}
