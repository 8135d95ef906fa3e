// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use goaltrack_server::api::router;
use goaltrack_server::auth::TokenIssuer;
use goaltrack_server::config::Config;
use goaltrack_server::crypto::KeyPairProvider;
use goaltrack_server::state::AppState;
use goaltrack_server::store::InMemoryStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    // Key material problems are fatal; serving protected routes without a
    // working private key would reject every enveloped request.
    let keys = match KeyPairProvider::from_source(&config.key_source) {
        Ok(keys) => keys,
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize RSA key pair");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(
        InMemoryStore::new(),
        keys,
        TokenIssuer::new(&config.jwt_secret),
        config.exempt_routes,
    );
    let app = router(state);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(error = %err, "invalid bind address");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Goaltrack server listening on http://{addr} (docs at /docs)");

    let serve = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal());
    if let Err(err) = serve.await {
        tracing::error!(error = %err, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
