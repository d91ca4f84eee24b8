// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

use std::{env, net::SocketAddr, process, sync::Arc};

use tracing_subscriber::EnvFilter;

use forum_server::{
    api::router,
    auth::{Role, TokenCodec},
    config::{
        HOST_ENV, LOG_FORMAT_ENV, PORT_ENV, SEED_ADMIN_PASSWORD_ENV, SEED_ADMIN_USERNAME_ENV,
        TOKEN_SECRET_ENV,
    },
    credentials::PasswordHasher,
    objects::InMemoryObjectStore,
    state::AppState,
    store::InMemoryStore,
};

#[tokio::main]
async fn main() {
    init_tracing();

    // Signing-key misconfiguration is fatal here, never per-request.
    let secret = match env::var(TOKEN_SECRET_ENV) {
        Ok(secret) => secret,
        Err(_) => {
            tracing::error!("{TOKEN_SECRET_ENV} is not set; refusing to start");
            process::exit(1);
        }
    };
    let tokens = match TokenCodec::new(secret.as_bytes()) {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!("invalid {TOKEN_SECRET_ENV}: {e}");
            process::exit(1);
        }
    };
    let passwords = PasswordHasher::new(secret.as_bytes());

    let mut store = InMemoryStore::new();
    if let (Ok(username), Ok(password)) = (
        env::var(SEED_ADMIN_USERNAME_ENV),
        env::var(SEED_ADMIN_PASSWORD_ENV),
    ) {
        let digest = passwords.digest(&password);
        match store.create_user(&username, format!("{username}@admin.local"), digest, Role::Admin)
        {
            Ok(admin) => tracing::info!(username = %admin.username, "seeded bootstrap admin"),
            Err(e) => tracing::warn!("bootstrap admin not created: {e}"),
        }
    }

    let state = AppState::new(
        store,
        Arc::new(InMemoryObjectStore::new()),
        tokens,
        passwords,
    );
    let app = router(state);

    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    tracing::info!(%addr, "forum server listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
