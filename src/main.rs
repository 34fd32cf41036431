mod config;
mod error;
mod payment;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::PortalConfig::from_env().expect("invalid configuration");
    let port = config.port;

    let store = store::supabase::SupabaseStore::new(&config).expect("data store client init failed");
    let payments = payment::client::PaymentClient::new(&config).expect("payment client init failed");
    let state = state::AppState::new(config, Arc::new(store), Arc::new(payments));

    // Spawn background eviction of abandoned booking wizards.
    let _sweeper = services::sweeper::spawn_wizard_sweeper(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "patient portal listening");
    axum::serve(listener, app).await.expect("server failed");
}
