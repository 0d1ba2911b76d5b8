//! # Hall of Fame/Shame Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod settings;

use std::sync::Arc;

use hof_api::{configure_routes, AppState};
use hof_core::traits::Graffiti;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::Settings;

// Feature-gated imports
#[cfg(feature = "store-local")]
use hof_graffiti_local::LocalGraffiti;

#[cfg(not(feature = "store-local"))]
compile_error!("enable an object store feature, e.g. `store-local`");

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[cfg(feature = "store-local")]
async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn Graffiti>> {
    let store = match &settings.data_path {
        Some(path) => LocalGraffiti::open(path).await?,
        None => {
            info!("HOF_DATA_PATH not set, objects live in memory only");
            LocalGraffiti::new()
        }
    };
    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::load()?;
    init_tracing(settings.log_json);

    // 1. Initialize the object store
    let graffiti = open_store(&settings).await?;

    // 2. Wrap in AppState (dynamic dispatch keeps the store swappable)
    let state = Arc::new(
        AppState::new(graffiti, settings.channels.clone(), settings.max_upload_bytes)
            .with_file_capacity(settings.file_cache_capacity),
    );

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    info!(channels = ?settings.channels, "Hall of Fame/Shame listening on http://{}", settings.bind_addr);

    axum::serve(listener, configure_routes(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}
