use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, AppState};
use referral_core::{CoreConfig, FileStore, ReferralService, DEFAULT_DATA_DIR};

/// Main entry point for the referral system
///
/// Starts the REST server (port 3000, configurable via REFERRAL_REST_ADDR)
/// over the sharded file store. Credential verification happens at the
/// gateway in front of this service; handlers only consume the identity
/// headers it attaches.
///
/// # Environment Variables
/// - `REFERRAL_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `REFERRAL_DATA_DIR`: Directory for referral document storage
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("referral_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("REFERRAL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting referral REST API on {}", rest_addr);

    let data_dir = std::env::var("REFERRAL_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let data_path = Path::new(&data_dir);
    if !data_path.exists() {
        anyhow::bail!("Data directory does not exist: {}", data_path.display());
    }

    let cfg = CoreConfig::new(data_path.to_path_buf())?;
    let store = Arc::new(FileStore::open(&cfg)?);

    let state = AppState {
        referral_service: ReferralService::new(store),
    };

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
