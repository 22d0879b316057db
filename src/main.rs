use std::{error::Error, time::Duration};

use todo_server::{
    app_state::AppState, data_access::data_context::DataContext, map_routes, settings::Settings,
};
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "todo_server=debug,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── Settings & store ───────────────────────────────────────
    let settings = Settings::load()?;
    let data_context = DataContext::open(&settings.database_path)?;
    info!(path = %settings.database_path, "database opened");

    // ── Shared state ───────────────────────────────────────────
    let state = AppState::new(settings, data_context).shared();

    let (priorities, categories) = state.task_service.ensure_reference_data(&state.settings)?;
    if priorities + categories > 0 {
        info!(priorities, categories, "seeded reference data");
    }

    // ── Session janitor ────────────────────────────────────────
    let janitor_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = janitor_state.sessions.purge_expired();
            if purged > 0 {
                debug!(purged, live = janitor_state.sessions.len(), "expired sessions purged");
            }
        }
    });

    // ── Start ──────────────────────────────────────────────────
    let address = state.settings.bind_address();
    let app = map_routes(state);
    let listener = TcpListener::bind(&address).await?;
    info!("server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
