use super::routes::create_router;
use super::state::AppState;
use anyhow::{Context, Result};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Serve the API on `listener` until `signal` resolves.
///
/// Upgraded websocket connections outlive axum's own connection tracking, so
/// after the listener stops every live session is told to finalize and this
/// waits for them before returning.
pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let services = state.services.clone();
    let on_signal = services.clone();

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move {
            signal.await;
            on_signal.shutdown();
        })
        .await
        .context("HTTP server error")?;

    let live = services.registry.len().await;
    if live > 0 {
        info!("Waiting for {} live sessions to finalize", live);
    }
    services.wait_for_sessions().await;

    Ok(())
}
