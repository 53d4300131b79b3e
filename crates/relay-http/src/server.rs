use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use relay_core::{errors::Error, Result};

use crate::{app, HttpState};

/// Bind the HTTP listener.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("cannot bind HTTP_ADDRESS {addr}: {e}")))
}

/// Serve requests on `listener` until `shutdown` is cancelled, then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    state: HttpState,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(op = "http.serve", %addr, "http server listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!(op = "http.serve", "http server shutting down");
        })
        .await?;
    Ok(())
}
