use crate::utils::error::{QrError, Result};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// How long in-flight requests may run once shutdown starts.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(120);

/// Serves `app` until `shutdown` resolves, then drains for up to `drain_timeout`.
///
/// Returns [`QrError::ShutdownTimeout`] when in-flight requests outlive the
/// drain window; the caller decides how loudly to exit.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = stop_rx.await;
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        finished = &mut server => {
            // the listener died on its own
            return finished
                .map_err(|e| QrError::transport("API HTTP service", e))?
                .map_err(QrError::IoError);
        }
        _ = shutdown => {}
    }

    tracing::info!("API is exiting safely...");
    let _ = stop_tx.send(());

    match tokio::time::timeout(drain_timeout, server).await {
        Ok(joined) => {
            joined
                .map_err(|e| QrError::transport("API HTTP service", e))?
                .map_err(QrError::IoError)?;
            tracing::info!("API exited successfully. :)");
            Ok(())
        }
        Err(_) => Err(QrError::ShutdownTimeout {
            seconds: drain_timeout.as_secs(),
        }),
    }
}
