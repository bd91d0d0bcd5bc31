//! HTTP server lifecycle

use super::handlers::AppState;
use super::router::router;
use lattia_application::RateLimiterRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve the API on `addr` until `shutdown` is cancelled.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically drop rate-limit buckets idle longer than `max_idle`.
pub fn spawn_bucket_eviction(
    limiter: Arc<RateLimiterRegistry>,
    every: Duration,
    max_idle: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    limiter.evict_idle(max_idle);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattia_application::RateLimitParams;

    #[tokio::test]
    async fn test_eviction_task_stops_on_cancel() {
        let limiter = Arc::new(RateLimiterRegistry::new(RateLimitParams::default()));
        limiter.try_acquire(1);
        let token = CancellationToken::new();

        let handle = spawn_bucket_eviction(
            limiter.clone(),
            Duration::from_millis(10),
            Duration::ZERO,
            token.clone(),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.is_empty());

        token.cancel();
        handle.await.unwrap();
    }
}
