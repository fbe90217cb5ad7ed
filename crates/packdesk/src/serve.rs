// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `packdesk serve` command implementation.
//!
//! Opens the SQLite store with a change feed, runs the stream consumer that
//! keeps the metrics cache current, sweeps expired cache records on an
//! interval, and serves the HTTP gateway until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use packdesk_config::PackdeskConfig;
use packdesk_core::{MetricsCache, PackdeskError};
use packdesk_gateway::{AppState, AuthConfig};
use packdesk_metrics::StreamConsumer;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::stack::Stack;

/// Runs the `packdesk serve` command.
pub async fn run_serve(config: PackdeskConfig) -> Result<(), PackdeskError> {
    info!(service = %config.service.name, "starting packdesk serve");
    packdesk_metrics::register_metrics();

    let (feed_tx, feed_rx) = mpsc::channel(config.stream.channel_capacity.max(1));
    let feed = config.cache.enabled.then_some(feed_tx);
    let stack = Stack::open(&config, feed).await?;

    let cancel = install_signal_handler();

    let consumer = stack.maintainer.as_ref().map(|maintainer| {
        let consumer = StreamConsumer::new(maintainer.clone(), &config.stream);
        let cancel = cancel.clone();
        info!(
            batch_size = config.stream.batch_size,
            batch_window_ms = config.stream.batch_window_ms,
            "stream consumer started"
        );
        tokio::spawn(consumer.run(feed_rx, cancel))
    });

    let sweeper = config.cache.enabled.then(|| {
        let cache: Arc<dyn MetricsCache> = stack.store.clone();
        let interval = config.cache.purge_interval();
        let cancel = cancel.clone();
        tokio::spawn(async move { expiry_sweeper(cache, interval, cancel).await })
    });

    let state = AppState::new(
        stack.reader.clone(),
        stack.maintainer.clone(),
        stack.store.clone(),
        AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
    );
    let served = packdesk_gateway::start_server(&config.gateway, state, cancel.clone()).await;
    if let Err(e) = &served {
        error!(error = %e, "gateway failed, shutting down");
    }
    cancel.cancel();

    if let Some(handle) = consumer {
        match handle.await {
            Ok(stats) => debug!(batches = stats.batches, records = stats.records, "consumer joined"),
            Err(e) => error!(error = %e, "stream consumer task panicked"),
        }
    }
    if let Some(handle) = sweeper
        && let Err(e) = handle.await
    {
        error!(error = %e, "expiry sweeper task panicked");
    }

    if let Err(e) = stack.store.close().await {
        warn!(error = %e, "WAL checkpoint on shutdown failed");
    }

    info!("packdesk serve shutdown complete");
    served
}

/// Periodically deletes expired cache records. The first tick is skipped.
async fn expiry_sweeper(cache: Arc<dyn MetricsCache>, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match cache.purge_expired().await {
                    Ok(0) => debug!("no expired cache records"),
                    Ok(removed) => info!(removed, "expired cache records purged"),
                    Err(e) => warn!(error = %e, "expiry sweep failed (non-fatal)"),
                }
            }
            _ = cancel.cancelled() => {
                info!("expiry sweeper shutting down");
                break;
            }
        }
    }
}

/// Returns a token cancelled on SIGINT or, on unix, SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("packdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use packdesk_core::Clock;
    use packdesk_test_utils::{FixedClock, MemoryStore};

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_on_each_tick_until_cancelled() {
        let clock = Arc::new(FixedClock::default());
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let mut record = packdesk_metrics::build_metrics_record(
            "c-1",
            &[packdesk_test_utils::OrderBuilder::new("o-1", "c-1")
                .days_before(clock.now(), 1)
                .build()],
            clock.now(),
            chrono::Duration::days(1),
        )
        .unwrap();
        record.ttl = clock.now().timestamp() - 1;
        store.seed_metrics(record).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(expiry_sweeper(
            store.clone(),
            Duration::from_secs(60),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.metrics_len().await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn signal_handler_token_starts_uncancelled() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }
}
