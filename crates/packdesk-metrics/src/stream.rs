// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batches change records from an in-process feed into maintainer runs.

use std::sync::Arc;
use std::time::Duration;

use packdesk_config::StreamConfig;
use packdesk_core::ChangeRecord;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::maintainer::MetricsMaintainer;

/// Totals reported when the consumer stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub batches: u64,
    pub records: u64,
}

/// Accumulates change records into batches of at most `batch_size`, closing
/// a batch early once `batch_window` has passed since its first record.
pub struct StreamConsumer {
    maintainer: Arc<MetricsMaintainer>,
    batch_size: usize,
    batch_window: Duration,
}

impl StreamConsumer {
    pub fn new(maintainer: Arc<MetricsMaintainer>, config: &StreamConfig) -> Self {
        Self {
            maintainer,
            batch_size: config.batch_size.max(1),
            batch_window: config.batch_window(),
        }
    }

    /// Run until cancelled or until every sender is dropped.
    ///
    /// On cancellation the batch being collected is processed, followed by
    /// anything already queued in the channel.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<ChangeRecord>,
        cancel: CancellationToken,
    ) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        let mut open = true;

        while open {
            let first = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                received = rx.recv() => received,
            };
            let Some(first) = first else {
                break;
            };

            let mut batch = Vec::with_capacity(self.batch_size);
            batch.push(first);
            let deadline = Instant::now() + self.batch_window;

            while batch.len() < self.batch_size {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        open = false;
                        break;
                    }
                    received = rx.recv() => match received {
                        Some(record) => batch.push(record),
                        None => {
                            open = false;
                            break;
                        }
                    },
                    _ = sleep_until(deadline) => break,
                }
            }

            self.flush(batch, &mut stats).await;
        }

        rx.close();
        let mut rest = Vec::new();
        while let Ok(record) = rx.try_recv() {
            rest.push(record);
            if rest.len() == self.batch_size {
                self.flush(std::mem::take(&mut rest), &mut stats).await;
            }
        }
        if !rest.is_empty() {
            self.flush(rest, &mut stats).await;
        }

        info!(
            batches = stats.batches,
            records = stats.records,
            "stream consumer stopped"
        );
        stats
    }

    async fn flush(&self, batch: Vec<ChangeRecord>, stats: &mut ConsumerStats) {
        debug!(size = batch.len(), "dispatching change batch");
        self.maintainer.process_batch(&batch).await;
        stats.batches += 1;
        stats.records += batch.len() as u64;
    }
}
