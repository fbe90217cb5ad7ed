// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of store, maintainer and reader from configuration.

use std::sync::Arc;

use packdesk_config::PackdeskConfig;
use packdesk_core::{ChangeRecord, Clock, MetricsCache, PackdeskError, SystemClock};
use packdesk_metrics::{CustomerReader, MetricsMaintainer, ReaderOptions};
use packdesk_storage::SqliteStore;
use tokio::sync::mpsc;
use tracing::info;

/// The assembled service components.
pub struct Stack {
    pub store: Arc<SqliteStore>,
    /// Absent when the cache is disabled.
    pub maintainer: Option<Arc<MetricsMaintainer>>,
    pub reader: Arc<CustomerReader>,
}

impl Stack {
    /// Open the database and build the components. With `feed`, every order
    /// write emits a change record into it.
    pub async fn open(
        config: &PackdeskConfig,
        feed: Option<mpsc::Sender<ChangeRecord>>,
    ) -> Result<Self, PackdeskError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let mut store = SqliteStore::open(&config.storage)
            .await?
            .with_clock(clock.clone());
        if let Some(feed) = feed {
            store = store.with_change_feed(feed);
        }
        let store = Arc::new(store);

        let cache: Option<Arc<dyn MetricsCache>> = config
            .cache
            .enabled
            .then(|| store.clone() as Arc<dyn MetricsCache>);
        let maintainer = cache.as_ref().map(|cache| {
            Arc::new(MetricsMaintainer::new(
                store.clone(),
                cache.clone(),
                clock.clone(),
                config.cache.ttl(),
            ))
        });
        if maintainer.is_none() {
            info!("metrics cache disabled, reads will aggregate orders directly");
        }

        let reader = Arc::new(CustomerReader::new(
            store.clone(),
            cache,
            clock,
            ReaderOptions::from_config(&config.cache, &config.gateway),
        ));

        Ok(Self {
            store,
            maintainer,
            reader,
        })
    }

    /// The maintainer, or an error explaining that the cache is off.
    pub fn require_maintainer(&self) -> Result<&Arc<MetricsMaintainer>, PackdeskError> {
        self.maintainer.as_ref().ok_or_else(|| {
            PackdeskError::Config("metrics cache is disabled ([cache] enabled = false)".into())
        })
    }
}
