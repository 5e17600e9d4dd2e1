//! Lazy catalog index fetch
//!
//! Any failure here degrades to "catalog unavailable": a user with a
//! populated local configuration must never be blocked by the network.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::interaction::Interaction;
use crate::catalog::{
    AssetIndex, CachedIndexRecord, CatalogClient, IndexCache, ModuleRef, INDEX_CACHE_TTL,
};

/// Hard ceiling on the whole index fetch
pub const INDEX_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay before telling the user the fetch is slow
pub const SLOW_FETCH_NOTICE: Duration = Duration::from_secs(3);

/// Fetch the index, returning `None` when the catalog is unavailable
pub async fn load_index(
    client: Arc<dyn CatalogClient>,
    cache: Arc<dyn IndexCache>,
    configured: &ModuleRef,
    interaction: Arc<dyn Interaction>,
) -> Option<Arc<AssetIndex>> {
    load_index_with_limits(
        client,
        cache,
        configured,
        interaction,
        INDEX_FETCH_TIMEOUT,
        SLOW_FETCH_NOTICE,
    )
    .await
}

const SLOW_FETCH_MESSAGE: &str = "Fetching catalog index is taking longer than usual...";

/// Slow-fetch notice task, aborted when the fetch completes or is dropped
struct NoticeWatcher(JoinHandle<()>);

impl Drop for NoticeWatcher {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub(crate) async fn load_index_with_limits(
    client: Arc<dyn CatalogClient>,
    cache: Arc<dyn IndexCache>,
    configured: &ModuleRef,
    interaction: Arc<dyn Interaction>,
    timeout: Duration,
    notice_after: Duration,
) -> Option<Arc<AssetIndex>> {
    let watcher = NoticeWatcher(tokio::spawn(async move {
        tokio::time::sleep(notice_after).await;
        interaction.notice(SLOW_FETCH_MESSAGE);
    }));

    let result = tokio::time::timeout(timeout, fetch_index(&*client, &*cache, configured)).await;
    drop(watcher);

    match result {
        Ok(Ok(index)) => {
            debug!("Catalog index loaded: {} assets", index.asset_count());
            Some(Arc::new(index))
        }
        Ok(Err(e)) => {
            debug!("Catalog unavailable: {:#}", e);
            None
        }
        Err(_) => {
            debug!("Catalog unavailable: index fetch timed out after {:?}", timeout);
            None
        }
    }
}

async fn fetch_index(
    client: &dyn CatalogClient,
    cache: &dyn IndexCache,
    configured: &ModuleRef,
) -> Result<AssetIndex> {
    match cache.load() {
        Ok(Some(record)) if record.is_usable(configured, Utc::now(), INDEX_CACHE_TTL) => {
            if let Some(module) = record.module_ref() {
                match fetch_concrete(client, &module).await {
                    Ok(index) => {
                        debug!("Using cached index version {}", module);
                        return Ok(index);
                    }
                    Err(e) => debug!("Cached index version {} unusable: {:#}", module, e),
                }
            }
        }
        Ok(_) => {}
        Err(e) => debug!("Ignoring unreadable index cache: {:#}", e),
    }

    let concrete = client.resolve_latest_version(configured).await?;
    let index = fetch_concrete(client, &concrete).await?;

    if let Err(e) = cache.store(&CachedIndexRecord::new(&concrete, Utc::now())) {
        warn!("Failed to save index version to cache: {:#}", e);
    }

    Ok(index)
}

async fn fetch_concrete(client: &dyn CatalogClient, module: &ModuleRef) -> Result<AssetIndex> {
    let fetched = client.fetch(module).await?;
    AssetIndex::from_dir(&fetched.source_dir)
}
