//! The public entry point: one manager per account.
//!
//! A [`ShareManager`] owns the rate limiter, both caches and the call counter,
//! so independent managers never share state. None of its methods return an
//! error; failures surface as `false`, empty collections or a
//! [`ShareLinkStatus`] carrying the reason.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::api::{RemoteApi, ThrottledApi};
use crate::cache::DirectoryPathCache;
use crate::config::ManagerConfig;
use crate::models::{
    DirEntry, DirectoryEntry, RawEntry, ShareCode, ShareFileNode, ShareLinkStatus,
    TransferBatchResult, ROOT_ID,
};
use crate::path_resolver::{normalize_path, PathResolver};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::share_link::ShareLinkResolver;
use crate::share_status::ShareStatusChecker;
use crate::share_tree::ShareTreeLister;
use crate::transfer::{dedup_ids, TransferEngine, WHOLE_SHARE};

/// Components that need a remote API.
struct Connected {
    api: Arc<ThrottledApi>,
    paths: Arc<PathResolver>,
    status: ShareStatusChecker,
    tree: ShareTreeLister,
    transfer: TransferEngine,
    page_size: u32,
}

/// Resilient orchestration over a storage provider's share API.
pub struct ShareManager {
    links: ShareLinkResolver,
    connected: Option<Connected>,
}

impl ShareManager {
    pub fn new(api: Arc<dyn RemoteApi>, config: ManagerConfig) -> Self {
        Self::with_links(Some(api), config, ShareLinkResolver::new())
    }

    /// A manager without a remote API. Every operation short-circuits to
    /// its benign failure value.
    pub fn unavailable() -> Self {
        Self::with_links(None, ManagerConfig::default(), ShareLinkResolver::new())
    }

    /// Full control over the optional API and the share link resolver.
    pub fn with_links(
        api: Option<Arc<dyn RemoteApi>>,
        config: ManagerConfig,
        links: ShareLinkResolver,
    ) -> Self {
        let connected = api.map(|api| {
            let limiter = RateLimiter::new(config.min_interval, config.jitter_ratio);
            let api = Arc::new(ThrottledApi::new(api, limiter));
            let paths = Arc::new(PathResolver::new(
                Arc::clone(&api),
                DirectoryPathCache::new(config.path_cache_ttl),
            ));

            Connected {
                status: ShareStatusChecker::new(Arc::clone(&api)),
                tree: ShareTreeLister::new(
                    Arc::clone(&api),
                    config.recursion_delay,
                    config.jitter_ratio,
                    config.page_size,
                    config.season_pruning,
                ),
                transfer: TransferEngine::new(
                    Arc::clone(&api),
                    Arc::clone(&paths),
                    RetryPolicy::new(config.max_retries),
                    config.rate_limit_backoff,
                    config.transport_backoff,
                    config.jitter_ratio,
                ),
                page_size: config.page_size.max(1),
                paths,
                api,
            }
        });

        Self { links, connected }
    }

    pub fn is_available(&self) -> bool {
        self.connected.is_some()
    }

    /// Whether the configured credentials are accepted by the provider.
    pub async fn check_login(&self) -> bool {
        let Some(connected) = &self.connected else {
            return false;
        };

        match connected.api.user_info().await {
            Ok(resp) if resp.status.state => {
                let name = match resp.data.uname.as_str() {
                    "" => "unknown",
                    name => name,
                };
                info!("Logged in as {}", name);
                true
            }
            Ok(resp) => {
                warn!(
                    "Login check rejected: {}",
                    resp.status.error_text().unwrap_or("unknown error")
                );
                false
            }
            Err(e) => {
                error!("Login check failed: {}", e);
                false
            }
        }
    }

    /// Parse a share link (memoized).
    pub fn extract_share_info(&self, share_url: &str) -> Option<ShareCode> {
        self.links.resolve(share_url)
    }

    /// Share code with both halves present, as listing and transfer need.
    fn complete_share(&self, share_url: &str) -> Option<ShareCode> {
        let share = self.links.resolve(share_url).filter(ShareCode::is_complete);
        if share.is_none() {
            error!("Invalid share link or parse failure: {}", share_url);
        }
        share
    }

    // -- paths ------------------------------------------------------------

    /// Resolve a logical path to a directory id, optionally creating it.
    pub async fn resolve(&self, path: &str, create_if_missing: bool) -> Option<u64> {
        let connected = self.connected.as_ref()?;
        connected.paths.resolve(path, create_if_missing).await
    }

    /// Immediate children of an existing directory. Empty when the path is
    /// unknown or listing fails.
    pub async fn list_immediate_children(&self, path: &str) -> Vec<DirEntry> {
        let Some(connected) = &self.connected else {
            return Vec::new();
        };
        let Some(cid) = connected.paths.resolve(path, false).await else {
            return Vec::new();
        };

        let mut entries: Vec<RawEntry> = Vec::new();
        let mut offset: u32 = 0;
        loop {
            let resp = match connected.api.list_dir(cid, offset, connected.page_size).await {
                Ok(resp) if resp.status.state => resp,
                Ok(resp) => {
                    error!(
                        "Failed to list {}: {}",
                        path,
                        resp.status.error_text().unwrap_or("unknown error")
                    );
                    return Vec::new();
                }
                Err(e) => {
                    error!("Failed to list {}: {}", path, e);
                    return Vec::new();
                }
            };

            let page_len = resp.data.len();
            entries.extend(resp.data);
            offset = offset.saturating_add(page_len as u32);
            if page_len < connected.page_size as usize || u64::from(offset) >= resp.count {
                break;
            }
        }

        entries
            .iter()
            .map(|entry| DirEntry {
                name: entry.name.clone(),
                is_dir: entry.is_dir(),
                id: entry.id(),
            })
            .collect()
    }

    /// Subdirectories of `path` with their full logical paths.
    pub async fn list_directories(&self, path: &str) -> Vec<DirectoryEntry> {
        let base = normalize_path(path);
        self.list_immediate_children(&base)
            .await
            .into_iter()
            .filter(|entry| entry.is_dir)
            .map(|entry| DirectoryEntry {
                path: if base == "/" {
                    format!("/{}", entry.name)
                } else {
                    format!("{}/{}", base, entry.name)
                },
                name: entry.name,
                id: entry.id,
            })
            .collect()
    }

    // -- shares -----------------------------------------------------------

    /// Probe a share link.
    pub async fn check_share_status(&self, share_url: &str) -> ShareLinkStatus {
        let Some(connected) = &self.connected else {
            return ShareLinkStatus::failed("Remote API not configured");
        };

        let share = match self.links.resolve(share_url) {
            Some(share) if !share.share_code.is_empty() => share,
            _ => return ShareLinkStatus::failed("Invalid share link format"),
        };

        connected.status.check(&share).await
    }

    pub async fn is_share_valid(&self, share_url: &str) -> bool {
        self.check_share_status(share_url).await.is_valid
    }

    /// The share's folder tree starting at its root.
    pub async fn list_share_tree(
        &self,
        share_url: &str,
        max_depth: u32,
        target_season: Option<u32>,
    ) -> Vec<ShareFileNode> {
        self.list_share_files(share_url, ROOT_ID, max_depth, target_season)
            .await
    }

    /// The share's folder tree starting at directory `cid`.
    pub async fn list_share_files(
        &self,
        share_url: &str,
        cid: u64,
        max_depth: u32,
        target_season: Option<u32>,
    ) -> Vec<ShareFileNode> {
        let Some(connected) = &self.connected else {
            return Vec::new();
        };
        let Some(share) = self.complete_share(share_url) else {
            return Vec::new();
        };

        connected
            .tree
            .list(&share, cid, max_depth, target_season)
            .await
    }

    // -- transfers --------------------------------------------------------

    /// Transfer `file_id` (single, comma-joined, or `"0"` for everything).
    pub async fn transfer(&self, share_url: &str, file_id: &str, save_path: &str) -> bool {
        let Some(connected) = &self.connected else {
            return false;
        };
        let Some(share) = self.complete_share(share_url) else {
            return false;
        };

        connected.transfer.transfer(&share, file_id, save_path).await
    }

    /// Transfer the whole share into `save_path`.
    pub async fn transfer_share(&self, share_url: &str, save_path: &str) -> bool {
        self.transfer(share_url, WHOLE_SHARE, save_path).await
    }

    /// Transfer one item of the share into `save_path`.
    pub async fn transfer_file(&self, share_url: &str, file_id: &str, save_path: &str) -> bool {
        self.transfer(share_url, file_id, save_path).await
    }

    /// Transfer many items in chunks; see [`TransferEngine::transfer_batch`].
    pub async fn transfer_batch(
        &self,
        share_url: &str,
        file_ids: &[String],
        save_path: &str,
        batch_size: usize,
        batch_interval: Duration,
    ) -> TransferBatchResult {
        if file_ids.is_empty() {
            return TransferBatchResult::default();
        }
        let Some(connected) = &self.connected else {
            return TransferBatchResult::all_failed(dedup_ids(file_ids));
        };
        let Some(share) = self.complete_share(share_url) else {
            return TransferBatchResult::all_failed(dedup_ids(file_ids));
        };

        connected
            .transfer
            .transfer_batch(&share, file_ids, save_path, batch_size, batch_interval)
            .await
    }

    // -- housekeeping -----------------------------------------------------

    /// Drop every cached path except the root.
    pub fn clear_path_cache(&self) {
        if let Some(connected) = &self.connected {
            connected.paths.cache().clear();
        }
    }

    pub fn clear_share_cache(&self) {
        self.links.clear();
    }

    /// Remote calls issued since construction or the last reset.
    pub fn api_call_count(&self) -> u64 {
        self.connected
            .as_ref()
            .map_or(0, |connected| connected.api.call_count())
    }

    pub fn reset_api_call_count(&self) {
        if let Some(connected) = &self.connected {
            connected.api.reset_call_count();
        }
    }
}
