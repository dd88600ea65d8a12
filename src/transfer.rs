//! Share → own storage transfers with retry and per-item batch fallback.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::api::ThrottledApi;
use crate::models::{ReceiveResponse, ShareCode, TransferBatchResult};
use crate::path_resolver::PathResolver;
use crate::rate_limit::jittered;
use crate::retry::{Backoff, RetryPolicy, Step};

/// File id meaning "everything in the share".
pub const WHOLE_SHARE: &str = "0";

/// Provider error numbers that mean "slow down".
pub const RATE_LIMIT_CODES: [i64; 3] = [990001, 990002, 990009];

/// Input order preserved, later repeats dropped.
pub(crate) fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Item is already present at the destination.
fn is_duplicate(text: &str) -> bool {
    text.contains("重复")
        || text.contains("已存在")
        || text.to_lowercase().contains("already exist")
}

/// Performs transfers through the shared throttle.
pub struct TransferEngine {
    api: Arc<ThrottledApi>,
    paths: Arc<PathResolver>,
    retry: RetryPolicy,
    rate_limit_backoff: Backoff,
    transport_backoff: Backoff,
    jitter_ratio: f64,
}

impl TransferEngine {
    pub fn new(
        api: Arc<ThrottledApi>,
        paths: Arc<PathResolver>,
        retry: RetryPolicy,
        rate_limit_backoff: Duration,
        transport_backoff: Duration,
        jitter_ratio: f64,
    ) -> Self {
        Self {
            api,
            paths,
            retry,
            rate_limit_backoff: Backoff::linear(rate_limit_backoff),
            transport_backoff: Backoff::linear(transport_backoff),
            jitter_ratio,
        }
    }

    /// Transfer `file_id` (a single id, a comma-joined list, or
    /// [`WHOLE_SHARE`]) into `save_path`, creating it when missing.
    pub async fn transfer(&self, share: &ShareCode, file_id: &str, save_path: &str) -> bool {
        let Some(cid) = self.paths.resolve(save_path, true).await else {
            error!("Cannot resolve or create destination: {}", save_path);
            return false;
        };

        info!("Transferring {} into {} ({})", file_id, save_path, cid);
        self.receive(share, file_id, cid).await
    }

    /// Transfer `file_ids` in chunks of `batch_size`. Every id of a failed
    /// chunk is then attempted on its own, single-id chunks included.
    /// Duplicate ids are collapsed.
    pub async fn transfer_batch(
        &self,
        share: &ShareCode,
        file_ids: &[String],
        save_path: &str,
        batch_size: usize,
        batch_interval: Duration,
    ) -> TransferBatchResult {
        let ids = dedup_ids(file_ids);

        if ids.is_empty() {
            return TransferBatchResult::default();
        }

        let Some(cid) = self.paths.resolve(save_path, true).await else {
            error!("Cannot resolve or create destination: {}", save_path);
            return TransferBatchResult::all_failed(ids);
        };

        let batch_size = batch_size.max(1);
        let total_batches = ids.len().div_ceil(batch_size);
        info!(
            "Batch transfer: {} items in {} batches of up to {}",
            ids.len(),
            total_batches,
            batch_size
        );

        let mut result = TransferBatchResult::default();
        for (index, chunk) in ids.chunks(batch_size).enumerate() {
            let batch_num = index + 1;
            info!("Batch {}/{}: {} items", batch_num, total_batches, chunk.len());

            if self.receive(share, &chunk.join(","), cid).await {
                result.succeeded.extend_from_slice(chunk);
            } else {
                warn!("Batch {} failed, falling back to one item at a time", batch_num);
                for id in chunk {
                    if self.receive(share, id, cid).await {
                        result.succeeded.push(id.clone());
                    } else {
                        result.failed.push(id.clone());
                    }
                }
            }

            if batch_num < total_batches {
                let pause = jittered(batch_interval, self.jitter_ratio);
                info!("Pausing {:.1}s before next batch", pause.as_secs_f64());
                tokio::time::sleep(pause).await;
            }
        }

        info!(
            "Batch transfer finished: {} succeeded, {} failed",
            result.succeeded.len(),
            result.failed.len()
        );
        result
    }

    /// One receive request into a known directory, with retries.
    async fn receive(&self, share: &ShareCode, file_ids: &str, cid: u64) -> bool {
        self.retry
            .run(|_| async move {
                match self.api.share_receive(share, file_ids, cid).await {
                    Ok(resp) => self.judge(&resp, file_ids),
                    Err(e) => Step::Retry {
                        backoff: self.transport_backoff,
                        reason: format!("Transfer request failed: {}", e),
                    },
                }
            })
            .await
            .unwrap_or(false)
    }

    fn judge(&self, resp: &ReceiveResponse, file_ids: &str) -> Step<bool> {
        if resp.status.state {
            info!("Transferred {}", file_ids);
            return Step::Done(true);
        }

        let text = resp.status.error_text().unwrap_or("unknown error");
        if is_duplicate(text) {
            info!("Already present, skipping: {}", file_ids);
            return Step::Done(true);
        }

        let code = resp.status.error_code().unwrap_or(0);
        if RATE_LIMIT_CODES.contains(&code) {
            return Step::Retry {
                backoff: self.rate_limit_backoff,
                reason: format!("Rate limited ({})", code),
            };
        }

        error!("Transfer failed: {} (errno: {})", text, code);
        Step::Done(false)
    }
}
