//! Depth-bounded share folder traversal with season-based pruning.

use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use tracing::{error, info};

use crate::api::ThrottledApi;
use crate::models::{RawEntry, ShareCode, ShareFileNode};
use crate::rate_limit::jittered;

/// Season naming patterns, tried in order; the first that matches decides.
static SEASON_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)season\s*(\d+)",
        r"[Ss](\d+)",
        r"第(\d+)季",
        r"第([一二三四五六七八九十]+)季",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid season regex"))
    .collect()
});

fn chinese_digit(c: char) -> Option<u32> {
    "一二三四五六七八九".chars().position(|d| d == c).map(|i| i as u32 + 1)
}

/// Decode a Chinese numeral between 1 and 99 (`三`, `十`, `十二`, `二十`, `二十三`).
fn parse_chinese_numeral(s: &str) -> Option<u32> {
    let chars: Vec<char> = s.chars().collect();
    match chars.iter().position(|&c| c == '十') {
        None if chars.len() == 1 => chinese_digit(chars[0]),
        None => None,
        Some(pos) => {
            let tens = match &chars[..pos] {
                [] => 1,
                [c] => chinese_digit(*c)?,
                _ => return None,
            };
            let units = match &chars[pos + 1..] {
                [] => 0,
                [c] => chinese_digit(*c)?,
                _ => return None,
            };
            Some(tens * 10 + units)
        }
    }
}

/// Season number a directory name announces, if any.
pub fn detect_season(name: &str) -> Option<u32> {
    SEASON_PATTERNS.iter().find_map(|pattern| {
        let raw = pattern.captures(name)?.get(1)?.as_str();
        raw.parse::<u32>()
            .ok()
            .or_else(|| parse_chinese_numeral(raw))
    })
}

/// True when `name` clearly belongs to a season other than `target`.
pub fn should_skip_season_dir(name: &str, target: u32) -> bool {
    detect_season(name).is_some_and(|season| season != target)
}

/// Recursively lists shared folders, one listing per directory.
pub struct ShareTreeLister {
    api: Arc<ThrottledApi>,
    recursion_delay: Duration,
    jitter_ratio: f64,
    page_size: u32,
    season_pruning: bool,
}

impl ShareTreeLister {
    pub fn new(
        api: Arc<ThrottledApi>,
        recursion_delay: Duration,
        jitter_ratio: f64,
        page_size: u32,
        season_pruning: bool,
    ) -> Self {
        Self {
            api,
            recursion_delay,
            jitter_ratio,
            page_size: page_size.max(1),
            season_pruning,
        }
    }

    /// List the tree under `root_cid`. Directories at `max_depth` are listed
    /// but not descended into. Failures yield whatever was gathered.
    pub async fn list(
        &self,
        share: &ShareCode,
        root_cid: u64,
        max_depth: u32,
        target_season: Option<u32>,
    ) -> Vec<ShareFileNode> {
        let target = target_season.filter(|_| self.season_pruning);
        self.list_level(share, root_cid, 1, max_depth, target).await
    }

    fn list_level<'a>(
        &'a self,
        share: &'a ShareCode,
        cid: u64,
        depth: u32,
        max_depth: u32,
        target_season: Option<u32>,
    ) -> BoxFuture<'a, Vec<ShareFileNode>> {
        async move {
            if depth > max_depth {
                return Vec::new();
            }

            let entries = self.fetch_entries(share, cid).await;
            let mut nodes = Vec::with_capacity(entries.len());

            for entry in &entries {
                let mut node = ShareFileNode::from(entry);

                if node.is_dir && depth < max_depth {
                    if let Some(target) = target_season {
                        if should_skip_season_dir(&node.name, target) {
                            info!(
                                "Skipping non-target season directory: {} (target: S{})",
                                node.name, target
                            );
                            nodes.push(node);
                            continue;
                        }
                    }

                    let delay = jittered(self.recursion_delay, self.jitter_ratio);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }

                    let children = self
                        .list_level(share, entry.id(), depth + 1, max_depth, target_season)
                        .await;
                    node.children = Some(children);
                }

                nodes.push(node);
            }

            nodes
        }
        .boxed()
    }

    /// All entries of one shared directory, following pagination. Stops at
    /// the first failed page and keeps the earlier ones.
    async fn fetch_entries(&self, share: &ShareCode, cid: u64) -> Vec<RawEntry> {
        let mut entries = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let resp = match self.api.share_snap(share, cid, offset, self.page_size).await {
                Ok(resp) => resp,
                Err(e) => {
                    error!("Failed to list share directory {}: {}", cid, e);
                    break;
                }
            };

            if !resp.status.state {
                error!(
                    "Failed to list share directory {}: {}",
                    cid,
                    resp.status.error_text().unwrap_or("unknown error")
                );
                break;
            }

            let page_len = resp.data.list.len();
            let total = resp.data.count;
            entries.extend(resp.data.list);
            offset = offset.saturating_add(page_len as u32);

            let reached_total = match total {
                Some(total) => i64::from(offset) >= total,
                None => false,
            };
            if page_len < self.page_size as usize || reached_total {
                break;
            }
        }

        entries
    }
}
