//! Logical path → directory id resolution with on-demand creation.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::api::ThrottledApi;
use crate::cache::{DirectoryPathCache, ROOT_PATH};
use crate::models::ROOT_ID;

/// Provider error number for "directory already exists".
const ERRNO_DIR_EXISTS: i64 = 20004;

/// Normalize a logical path: backslashes become slashes, empty segments are
/// dropped, a leading slash is enforced and trailing slashes are stripped.
/// Empty input normalizes to `/`.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn is_exists_error(errno: Option<i64>, text: Option<&str>) -> bool {
    errno == Some(ERRNO_DIR_EXISTS)
        || text.is_some_and(|t| {
            t.contains("已存在") || t.to_lowercase().contains("already exist")
        })
}

/// Resolves logical paths to provider directory ids, caching every id it learns.
pub struct PathResolver {
    api: Arc<ThrottledApi>,
    cache: DirectoryPathCache,
}

impl PathResolver {
    pub fn new(api: Arc<ThrottledApi>, cache: DirectoryPathCache) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &DirectoryPathCache {
        &self.cache
    }

    /// Resolve `path` to a directory id, creating missing directories when
    /// `create_if_missing` is set. `None` when the path does not exist (and
    /// may not be created) or any creation step fails.
    pub async fn resolve(&self, path: &str, create_if_missing: bool) -> Option<u64> {
        let path = normalize_path(path);
        if path == ROOT_PATH {
            return Some(ROOT_ID);
        }

        if let Some(id) = self.cache.get(&path) {
            return Some(id);
        }

        if let Some(id) = self.lookup(&path).await {
            self.cache.set(&path, id);
            return Some(id);
        }

        if !create_if_missing {
            return None;
        }

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (mut parent_id, start) = self.deepest_cached_ancestor(&segments);
        let mut current = if start == 0 {
            String::new()
        } else {
            format!("/{}", segments[..start].join("/"))
        };

        for segment in &segments[start..] {
            current.push('/');
            current.push_str(segment);

            // Another caller may have created it meanwhile
            if let Some(id) = self.cache.get(&current) {
                parent_id = id;
                continue;
            }

            parent_id = self.create_segment(parent_id, segment, &current).await?;
        }

        Some(parent_id)
    }

    /// Deepest cached proper or full prefix of `segments`, as
    /// `(directory id, number of segments it covers)`.
    fn deepest_cached_ancestor(&self, segments: &[&str]) -> (u64, usize) {
        for depth in (1..=segments.len()).rev() {
            let prefix = format!("/{}", segments[..depth].join("/"));
            if let Some(id) = self.cache.get(&prefix) {
                return (id, depth);
            }
        }
        (ROOT_ID, 0)
    }

    /// Direct full-path lookup. Id 0 only ever denotes the root, so it is a miss here.
    async fn lookup(&self, path: &str) -> Option<u64> {
        match self.api.dir_id(path).await {
            Ok(resp) => resp.id.filter(|id| *id != ROOT_ID),
            Err(e) => {
                info!("Direct lookup failed for {}: {}", path, e);
                None
            }
        }
    }

    async fn create_segment(&self, parent_id: u64, name: &str, path: &str) -> Option<u64> {
        let resp = match self.api.make_dir(parent_id, name).await {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to create directory {}: {}", path, e);
                return None;
            }
        };

        if resp.status.state {
            if let Some(cid) = resp.cid {
                self.cache.set(path, cid);
                info!("Created directory {} -> {}", path, cid);
                return Some(cid);
            }
        }

        if is_exists_error(resp.status.error_code(), resp.status.error_text()) {
            debug!("Directory already exists: {}", path);
            if let Some(cid) = self.lookup(path).await {
                self.cache.set(path, cid);
                return Some(cid);
            }
            error!("Directory exists but its id could not be resolved: {}", path);
            return None;
        }

        error!(
            "Failed to create directory {}: {}",
            path,
            resp.status.error_text().unwrap_or("unknown error")
        );
        None
    }
}
