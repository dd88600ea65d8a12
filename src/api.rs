//! The remote API capability and its throttled wrapper.
//!
//! [`RemoteApi`] is the injected, authenticated transport. Nothing in this
//! crate calls it directly except [`ThrottledApi`], which puts every call
//! behind the shared [`RateLimiter`] and counts it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    DirIdResponse, FileListResponse, MkdirResponse, ReceiveResponse, ShareCode,
    ShareSnapResponse, UserInfoResponse,
};
use crate::rate_limit::RateLimiter;

/// Authenticated calls against the storage provider.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Account behind the current credentials.
    async fn user_info(&self) -> Result<UserInfoResponse>;

    /// Resolve a full logical path to a directory id.
    async fn dir_id(&self, path: &str) -> Result<DirIdResponse>;

    /// Create one directory named `name` under `parent_id`.
    async fn make_dir(&self, parent_id: u64, name: &str) -> Result<MkdirResponse>;

    /// One page of an owned directory's immediate children.
    async fn list_dir(&self, cid: u64, offset: u32, limit: u32) -> Result<FileListResponse>;

    /// One page of a shared folder's immediate children, plus share metadata.
    async fn share_snap(
        &self,
        share: &ShareCode,
        cid: u64,
        offset: u32,
        limit: u32,
    ) -> Result<ShareSnapResponse>;

    /// Copy items from a share into an owned directory.
    ///
    /// `file_ids` is `"0"` for the whole share, a single id, or a
    /// comma-joined list of ids.
    async fn share_receive(
        &self,
        share: &ShareCode,
        file_ids: &str,
        cid: u64,
    ) -> Result<ReceiveResponse>;
}

/// Rate-limited, counted access to a [`RemoteApi`].
pub struct ThrottledApi {
    api: Arc<dyn RemoteApi>,
    limiter: RateLimiter,
    calls: AtomicU64,
}

impl ThrottledApi {
    pub fn new(api: Arc<dyn RemoteApi>, limiter: RateLimiter) -> Self {
        Self {
            api,
            limiter,
            calls: AtomicU64::new(0),
        }
    }

    async fn throttle(&self) {
        self.limiter.wait().await;
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn reset_call_count(&self) {
        self.calls.store(0, Ordering::Relaxed);
    }

    pub async fn user_info(&self) -> Result<UserInfoResponse> {
        self.throttle().await;
        self.api.user_info().await
    }

    pub async fn dir_id(&self, path: &str) -> Result<DirIdResponse> {
        self.throttle().await;
        self.api.dir_id(path).await
    }

    pub async fn make_dir(&self, parent_id: u64, name: &str) -> Result<MkdirResponse> {
        self.throttle().await;
        self.api.make_dir(parent_id, name).await
    }

    pub async fn list_dir(&self, cid: u64, offset: u32, limit: u32) -> Result<FileListResponse> {
        self.throttle().await;
        self.api.list_dir(cid, offset, limit).await
    }

    pub async fn share_snap(
        &self,
        share: &ShareCode,
        cid: u64,
        offset: u32,
        limit: u32,
    ) -> Result<ShareSnapResponse> {
        self.throttle().await;
        self.api.share_snap(share, cid, offset, limit).await
    }

    pub async fn share_receive(
        &self,
        share: &ShareCode,
        file_ids: &str,
        cid: u64,
    ) -> Result<ReceiveResponse> {
        self.throttle().await;
        self.api.share_receive(share, file_ids, cid).await
    }
}
