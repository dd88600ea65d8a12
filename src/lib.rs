//! share_transfer - Rate-limited share link discovery and transfer for 115 cloud storage.
//!
//! This library provides functionality to:
//! - Resolve logical paths to directory ids, creating missing directories
//! - Check whether a share link is still valid
//! - List a shared folder tree, skipping seasons you did not ask for
//! - Transfer a whole share, single items, or batches into your own storage
//!
//! Every remote call goes through one jittered rate limiter per manager.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use share_transfer::{ManagerConfig, ShareManager, WebApiClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api = WebApiClient::new("UID=...; CID=...; SEID=...")?;
//!     let manager = ShareManager::new(Arc::new(api), ManagerConfig::default());
//!
//!     let url = "https://115.com/s/sw3abc?password=ab12";
//!     if manager.is_share_valid(url).await {
//!         manager.transfer_share(url, "/Received/Shows").await;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod path_resolver;
pub mod rate_limit;
pub mod retry;
pub mod share_link;
pub mod share_status;
pub mod share_tree;
pub mod transfer;
pub mod url_parser;
pub mod web_api;

// Re-exports for convenience
pub use api::RemoteApi;
pub use config::ManagerConfig;
pub use error::{Result, ShareError};
pub use manager::ShareManager;
pub use models::{
    DirEntry, DirectoryEntry, ShareCode, ShareFileNode, ShareLinkStatus, TransferBatchResult,
};
pub use url_parser::extract_share_code;
pub use web_api::WebApiClient;
