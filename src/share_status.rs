//! Share link validity probing.

use std::sync::Arc;

use tracing::{error, info};

use crate::api::ThrottledApi;
use crate::models::{ShareCode, ShareDetails, ShareLinkStatus, ShareSnapResponse, ROOT_ID};

/// Fallback code when an invalid response carries none.
const UNKNOWN_ERROR_CODE: i64 = -1;

const EXPIRED_KEYWORDS: &[&str] = &["过期", "expired"];
const CANCELLED_KEYWORDS: &[&str] = &["取消", "cancel"];
const DELETED_KEYWORDS: &[&str] = &["删除", "不存在", "delete"];

fn mentions(message: &str, keywords: &[&str]) -> bool {
    let lower = message.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Turn a snapshot response into a status.
pub fn classify(resp: &ShareSnapResponse) -> ShareLinkStatus {
    if resp.status.state {
        let data = &resp.data;
        let file_count = data
            .count
            .and_then(|c| u64::try_from(c).ok())
            .unwrap_or(data.list.len() as u64);
        let info = &data.shareinfo;

        return ShareLinkStatus {
            is_valid: true,
            file_count,
            share_info: ShareDetails {
                title: info.share_title.clone(),
                state: info.share_state.clone(),
                file_count,
                create_time: info.create_time.clone(),
                expire_time: info.expire_time.clone(),
                user_name: info.user_name.clone(),
            },
            ..ShareLinkStatus::default()
        };
    }

    let message = resp
        .status
        .error_text()
        .unwrap_or("unknown error")
        .to_string();

    ShareLinkStatus {
        is_valid: false,
        is_expired: mentions(&message, EXPIRED_KEYWORDS),
        is_cancelled: mentions(&message, CANCELLED_KEYWORDS),
        is_deleted: mentions(&message, DELETED_KEYWORDS),
        error_code: resp.status.error_code().unwrap_or(UNKNOWN_ERROR_CODE),
        error_message: message,
        ..ShareLinkStatus::default()
    }
}

/// Probes a share with a one-item snapshot.
pub struct ShareStatusChecker {
    api: Arc<ThrottledApi>,
}

impl ShareStatusChecker {
    pub fn new(api: Arc<ThrottledApi>) -> Self {
        Self { api }
    }

    /// Never fails: transport and decode errors end up in `error_message`
    /// with every flag false.
    pub async fn check(&self, share: &ShareCode) -> ShareLinkStatus {
        match self.api.share_snap(share, ROOT_ID, 0, 1).await {
            Ok(resp) => {
                let status = classify(&resp);
                if !status.is_valid {
                    info!(
                        "Share link invalid: {} (errno: {})",
                        status.error_message, status.error_code
                    );
                }
                status
            }
            Err(e) => {
                let status = ShareLinkStatus::failed(format!("Share status check failed: {}", e));
                error!("{}", status.error_message);
                status
            }
        }
    }
}
