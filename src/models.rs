//! Data models: remote API response schemas and the values handed back to callers.
//!
//! The provider is loose about field types (flags arrive as `true`, `1` or
//! `"1"`, ids as numbers or strings), so every schema field goes through one of
//! the lenient deserializers at the bottom of this module and absent fields
//! fall back to their defaults.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier of the account root directory.
pub const ROOT_ID: u64 = 0;

// ---------------------------------------------------------------------------
// Caller-facing values
// ---------------------------------------------------------------------------

/// The `(share_code, receive_code)` pair addressing a share link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ShareCode {
    pub share_code: String,
    pub receive_code: String,
}

impl ShareCode {
    pub fn new(share_code: impl Into<String>, receive_code: impl Into<String>) -> Self {
        Self {
            share_code: share_code.into(),
            receive_code: receive_code.into(),
        }
    }

    /// Both halves are present, which listing and transfer require.
    pub fn is_complete(&self) -> bool {
        !self.share_code.is_empty() && !self.receive_code.is_empty()
    }
}

/// Descriptive metadata of a valid share.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShareDetails {
    pub title: String,
    pub state: String,
    pub file_count: u64,
    pub create_time: String,
    pub expire_time: String,
    pub user_name: String,
}

/// Result of probing a share link.
///
/// When `is_valid` is false at most one reason flag is expected to be set;
/// all flags false with an empty `error_message` means the status is unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShareLinkStatus {
    pub is_valid: bool,
    pub is_expired: bool,
    pub is_cancelled: bool,
    pub is_deleted: bool,
    pub error_code: i64,
    pub error_message: String,
    pub file_count: u64,
    pub share_info: ShareDetails,
}

impl ShareLinkStatus {
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            ..Self::default()
        }
    }

    /// Short description, first match wins:
    /// valid > expired > cancelled > deleted > error message > unknown.
    pub fn status_text(&self) -> &str {
        if self.is_valid {
            "valid"
        } else if self.is_expired {
            "expired"
        } else if self.is_cancelled {
            "cancelled"
        } else if self.is_deleted {
            "files deleted"
        } else if !self.error_message.is_empty() {
            &self.error_message
        } else {
            "unknown"
        }
    }
}

/// One item of a shared folder tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShareFileNode {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    pub sha1: String,
    pub pick_code: String,
    /// `Some` only for directories that were recursed into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ShareFileNode>>,
}

impl From<&RawEntry> for ShareFileNode {
    fn from(entry: &RawEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            name: entry.name.clone(),
            size: entry.size,
            is_dir: entry.is_dir(),
            sha1: entry.sha1.clone(),
            pick_code: entry.pick_code.clone(),
            children: None,
        }
    }
}

impl fmt::Display for ShareFileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (size_str, kind) = if self.is_dir {
            ("-".to_string(), "dir")
        } else {
            (format_size(self.size), "file")
        };
        write!(f, "{}\t{}\t{}\t{}", self.id, size_str, kind, self.name)
    }
}

/// Outcome of a batch transfer. Every input id lands in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferBatchResult {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl TransferBatchResult {
    pub(crate) fn all_failed(ids: Vec<String>) -> Self {
        Self {
            succeeded: Vec::new(),
            failed: ids,
        }
    }
}

/// An immediate child of one of the account's own directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub id: u64,
}

/// A subdirectory together with its full logical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub id: u64,
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ---------------------------------------------------------------------------
// Response schemas
// ---------------------------------------------------------------------------

/// Status fields shared by every provider response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiStatus {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub state: bool,
    #[serde(default, deserialize_with = "deserialize_code")]
    pub errno: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_code")]
    pub errcode: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub error: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub message: String,
}

impl ApiStatus {
    /// `errno`, falling back to `errcode`.
    pub fn error_code(&self) -> Option<i64> {
        self.errno.or(self.errcode)
    }

    /// `error`, falling back to `message`.
    pub fn error_text(&self) -> Option<&str> {
        [self.error.as_str(), self.message.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

/// Response of the full-path lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirIdResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<u64>,
}

/// Response of a single-level directory creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MkdirResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub cid: Option<u64>,
}

/// A listing entry, shared by own-directory and share listings.
///
/// Files carry `fid`; directories carry only `cid`, which is their own id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub cid: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub fid: Option<u64>,
    #[serde(default, rename = "n", deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(default, rename = "s", deserialize_with = "deserialize_number")]
    pub size: u64,
    #[serde(default, rename = "sha", deserialize_with = "deserialize_text")]
    pub sha1: String,
    #[serde(default, rename = "pc", deserialize_with = "deserialize_text")]
    pub pick_code: String,
}

impl RawEntry {
    pub fn is_dir(&self) -> bool {
        self.fid.is_none()
    }

    pub fn id(&self) -> u64 {
        self.fid.or(self.cid).unwrap_or(ROOT_ID)
    }
}

/// Response of an own-directory listing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileListResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub data: Vec<RawEntry>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub count: u64,
}

/// Share metadata block of a snapshot response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShareInfo {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub share_title: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub share_state: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub create_time: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub expire_time: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub user_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareSnapData {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub shareinfo: RawShareInfo,
    #[serde(default, deserialize_with = "deserialize_code")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub list: Vec<RawEntry>,
}

/// Response of a share snapshot page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareSnapResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub data: ShareSnapData,
}

/// Response of a share receive (transfer) request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiveResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub user_id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub uname: String,
}

/// Response of the account info lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfoResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub data: UserInfo,
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "True"),
        _ => false,
    })
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

fn deserialize_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_id(deserializer)?.unwrap_or(0))
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Falls back to `T::default()` when the value has an unexpected shape, e.g.
/// `"data": []` where an object is expected on failure responses.
fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_status_text_priority() {
        let mut status = ShareLinkStatus::failed("boom");
        assert_eq!(status.status_text(), "boom");

        status.is_deleted = true;
        assert_eq!(status.status_text(), "files deleted");

        status.is_expired = true;
        assert_eq!(status.status_text(), "expired");

        status.is_valid = true;
        assert_eq!(status.status_text(), "valid");

        assert_eq!(ShareLinkStatus::default().status_text(), "unknown");
    }

    #[test]
    fn test_api_status_lenient_fields() {
        let resp: ReceiveResponse = serde_json::from_value(json!({
            "state": 0,
            "errno": "990001",
            "error": ""
        }))
        .unwrap();
        assert!(!resp.status.state);
        assert_eq!(resp.status.error_code(), Some(990001));
        assert_eq!(resp.status.error_text(), None);

        let resp: ReceiveResponse =
            serde_json::from_value(json!({"state": "1", "message": "ok"})).unwrap();
        assert!(resp.status.state);
        assert_eq!(resp.status.error_text(), Some("ok"));
    }

    #[test]
    fn test_error_code_falls_back_to_errcode() {
        let status: ApiStatus =
            serde_json::from_value(json!({"state": false, "errcode": 4100012})).unwrap();
        assert_eq!(status.error_code(), Some(4100012));
    }

    #[test]
    fn test_raw_entry_dir_and_file() {
        let dir: RawEntry =
            serde_json::from_value(json!({"cid": "123", "n": "Season 1"})).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.id(), 123);

        let file: RawEntry = serde_json::from_value(json!({
            "cid": 123, "fid": "456", "n": "ep01.mkv", "s": "2048", "sha": "ABC", "pc": "pick"
        }))
        .unwrap();
        assert!(!file.is_dir());
        assert_eq!(file.id(), 456);
        assert_eq!(file.size, 2048);

        let node = ShareFileNode::from(&file);
        assert_eq!(node.id, "456");
        assert_eq!(node.sha1, "ABC");
        assert_eq!(node.pick_code, "pick");
        assert!(node.children.is_none());
    }

    #[test]
    fn test_snapshot_failure_with_array_data() {
        let resp: ShareSnapResponse = serde_json::from_value(json!({
            "state": false,
            "error": "分享已取消",
            "errno": 4100009,
            "data": []
        }))
        .unwrap();
        assert!(!resp.status.state);
        assert!(resp.data.list.is_empty());
        assert_eq!(resp.data.count, None);
    }

    #[test]
    fn test_share_file_node_display() {
        let node = ShareFileNode {
            id: "1".to_string(),
            name: "movie.mkv".to_string(),
            size: 1048576,
            ..ShareFileNode::default()
        };
        let display = format!("{}", node);
        assert!(display.contains("movie.mkv"));
        assert!(display.contains("1.00 MB"));

        let dir = ShareFileNode {
            is_dir: true,
            ..node
        };
        assert!(format!("{}", dir).contains("dir"));
    }
}
