//! In-memory stand-in for the remote API, with a call log.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use share_transfer::models::{
    DirIdResponse, FileListResponse, MkdirResponse, ReceiveResponse, ShareSnapResponse,
    UserInfoResponse,
};
use share_transfer::{ManagerConfig, RemoteApi, Result, ShareCode, ShareError};

pub const SHARE_URL: &str = "https://115.com/s/sw3abc?password=ab12";
pub const SHARE_URL_NO_CODE: &str = "https://115.com/s/sw3abc";

/// Short intervals so paused-clock tests stay readable.
pub fn fast_config() -> ManagerConfig {
    ManagerConfig::default()
        .with_min_interval(Duration::from_millis(10))
        .with_recursion_delay(Duration::from_millis(10))
        .with_backoff(Duration::from_millis(100), Duration::from_millis(100))
}

pub fn dir_entry(cid: u64, name: &str) -> Value {
    json!({ "cid": cid.to_string(), "n": name })
}

pub fn file_entry(fid: u64, parent: u64, name: &str, size: u64) -> Value {
    json!({
        "fid": fid.to_string(),
        "cid": parent,
        "n": name,
        "s": size,
        "sha": format!("sha-{}", fid),
        "pc": format!("pc-{}", fid),
    })
}

#[derive(Default)]
struct State {
    dirs: HashMap<String, u64>,
    paths: HashMap<u64, String>,
    next_id: u64,
    racing: HashSet<String>,
    reject_mkdir: bool,
    listings: HashMap<u64, Vec<Value>>,
    share: HashMap<u64, Vec<Value>>,
    snap_reply: Option<Value>,
    snap_unreachable: bool,
    unreachable_dirs: HashSet<u64>,
    unreachable_pages: HashSet<(u64, u32)>,
    logged_out: bool,
    login_unreachable: bool,
    receive_replies: VecDeque<Option<Value>>,
    reject_joined: bool,
    rejected_ids: HashSet<String>,
    log: Vec<String>,
}

pub struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    pub fn new() -> Self {
        let state = State {
            next_id: 100,
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Register an existing owned directory.
    pub fn add_dir(&self, path: &str, id: u64) {
        let mut state = self.state.lock();
        state.dirs.insert(path.to_string(), id);
        state.paths.insert(id, path.to_string());
    }

    pub fn dir_id_of(&self, path: &str) -> Option<u64> {
        self.state.lock().dirs.get(path).copied()
    }

    /// `path` gets created by someone else right before our own create call.
    pub fn race_on(&self, path: &str) {
        self.state.lock().racing.insert(path.to_string());
    }

    pub fn reject_mkdir(&self) {
        self.state.lock().reject_mkdir = true;
    }

    pub fn set_listing(&self, cid: u64, entries: Vec<Value>) {
        self.state.lock().listings.insert(cid, entries);
    }

    pub fn set_share_dir(&self, cid: u64, entries: Vec<Value>) {
        self.state.lock().share.insert(cid, entries);
    }

    /// Every snapshot call returns `reply` verbatim.
    pub fn set_snap_reply(&self, reply: Value) {
        self.state.lock().snap_reply = Some(reply);
    }

    pub fn set_snap_unreachable(&self) {
        self.state.lock().snap_unreachable = true;
    }

    /// Snapshot calls for `cid` fail at the transport level.
    pub fn set_share_dir_unreachable(&self, cid: u64) {
        self.state.lock().unreachable_dirs.insert(cid);
    }

    /// Only the page of `cid` starting at `offset` fails.
    pub fn set_share_page_unreachable(&self, cid: u64, offset: u32) {
        self.state.lock().unreachable_pages.insert((cid, offset));
    }

    pub fn log_out(&self) {
        self.state.lock().logged_out = true;
    }

    pub fn set_login_unreachable(&self) {
        self.state.lock().login_unreachable = true;
    }

    /// Queue one receive reply; `None` simulates a transport failure.
    pub fn push_receive(&self, reply: Option<Value>) {
        self.state.lock().receive_replies.push_back(reply);
    }

    /// Refuse multi-id receive requests.
    pub fn reject_joined(&self) {
        self.state.lock().reject_joined = true;
    }

    pub fn reject_id(&self, id: &str) {
        self.state.lock().rejected_ids.insert(id.to_string());
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    /// Log lines for one endpoint, without the endpoint name.
    pub fn calls(&self, endpoint: &str) -> Vec<String> {
        let prefix = format!("{} ", endpoint);
        self.state
            .lock()
            .log
            .iter()
            .filter_map(|line| line.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    fn allocate(state: &mut State, path: &str) -> u64 {
        state.next_id += 1;
        let id = state.next_id;
        state.dirs.insert(path.to_string(), id);
        state.paths.insert(id, path.to_string());
        id
    }
}

fn unreachable_error() -> ShareError {
    ShareError::ApiError {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

fn page(entries: &[Value], offset: u32, limit: u32) -> Vec<Value> {
    entries
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn user_info(&self) -> Result<UserInfoResponse> {
        let mut state = self.state.lock();
        state.log.push("user_info -".to_string());

        if state.login_unreachable {
            return Err(unreachable_error());
        }
        let reply = if state.logged_out {
            json!({ "state": false, "error": "请重新登录", "errno": 99 })
        } else {
            json!({ "state": true, "data": { "user_id": "3100", "uname": "tester" } })
        };
        Ok(serde_json::from_value(reply)?)
    }

    async fn dir_id(&self, path: &str) -> Result<DirIdResponse> {
        let mut state = self.state.lock();
        state.log.push(format!("dir_id {}", path));
        let id = state.dirs.get(path).copied().unwrap_or(0);
        Ok(serde_json::from_value(json!({ "state": true, "id": id.to_string() }))?)
    }

    async fn make_dir(&self, parent_id: u64, name: &str) -> Result<MkdirResponse> {
        let mut state = self.state.lock();
        state.log.push(format!("make_dir {} {}", parent_id, name));

        if state.reject_mkdir {
            return Ok(serde_json::from_value(
                json!({ "state": false, "errno": 990, "error": "quota exceeded" }),
            )?);
        }

        let parent = state.paths.get(&parent_id).cloned().unwrap_or_default();
        let path = format!("{}/{}", parent, name);

        if state.racing.remove(&path) {
            Self::allocate(&mut state, &path);
        }
        if state.dirs.contains_key(&path) {
            return Ok(serde_json::from_value(
                json!({ "state": false, "errno": 20004, "error": "该目录名称已存在" }),
            )?);
        }

        let id = Self::allocate(&mut state, &path);
        Ok(serde_json::from_value(json!({ "state": true, "cid": id }))?)
    }

    async fn list_dir(&self, cid: u64, offset: u32, limit: u32) -> Result<FileListResponse> {
        let mut state = self.state.lock();
        state.log.push(format!("list_dir {} {}", cid, offset));
        let entries = state.listings.get(&cid).cloned().unwrap_or_default();
        Ok(serde_json::from_value(json!({
            "state": true,
            "data": page(&entries, offset, limit),
            "count": entries.len(),
        }))?)
    }

    async fn share_snap(
        &self,
        share: &ShareCode,
        cid: u64,
        offset: u32,
        limit: u32,
    ) -> Result<ShareSnapResponse> {
        let mut state = self.state.lock();
        state.log.push(format!(
            "snap {} {} {} {}",
            share.share_code, cid, offset, limit
        ));

        if state.snap_unreachable
            || state.unreachable_dirs.contains(&cid)
            || state.unreachable_pages.contains(&(cid, offset))
        {
            return Err(unreachable_error());
        }
        if let Some(reply) = &state.snap_reply {
            return Ok(serde_json::from_value(reply.clone())?);
        }

        let entries = state.share.get(&cid).cloned().unwrap_or_default();
        Ok(serde_json::from_value(json!({
            "state": true,
            "data": {
                "shareinfo": {
                    "share_title": "Show",
                    "share_state": "1",
                    "create_time": "1700000000",
                    "expire_time": "-1",
                    "user_name": "uploader",
                },
                "count": entries.len(),
                "list": page(&entries, offset, limit),
            },
        }))?)
    }

    async fn share_receive(
        &self,
        _share: &ShareCode,
        file_ids: &str,
        cid: u64,
    ) -> Result<ReceiveResponse> {
        let mut state = self.state.lock();
        state.log.push(format!("receive {} {}", file_ids, cid));

        if let Some(reply) = state.receive_replies.pop_front() {
            return match reply {
                Some(reply) => Ok(serde_json::from_value(reply)?),
                None => Err(unreachable_error()),
            };
        }

        let rejected = (state.reject_joined && file_ids.contains(','))
            || state.rejected_ids.contains(file_ids);
        let reply = if rejected {
            json!({ "state": false, "errno": 4100, "error": "transfer rejected" })
        } else {
            json!({ "state": true })
        };
        Ok(serde_json::from_value(reply)?)
    }
}
