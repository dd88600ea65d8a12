//! `reqwest` implementation of [`RemoteApi`] over the provider's web endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::api::RemoteApi;
use crate::error::{Result, ShareError};
use crate::models::{
    DirIdResponse, FileListResponse, MkdirResponse, ReceiveResponse, ShareCode,
    ShareSnapResponse, UserInfoResponse,
};

/// Base URL for the provider's web API.
pub const WEB_API_BASE: &str = "https://webapi.115.com";

/// Browser user agent sent when none is configured.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Cookie-authenticated client for the provider's web API.
#[derive(Debug)]
pub struct WebApiClient {
    base_url: String,
    http: Client,
}

impl WebApiClient {
    /// Create a client authenticated with an already obtained cookie string.
    pub fn new(cookies: &str) -> Result<Self> {
        Self::with_options(cookies, None, WEB_API_BASE)
    }

    /// Create a client with a custom user agent and base URL.
    pub fn with_options(cookies: &str, user_agent: Option<&str>, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(cookies.trim())
                .map_err(|e| ShareError::InvalidCookie(e.to_string()))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent.unwrap_or(DEFAULT_USER_AGENT))
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode its JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ShareError::ApiError {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RemoteApi for WebApiClient {
    async fn user_info(&self) -> Result<UserInfoResponse> {
        let request = self.http.get(self.url("/user/my_info"));
        self.send(request).await
    }

    async fn dir_id(&self, path: &str) -> Result<DirIdResponse> {
        let request = self
            .http
            .get(self.url("/files/getid"))
            .query(&[("path", path)]);
        self.send(request).await
    }

    async fn make_dir(&self, parent_id: u64, name: &str) -> Result<MkdirResponse> {
        let pid = parent_id.to_string();
        let request = self
            .http
            .post(self.url("/files/add"))
            .form(&[("pid", pid.as_str()), ("cname", name)]);
        self.send(request).await
    }

    async fn list_dir(&self, cid: u64, offset: u32, limit: u32) -> Result<FileListResponse> {
        let request = self.http.get(self.url("/files")).query(&[
            ("aid", "1".to_string()),
            ("cid", cid.to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("show_dir", "1".to_string()),
            ("o", "user_ptime".to_string()),
            ("asc", "0".to_string()),
        ]);
        self.send(request).await
    }

    async fn share_snap(
        &self,
        share: &ShareCode,
        cid: u64,
        offset: u32,
        limit: u32,
    ) -> Result<ShareSnapResponse> {
        let request = self.http.get(self.url("/share/snap")).query(&[
            ("share_code", share.share_code.clone()),
            ("receive_code", share.receive_code.clone()),
            ("cid", cid.to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ]);
        self.send(request).await
    }

    async fn share_receive(
        &self,
        share: &ShareCode,
        file_ids: &str,
        cid: u64,
    ) -> Result<ReceiveResponse> {
        let cid = cid.to_string();
        let request = self.http.post(self.url("/share/receive")).form(&[
            ("share_code", share.share_code.as_str()),
            ("receive_code", share.receive_code.as_str()),
            ("file_id", file_ids),
            ("cid", cid.as_str()),
            ("is_check", "0"),
        ]);
        self.send(request).await
    }
}
