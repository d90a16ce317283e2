//! 授权服务的 HTTP 客户端（引擎侧）
//!
//! 实现 `AuthorityApi`（状态、凭证、心跳）与 `ErrorReporter`（派发结果上报）。
//! 每个请求都带超时；上报失败只记日志，不影响引擎循环。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::dispatch::ErrorReporter;
use super::sync::{AuthorityApi, StatusReply};
use crate::core::SyncError;
use crate::protocol::{ErrorReport, HeartbeatRequest, TokenResponse};
use crate::state::{CallPath, ErrorRecord, Module, Token};

#[derive(Debug, Clone)]
pub struct HttpAuthorityClient {
    client: Client,
    base_url: String,
}

impl HttpAuthorityClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthorityApi for HttpAuthorityClient {
    async fn fetch_status(&self) -> Result<StatusReply, SyncError> {
        let status = self
            .client
            .get(self.url("/api/status"))
            .send()
            .await?
            .error_for_status()?
            .json::<StatusReply>()
            .await?;
        Ok(status)
    }

    async fn fetch_token(&self) -> Result<Option<Token>, SyncError> {
        let response = self.client.get(self.url("/internal/token")).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let token = response.error_for_status()?.json::<TokenResponse>().await?;
        Ok(Some(token.into()))
    }

    async fn send_heartbeat(&self, module: Module, ready: bool) -> Result<(), SyncError> {
        let body = HeartbeatRequest {
            module: Some(module.as_str().to_string()),
            ready: Some(ready),
        };
        self.client
            .post(self.url("/api/engine/status"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        tracing::trace!(%module, ready, "Heartbeat sent");
        Ok(())
    }
}

#[async_trait]
impl ErrorReporter for HttpAuthorityClient {
    async fn report(&self, record: ErrorRecord) {
        let body = ErrorReport::from(&record);
        let result = self
            .client
            .post(self.url("/api/engine/error"))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            tracing::warn!(error = %e, code = record.code, "Failed to report dispatch error to authority");
        }
    }

    async fn clear(&self, path: CallPath) {
        // 授权服务只接收派发路径的清除
        if path != CallPath::Dispatch {
            return;
        }
        let result = self
            .client
            .delete(self.url("/api/engine/error"))
            .send()
            .await
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            tracing::debug!(error = %e, "Failed to clear dispatch error on authority");
        }
    }
}
