//! 媒体服务 REST 客户端
//!
//! Bearer 凭证放在 Authorization 头；请求带超时，拿不到响应视为传输失败。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{route_for, MediaControl, PlayerQuery, ProviderMethod, ProviderResponse};
use crate::config::ProviderSection;
use crate::core::UpstreamError;
use crate::engine::PlaybackCommand;
use crate::state::Token;

pub struct HttpMediaProvider {
    client: Client,
    base_url: String,
}

impl HttpMediaProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &ProviderSection) -> Result<Self, reqwest::Error> {
        Self::new(&cfg.api_base_url, Duration::from_millis(cfg.request_timeout_ms))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> ProviderResponse {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ProviderResponse { status, body }
    }
}

#[async_trait]
impl MediaControl for HttpMediaProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, command: PlaybackCommand, token: &Token) -> Result<ProviderResponse, UpstreamError> {
        let Some((method, path)) = route_for(command) else {
            return Ok(ProviderResponse::new(204, ""));
        };
        let url = self.url(path);
        let request = match method {
            ProviderMethod::Put => self.client.put(&url),
            ProviderMethod::Post => self.client.post(&url),
        };

        let response = request
            .bearer_auth(token.as_str())
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let response = Self::read(response).await;
        tracing::debug!(%command, status = response.status, "Provider responded");
        Ok(response)
    }

    async fn query(&self, query: PlayerQuery, token: &Token) -> Result<ProviderResponse, UpstreamError> {
        let response = self
            .client
            .get(self.url(query.path()))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let response = Self::read(response).await;
        tracing::debug!(?query, status = response.status, "Provider responded");
        Ok(response)
    }
}
