//! HTTP client for the feed gateway.
//!
//! The gateway wraps the account session and exposes a small JSON API:
//! `GET /resolve/{name}` returns the channel id and title (404 when no such
//! channel exists, 403 when the account may not read it), and
//! `GET /channels/{id}/messages?limit=N` returns the most recent posts,
//! newest first. Every request carries a bearer token.

use crate::core::{ChannelFeed, ChannelHandle, Post};
use crate::feed::FeedError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Timeout for a single gateway request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct MessagesPayload {
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct WireMessage {
    id: i64,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    views: Option<u64>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    date: Option<i64>,
}

#[derive(Deserialize)]
struct WireChannel {
    id: i64,
    title: String,
}

/// Parses a gateway message-list payload into posts.
///
/// A message without a `views` field keeps `None`; the count is unknown,
/// not zero, and the evaluator treats those as ineligible.
pub fn parse_messages(payload: &str) -> Result<Vec<Post>> {
    let payload: MessagesPayload = serde_json::from_str(payload)?;
    Ok(payload
        .messages
        .into_iter()
        .map(|m| Post {
            id: m.id,
            text: m.text.unwrap_or_default(),
            views: m.views,
            date: m.date.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
        .collect())
}

/// Client for the feed gateway REST API.
pub struct HttpFeedClient {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl HttpFeedClient {
    pub fn new(base_url: String, api_token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FeedError> {
        self.client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))
    }
}

async fn api_error(response: reqwest::Response) -> FeedError {
    let status = response.status();
    if status == reqwest::StatusCode::FORBIDDEN {
        return FeedError::AccessDenied;
    }
    let message = response.text().await.unwrap_or_default();
    FeedError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ChannelFeed for HttpFeedClient {
    async fn resolve(&self, name: &str) -> Result<Option<ChannelHandle>, FeedError> {
        let url = format!("{}/resolve/{}", self.base_url, name);
        let response = self.get(&url).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let channel: WireChannel = response
            .json()
            .await
            .map_err(|e| FeedError::Malformed(e.to_string()))?;
        debug!(name, id = channel.id, title = %channel.title, "Resolved channel");
        Ok(Some(ChannelHandle {
            id: channel.id,
            title: channel.title,
        }))
    }

    async fn fetch_recent(
        &self,
        handle: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<Post>, FeedError> {
        let url = format!(
            "{}/channels/{}/messages?limit={}",
            self.base_url, handle.id, limit
        );
        let response = self.get(&url).await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;
        parse_messages(&body).map_err(|e| FeedError::Malformed(e.to_string()))
    }

    async fn close(&self) -> Result<(), FeedError> {
        // The gateway holds the session; there is nothing to tear down on
        // the HTTP side.
        debug!("Feed client closed");
        Ok(())
    }
}
