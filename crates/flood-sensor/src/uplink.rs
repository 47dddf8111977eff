//! HTTP uplink to the flood server

use crate::{Notice, PushReply, SensorError, SensorResult, Uplink};
use flood_core::StationPush;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpUplink {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckNotifyReply {
    #[serde(default)]
    pending: bool,
    #[serde(flatten)]
    notice: Option<Notice>,
}

impl HttpUplink {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> SensorResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl Uplink for HttpUplink {
    async fn push(&self, push: &StationPush) -> SensorResult<PushReply> {
        let mut req = self.client.post(self.url("/api/push-status")).json(push);
        if let Some(key) = &self.api_key {
            req = req.header(header::AUTHORIZATION, key);
        }
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(SensorError::HttpStatus(status.as_u16()));
        }
        let reply: PushReply = res.json().await?;
        debug!(?reply, "push accepted");
        Ok(reply)
    }

    async fn check_notify(&self, station: &str) -> SensorResult<Option<Notice>> {
        let res = self
            .client
            .get(self.url("/api/check-notify"))
            .query(&[("station", station)])
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(SensorError::HttpStatus(status.as_u16()));
        }
        let reply: CheckNotifyReply = res.json().await?;
        Ok(reply.notice.filter(|_| reply.pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_notify_reply_shapes() {
        let empty: CheckNotifyReply = serde_json::from_str(r#"{"pending":false}"#).unwrap();
        assert!(!empty.pending);
        assert!(empty.notice.is_none());

        let full: CheckNotifyReply = serde_json::from_str(
            r#"{"pending":true,"message":"hi","timestamp":"2026-03-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert!(full.pending);
        assert_eq!(full.notice.unwrap().message, "hi");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let uplink = HttpUplink::new("http://localhost:8080/", None).unwrap();
        assert_eq!(uplink.url("/api/push-status"), "http://localhost:8080/api/push-status");
    }
}
