//! Firebase Realtime Database 后端（REST）
//!
//! - `set`：`PUT {databaseURL}/{path}.json`
//! - `push`：`POST {databaseURL}/{path}.json`，响应 `{"name": "<key>"}`
//! - `read`：`GET {databaseURL}/{path}.json`
//! - `subscribe`：按固定间隔轮询 `read`，内容变化时通知

use crate::backend::{Subscription, SyncBackend, value_set};
use crate::error::SyncError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// 凭据占位符（未配置时的初始值）
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";
pub const PLACEHOLDER_AUTH_DOMAIN: &str = "YOUR_AUTH_DOMAIN";
pub const PLACEHOLDER_DATABASE_URL: &str = "YOUR_DATABASE_URL";
pub const PLACEHOLDER_PROJECT_ID: &str = "YOUR_PROJECT_ID";
pub const PLACEHOLDER_STORAGE_BUCKET: &str = "YOUR_STORAGE_BUCKET";
pub const PLACEHOLDER_MESSAGING_SENDER_ID: &str = "YOUR_MESSAGING_SENDER_ID";
pub const PLACEHOLDER_APP_ID: &str = "YOUR_APP_ID";

/// Firebase 项目凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseCredentials {
    pub api_key: String,
    pub auth_domain: String,
    pub database_url: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl FirebaseCredentials {
    /// 全部字段为占位符
    pub fn placeholder() -> Self {
        Self {
            api_key: PLACEHOLDER_API_KEY.to_string(),
            auth_domain: PLACEHOLDER_AUTH_DOMAIN.to_string(),
            database_url: PLACEHOLDER_DATABASE_URL.to_string(),
            project_id: PLACEHOLDER_PROJECT_ID.to_string(),
            storage_bucket: PLACEHOLDER_STORAGE_BUCKET.to_string(),
            messaging_sender_id: PLACEHOLDER_MESSAGING_SENDER_ID.to_string(),
            app_id: PLACEHOLDER_APP_ID.to_string(),
        }
    }

    /// 没有字段为空或仍是占位符
    pub fn is_configured(&self) -> bool {
        [
            (&self.api_key, PLACEHOLDER_API_KEY),
            (&self.auth_domain, PLACEHOLDER_AUTH_DOMAIN),
            (&self.database_url, PLACEHOLDER_DATABASE_URL),
            (&self.project_id, PLACEHOLDER_PROJECT_ID),
            (&self.storage_bucket, PLACEHOLDER_STORAGE_BUCKET),
            (&self.messaging_sender_id, PLACEHOLDER_MESSAGING_SENDER_ID),
            (&self.app_id, PLACEHOLDER_APP_ID),
        ]
        .iter()
        .all(|(value, placeholder)| {
            let value = value.trim();
            !value.is_empty() && value != *placeholder
        })
    }
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

/// Firebase REST 后端
pub struct FirebaseBackend {
    credentials: FirebaseCredentials,
    client: reqwest::Client,
    poll_interval: Duration,
}

impl FirebaseBackend {
    pub fn new(credentials: FirebaseCredentials, poll_interval: Duration) -> Self {
        Self {
            credentials,
            client: reqwest::Client::new(),
            poll_interval,
        }
    }

    pub fn credentials(&self) -> &FirebaseCredentials {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        node_url(&self.credentials.database_url, path)
    }

    fn ensure_configured(&self) -> Result<(), SyncError> {
        if self.credentials.is_configured() {
            Ok(())
        } else {
            Err(SyncError::Unavailable(
                "firebase credentials not configured".to_string(),
            ))
        }
    }
}

/// `{databaseURL}/{path}.json`
pub fn node_url(database_url: &str, path: &str) -> String {
    format!(
        "{}/{}.json",
        database_url.trim_end_matches('/'),
        path.trim_matches('/')
    )
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<Vec<Value>, SyncError> {
    let node: Value = client
        .get(url)
        .send()
        .await
        .map_err(|e| SyncError::Read(e.to_string()))?
        .error_for_status()
        .map_err(|e| SyncError::Read(e.to_string()))?
        .json()
        .await
        .map_err(|e| SyncError::Read(e.to_string()))?;
    Ok(value_set(&node))
}

#[async_trait]
impl SyncBackend for FirebaseBackend {
    fn is_configured(&self) -> bool {
        self.credentials.is_configured()
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), SyncError> {
        self.ensure_configured()?;
        self.client
            .put(self.url(path))
            .json(&value)
            .send()
            .await
            .map_err(|e| SyncError::Delivery(e.to_string()))?
            .error_for_status()
            .map_err(|e| SyncError::Delivery(e.to_string()))?;
        debug!(target: "plc.sync", path, "firebase set");
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, SyncError> {
        self.ensure_configured()?;
        let response: PushResponse = self
            .client
            .post(self.url(path))
            .json(&value)
            .send()
            .await
            .map_err(|e| SyncError::Delivery(e.to_string()))?
            .error_for_status()
            .map_err(|e| SyncError::Delivery(e.to_string()))?
            .json()
            .await
            .map_err(|e| SyncError::Delivery(e.to_string()))?;
        debug!(target: "plc.sync", path, key = %response.name, "firebase push");
        Ok(response.name)
    }

    async fn read(&self, path: &str) -> Result<Vec<Value>, SyncError> {
        self.ensure_configured()?;
        fetch(&self.client, &self.url(path)).await
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, SyncError> {
        if !self.is_configured() {
            let (_, receiver) = watch::channel(Vec::new());
            return Ok(Subscription::new(receiver, None));
        }
        let (sender, receiver) = watch::channel(Vec::new());
        let client = self.client.clone();
        let url = self.url(path);
        let poll_interval = self.poll_interval;
        let path = path.to_string();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                match fetch(&client, &url).await {
                    Ok(values) => {
                        sender.send_if_modified(|current| {
                            if *current == values {
                                false
                            } else {
                                *current = values;
                                true
                            }
                        });
                    }
                    Err(err) => {
                        warn!(target: "plc.sync", path = %path, "firebase poll error: {}", err);
                    }
                }
                if sender.is_closed() {
                    break;
                }
            }
        });
        Ok(Subscription::new(receiver, Some(task)))
    }
}
