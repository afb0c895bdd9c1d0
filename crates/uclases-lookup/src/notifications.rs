use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uclases_core::config::resolve_url;
use uclases_core::{MarkAllReadResponse, ToggleReadResponse};

use crate::error::{LookupError, Result};
use crate::http::AjaxClient;

/// Server side of the notification read-state toggles.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    /// POST a mark-read / mark-unread form to `action`.
    async fn toggle_read(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> Result<ToggleReadResponse>;

    /// POST the mark-all-as-read form to `action`.
    async fn mark_all_read(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> Result<MarkAllReadResponse>;
}

pub struct HttpNotificationBackend {
    client: AjaxClient,
    base_url: String,
}

impl HttpNotificationBackend {
    /// `base_url` is prepended to relative form actions.
    pub fn new(client: AjaxClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    async fn post<T: DeserializeOwned>(&self, action: &str, fields: &[(String, String)]) -> Result<T> {
        let body = self.client.post_form(&resolve_url(&self.base_url, action), fields).await?;
        serde_json::from_str(&body).map_err(|e| LookupError::Parse(e.to_string()))
    }
}

#[async_trait]
impl NotificationBackend for HttpNotificationBackend {
    async fn toggle_read(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> Result<ToggleReadResponse> {
        self.post(action, fields).await
    }

    async fn mark_all_read(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> Result<MarkAllReadResponse> {
        self.post(action, fields).await
    }
}
