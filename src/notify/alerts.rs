use serde::Serialize;

use super::NotifyError;
use crate::config::AlertsConfig;

#[derive(Debug, Clone, Copy, Serialize)]
pub enum AlertKind {
    #[serde(rename = "ALERT_SUBSCRIPTION")]
    Subscription,
}

#[derive(Serialize)]
struct AlertRequest<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    kind: AlertKind,
}

/// HTTP client for the on-stream alert service.
pub struct AlertsClient {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl AlertsClient {
    pub fn new(config: &AlertsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.url.clone(),
            token: config.token.clone(),
        }
    }

    pub async fn send_alert(&self, message: &str, kind: AlertKind) -> Result<(), NotifyError> {
        let mut request = self.http.post(&self.url).json(&AlertRequest { message, kind });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(format!(
                "status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
