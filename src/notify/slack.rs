use super::{deliver_to_targets, Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_SLACK_API: &str = "https://slack.com";

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts notifications to Slack channels with a bot token
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: Client,
    token: String,
    channels: Vec<String>,
    base_url: String,
}

impl SlackNotifier {
    pub fn new(client: Client, token: &str, channels: Vec<String>) -> Self {
        Self {
            client,
            token: token.to_string(),
            channels,
            base_url: DEFAULT_SLACK_API.to_string(),
        }
    }

    /// Points the notifier at another API host (for testing with wiremock)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn post(&self, channel: &str, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(format!("{}/api/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({ "channel": channel, "text": message }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status {
                sink: "slack",
                status: response.status().as_u16(),
            });
        }

        // Slack reports most failures as 200 with ok = false
        let body: SlackResponse = response.json().await?;
        if !body.ok {
            return Err(NotifyError::Api {
                sink: "slack",
                message: body.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        deliver_to_targets("slack", &self.channels, |channel| {
            let channel = channel.clone();
            async move { self.post(&channel, message).await }
        })
        .await
    }
}
