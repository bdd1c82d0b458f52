use super::{Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

const DEFAULT_DISCORD_API: &str = "https://discord.com";

/// Discord rejects webhook messages longer than this
const MAX_CONTENT_CHARS: usize = 2000;

/// Posts notifications through a Discord webhook
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    client: Client,
    token: String,
    webhook_id: String,
    base_url: String,
}

impl DiscordNotifier {
    pub fn new(client: Client, token: &str, webhook_id: &str) -> Self {
        Self {
            client,
            token: token.to_string(),
            webhook_id: webhook_id.to_string(),
            base_url: DEFAULT_DISCORD_API.to_string(),
        }
    }

    /// Points the notifier at another API host (for testing with wiremock)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn post(&self, content: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(format!(
                "{}/api/webhooks/{}/{}",
                self.base_url, self.webhook_id, self.token
            ))
            .json(&json!({ "content": content }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status {
                sink: "discord",
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    /// Long messages are split into several webhook posts
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        for chunk in split_message(message, MAX_CONTENT_CHARS) {
            self.post(&chunk).await?;
        }
        Ok(())
    }
}

/// Splits on line boundaries so that no chunk exceeds `max_chars`
///
/// A single line longer than `max_chars` is cut at a character boundary.
fn split_message(message: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
