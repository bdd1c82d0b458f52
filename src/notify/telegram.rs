use super::{deliver_to_targets, Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends notifications to Telegram chats through the Bot API
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_ids: Vec<i64>,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(client: Client, token: &str, chat_ids: Vec<i64>) -> Self {
        Self {
            client,
            token: token.to_string(),
            chat_ids,
            base_url: DEFAULT_TELEGRAM_API.to_string(),
        }
    }

    /// Points the notifier at another API host (for testing with wiremock)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn send_to_chat(&self, chat_id: i64, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(format!("{}/bot{}/sendMessage", self.base_url, self.token))
            .json(&json!({ "chat_id": chat_id, "text": message }))
            .send()
            .await?;

        let status = response.status();
        let body: Option<TelegramResponse> = response.json().await.ok();

        match body {
            Some(body) if body.ok && status.is_success() => Ok(()),
            Some(TelegramResponse {
                description: Some(description),
                ..
            }) => Err(NotifyError::Api {
                sink: "telegram",
                message: description,
            }),
            _ => Err(NotifyError::Status {
                sink: "telegram",
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        deliver_to_targets("telegram", &self.chat_ids, |chat_id| {
            let chat_id = *chat_id;
            async move { self.send_to_chat(chat_id, message).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sends_to_every_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(json!({ "chat_id": -1001 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(json!({ "chat_id": 42 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(Client::new(), "123:abc", vec![-1001, 42])
            .with_base_url(&server.uri());

        assert!(notifier.send("hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejected_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let notifier =
            TelegramNotifier::new(Client::new(), "123:abc", vec![7]).with_base_url(&server.uri());

        match notifier.send("hello").await {
            Err(NotifyError::Api { message, .. }) => {
                assert_eq!(message, "Bad Request: chat not found")
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }
}
