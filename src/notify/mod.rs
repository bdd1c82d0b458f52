//! Notification sinks
//!
//! Each sink implements [`Notifier`]. The run's unexpected ads are sent as
//! one message (see [`crate::output::notification_message`]) to every
//! configured sink; a failing sink does not stop the others.

mod discord;
mod slack;
mod telegram;

pub use discord::DiscordNotifier;
pub use slack::SlackNotifier;
pub use telegram::TelegramNotifier;

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Errors that can occur while delivering a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{sink} returned status {status}")]
    Status { sink: &'static str, status: u16 },

    #[error("{sink} rejected the message: {message}")]
    Api { sink: &'static str, message: String },
}

/// A place notifications can be delivered to
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short sink name used in logs
    fn name(&self) -> &'static str;

    /// Delivers `message`
    ///
    /// Sinks with several targets succeed when at least one target got it.
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Outcome of [`send_notifications`]
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<(&'static str, NotifyError)>,
}

impl DeliveryReport {
    pub fn any_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }
}

/// Builds a notifier for every sink present in the configuration
pub fn notifiers_from_config(client: &Client, config: &Config) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

    if let Some(slack) = &config.slack {
        notifiers.push(Box::new(SlackNotifier::new(
            client.clone(),
            &slack.token,
            slack.channels.clone(),
        )));
    }
    if let Some(telegram) = &config.telegram {
        notifiers.push(Box::new(TelegramNotifier::new(
            client.clone(),
            &telegram.token,
            telegram.chat_ids.clone(),
        )));
    }
    if let Some(discord) = &config.discord {
        notifiers.push(Box::new(DiscordNotifier::new(
            client.clone(),
            &discord.token,
            &discord.webhook_id,
        )));
    }

    notifiers
}

/// Sends `message` to every notifier, one after another
pub async fn send_notifications(notifiers: &[Box<dyn Notifier>], message: &str) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    tracing::debug!("Notification message:\n{}", message);

    for notifier in notifiers {
        match notifier.send(message).await {
            Ok(()) => {
                tracing::info!("Notification sent via {}", notifier.name());
                report.delivered.push(notifier.name());
            }
            Err(e) => {
                tracing::error!("Error sending notification via {}: {}", notifier.name(), e);
                report.failed.push((notifier.name(), e));
            }
        }
    }

    report
}

/// Runs `send` for every target, keeping the last error
///
/// Succeeds when at least one target was reached.
async fn deliver_to_targets<T, F, Fut>(
    sink: &'static str,
    targets: &[T],
    mut send: F,
) -> Result<(), NotifyError>
where
    T: std::fmt::Display,
    F: FnMut(&T) -> Fut,
    Fut: std::future::Future<Output = Result<(), NotifyError>>,
{
    let mut delivered = 0;
    let mut last_error = None;

    for target in targets {
        match send(target).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!("{} delivery to {} failed: {}", sink, target, e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if delivered == 0 => Err(e),
        _ => Ok(()),
    }
}
