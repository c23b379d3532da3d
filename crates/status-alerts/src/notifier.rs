use crate::Notification;

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("failed to render notification")]
    Render(#[from] handlebars::RenderError),
    #[error("notification transport error")]
    Transport(#[from] reqwest::Error),
    #[error("notification endpoint {url} responded with status {status}")]
    Status {
        url: url::Url,
        status: reqwest::StatusCode,
    },
}

/// Notifier delivers a rendered notification to its recipients.
pub trait Notifier: std::fmt::Debug + Send + Sync {
    fn send<'s>(
        &'s self,
        notification: &'s Notification,
    ) -> impl std::future::Future<Output = Result<(), NotifierError>> + Send + 's;
}

/// Posts notifications as JSON `{"subject": .., "message": ..}` to a webhook.
#[derive(Debug)]
pub struct WebhookNotifier {
    url: url::Url,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
        let response = self
            .http_client
            .post(self.url.clone())
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Status {
                url: self.url.clone(),
                status,
            });
        }
        tracing::debug!(url = %self.url, %status, "delivered notification");

        Ok(())
    }
}

#[derive(Debug)]
pub enum Sender {
    Disabled,
    Webhook(WebhookNotifier),
}

impl Sender {
    pub fn webhook(url: url::Url, http_client: reqwest::Client) -> Sender {
        Sender::Webhook(WebhookNotifier { url, http_client })
    }
}

impl Notifier for Sender {
    async fn send<'s>(&'s self, notification: &'s Notification) -> Result<(), NotifierError> {
        match self {
            Sender::Disabled => {
                tracing::warn!(
                    subject = %notification.subject,
                    "skipping sending notification (disabled)"
                );
                Ok(())
            }
            Sender::Webhook(webhook) => webhook.send(notification).await,
        }
    }
}
