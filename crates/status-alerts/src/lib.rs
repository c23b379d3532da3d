mod decider;
mod differ;
mod notifier;
mod render;

pub use decider::Decider;
pub use differ::diff;
pub use notifier::{Notifier, NotifierError, Sender, WebhookNotifier};
pub use render::Renderer;

/// A rendered notification of a run's priority status changes.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}
