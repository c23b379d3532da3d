use crate::{Notification, Notifier, NotifierError, Renderer};
use status_models::StatusChangeEvent;
use std::collections::BTreeSet;

/// Decider filters the changes of a run to those of high-priority services,
/// and notifies of them.
#[derive(Debug)]
pub struct Decider {
    renderer: Renderer,
    triggers: BTreeSet<String>,
}

impl Decider {
    pub fn new(triggers: BTreeSet<String>) -> anyhow::Result<Self> {
        Ok(Self {
            renderer: Renderer::try_new()?,
            triggers,
        })
    }

    /// Changes of services in the trigger set, in their given order.
    pub fn priority_changes<'c>(
        &self,
        changes: &'c [StatusChangeEvent],
    ) -> Vec<&'c StatusChangeEvent> {
        changes
            .iter()
            .filter(|change| self.triggers.contains(&change.slug))
            .collect()
    }

    /// Build the consolidated notification of a run, or None if no priority
    /// service changed.
    pub fn decide(
        &self,
        changes: &[StatusChangeEvent],
        incidents: &[String],
    ) -> Result<Option<Notification>, NotifierError> {
        let priority = self.priority_changes(changes);
        if priority.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.renderer.render(&priority, incidents)?))
    }

    /// Decide whether to notify of `changes` and, if so, send exactly one
    /// notification through `notifier`. Returns whether a notification was sent.
    pub async fn notify<N: Notifier>(
        &self,
        notifier: &N,
        changes: &[StatusChangeEvent],
        incidents: &[String],
    ) -> Result<bool, NotifierError> {
        let Some(notification) = self.decide(changes, incidents)? else {
            tracing::debug!(changes = changes.len(), "no priority changes to notify");
            return Ok(false);
        };

        notifier.send(&notification).await?;
        tracing::info!(subject = %notification.subject, "sent priority status notification");

        Ok(true)
    }
}
