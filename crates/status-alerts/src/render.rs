use crate::Notification;
use anyhow::Context;
use serde::Serialize;
use status_models::{CanonicalStatus, StatusChangeEvent};

const SUBJECT: &str = "subject";
const MESSAGE: &str = "message";

/// Renderer of the consolidated notification sent for a run's changes.
#[derive(Debug)]
pub struct Renderer {
    registry: handlebars::Handlebars<'static>,
}

#[derive(Serialize)]
struct ChangeLine<'a> {
    emoji: &'static str,
    display_name: &'a str,
    old_status: CanonicalStatus,
    new_status: CanonicalStatus,
}

#[derive(Serialize)]
struct MessageContext<'a> {
    changes: Vec<ChangeLine<'a>>,
    incidents: &'a [String],
}

fn emoji(status: CanonicalStatus) -> &'static str {
    match status {
        CanonicalStatus::Operational => "✅",
        CanonicalStatus::Incident => "🚨",
        CanonicalStatus::Maintenance => "🔧",
        CanonicalStatus::Degraded => "⚠️",
        CanonicalStatus::Unknown => "❓",
    }
}

impl Renderer {
    pub fn try_new() -> anyhow::Result<Self> {
        let mut registry = handlebars::Handlebars::new();
        // Notifications are plain text.
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(
                SUBJECT,
                "High-Priority Service Alert: {{#each changes}}{{#unless @first}}, {{/unless}}{{display_name}}:{{new_status}}{{/each}}",
            )
            .context("registering subject template")?;

        // Block tags never stand alone on a line, so that no line breaks are trimmed.
        registry
            .register_template_string(
                MESSAGE,
                concat!(
                    "High-Priority Service Status Updates:\n\n",
                    "{{#each changes}}{{emoji}} {{display_name}}: {{old_status}} → {{new_status}}\n{{/each}}",
                    "{{#if incidents}}\n🚨 All Services Currently Experiencing Incidents:\n",
                    "{{#each incidents}}• {{this}}\n{{/each}}",
                    "{{else}}\n✅ All monitored services are operational!\n{{/if}}",
                ),
            )
            .context("registering message template")?;

        Ok(Self { registry })
    }

    /// Render a notification of `changes`, where `incidents` are the display
    /// names of all services which are currently in incident.
    pub fn render(
        &self,
        changes: &[&StatusChangeEvent],
        incidents: &[String],
    ) -> Result<Notification, handlebars::RenderError> {
        let context = MessageContext {
            changes: changes
                .iter()
                .map(|change| ChangeLine {
                    emoji: emoji(change.new_status),
                    display_name: &change.display_name,
                    old_status: change.old_status,
                    new_status: change.new_status,
                })
                .collect(),
            incidents,
        };

        Ok(Notification {
            subject: self.registry.render(SUBJECT, &context)?,
            message: self.registry.render(MESSAGE, &context)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn change(name: &str, old: CanonicalStatus, new: CanonicalStatus) -> StatusChangeEvent {
        StatusChangeEvent {
            slug: name.to_lowercase(),
            display_name: name.to_string(),
            old_status: old,
            new_status: new,
        }
    }

    #[test]
    fn test_render_with_incidents() {
        let renderer = Renderer::try_new().unwrap();
        let changes = [
            change("OpenAI", CanonicalStatus::Operational, CanonicalStatus::Incident),
            change("Stripe", CanonicalStatus::Maintenance, CanonicalStatus::Degraded),
            change("Vercel & Co", CanonicalStatus::Unknown, CanonicalStatus::Operational),
        ];
        let notification = renderer
            .render(
                &changes.iter().collect::<Vec<_>>(),
                &["OpenAI".to_string(), "<Supabase>".to_string()],
            )
            .unwrap();

        insta::assert_snapshot!(notification.subject, @"High-Priority Service Alert: OpenAI:incident, Stripe:degraded, Vercel & Co:operational");
        insta::assert_snapshot!(notification.message, @r###"
        High-Priority Service Status Updates:

        🚨 OpenAI: operational → incident
        ⚠️ Stripe: maintenance → degraded
        ✅ Vercel & Co: unknown → operational

        🚨 All Services Currently Experiencing Incidents:
        • OpenAI
        • <Supabase>
        "###);
    }

    #[test]
    fn test_render_all_operational() {
        let renderer = Renderer::try_new().unwrap();
        let changes = [change(
            "GitHub",
            CanonicalStatus::Incident,
            CanonicalStatus::Unknown,
        )];
        let notification = renderer
            .render(&changes.iter().collect::<Vec<_>>(), &[])
            .unwrap();

        assert_eq!(notification.subject, "High-Priority Service Alert: GitHub:unknown");
        assert_eq!(
            notification.message,
            "High-Priority Service Status Updates:\n\n❓ GitHub: incident → unknown\n\n✅ All monitored services are operational!\n"
        );
    }
}
