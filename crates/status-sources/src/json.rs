//! Status-page style JSON sources, which publish a summary status document
//! and, optionally, a document of recent incidents.
use crate::content::{map_api_lifecycle, strip_html};
use crate::feed::parse_feed_date;
use crate::normalize::normalize;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use status_models::{CanonicalStatus, IncidentDetails};
use std::collections::BTreeSet;

/// Summary document of the form `{"status": {"indicator": .., "description": ..}}`.
#[derive(Debug, Default, Deserialize)]
pub struct StatusDocument {
    #[serde(default)]
    pub status: Option<StatusIndicator>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusIndicator {
    #[serde(default)]
    pub indicator: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl StatusDocument {
    /// Normalize the indicator and description, taken together.
    pub fn canonical_status(&self) -> CanonicalStatus {
        let (indicator, description) = match &self.status {
            Some(StatusIndicator {
                indicator,
                description,
            }) => (
                indicator.as_deref().unwrap_or_default(),
                description.as_deref().unwrap_or_default(),
            ),
            None => ("", ""),
        };
        normalize(&format!("{indicator} {description}"))
    }
}

/// Document of the form `{"incidents": [..]}`. Every field is optional, as
/// status pages differ in what they populate.
#[derive(Debug, Default, Deserialize)]
pub struct IncidentsDocument {
    #[serde(default)]
    pub incidents: Vec<ApiIncident>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiIncident {
    pub name: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub started_at: Option<String>,
    pub incident_updates: Option<Vec<ApiIncidentUpdate>>,
    /// Distinguishes an absent list from an empty one: an incident which
    /// lists no components doesn't fall back to those of its updates.
    pub components: Option<Vec<ApiComponent>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiIncidentUpdate {
    pub body: Option<String>,
    pub affected_components: Option<Vec<ApiComponent>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiComponent {
    pub name: Option<String>,
}

fn component_names(components: &[ApiComponent]) -> BTreeSet<String> {
    components
        .iter()
        .filter_map(|c| c.name.clone())
        .collect()
}

impl ApiIncident {
    /// The date by which incidents are ordered. Each candidate field is
    /// consulted only if the preceding ones are absent.
    fn reported_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .or(self.updated_at.as_deref())
            .or(self.started_at.as_deref())
            .and_then(parse_feed_date)
    }

    fn details(&self) -> IncidentDetails {
        let first_update = self.incident_updates.as_deref().and_then(<[_]>::first);

        let title = self
            .name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("Unknown Incident")
            .to_string();

        let description = first_update
            .and_then(|u| u.body.as_deref())
            .or(self.body.as_deref())
            .map(strip_html)
            .unwrap_or_default();

        let created_at = self
            .created_at
            .as_deref()
            .or(self.started_at.as_deref())
            .and_then(parse_feed_date);
        let updated_at = self
            .updated_at
            .as_deref()
            .and_then(parse_feed_date)
            .or(created_at);

        let components = match (&self.components, first_update) {
            (Some(components), _) => component_names(components),
            (None, Some(update)) => {
                component_names(update.affected_components.as_deref().unwrap_or_default())
            }
            (None, None) => BTreeSet::new(),
        };

        IncidentDetails {
            title,
            description,
            lifecycle_stage: map_api_lifecycle(self.status.as_deref()),
            created_at,
            updated_at,
            components,
        }
    }
}

impl IncidentsDocument {
    /// Select the most recently reported incident, and build its details.
    /// Incidents without a parseable date are ignored, and ties keep the
    /// incident listed first.
    pub fn latest(&self) -> Option<(DateTime<Utc>, IncidentDetails)> {
        let mut latest: Option<(DateTime<Utc>, &ApiIncident)> = None;

        for incident in &self.incidents {
            let Some(at) = incident.reported_at() else {
                continue;
            };
            if latest.map_or(true, |(latest_at, _)| at > latest_at) {
                latest = Some((at, incident));
            }
        }
        latest.map(|(at, incident)| (at, incident.details()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use status_models::LifecycleStage;

    #[test]
    fn test_canonical_status() {
        let doc: StatusDocument = serde_json::from_value(serde_json::json!({
            "page": {"id": "abc"},
            "status": {"indicator": "major", "description": "Partial System Outage"}
        }))
        .unwrap();
        // "partial" is a degraded term, and is checked before "major".
        assert_eq!(doc.canonical_status(), CanonicalStatus::Degraded);

        let doc: StatusDocument = serde_json::from_value(serde_json::json!({
            "status": {"indicator": "none", "description": "All Systems Operational"}
        }))
        .unwrap();
        assert_eq!(doc.canonical_status(), CanonicalStatus::Operational);

        let doc: StatusDocument = serde_json::from_value(serde_json::json!({
            "status": {"indicator": null}
        }))
        .unwrap();
        assert_eq!(doc.canonical_status(), CanonicalStatus::Unknown);

        let doc: StatusDocument = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(doc.canonical_status(), CanonicalStatus::Unknown);
    }

    #[test]
    fn test_latest_incident() {
        let doc: IncidentsDocument = serde_json::from_value(serde_json::json!({
            "incidents": [
                {
                    "name": "Older incident",
                    "status": "resolved",
                    "created_at": "2025-03-08T10:00:00.000Z",
                },
                {
                    "name": "Undated incident",
                },
                {
                    "name": "Elevated API latency",
                    "status": "monitoring",
                    "created_at": "2025-03-10T09:00:00.000-05:00",
                    "updated_at": "2025-03-10T15:30:00.000Z",
                    "incident_updates": [
                        {
                            "body": "<p>A fix has been deployed &amp; we&#39;re monitoring.</p>",
                            "affected_components": [{"name": "Updates API"}],
                        },
                        {"body": "Investigating"},
                    ],
                    "components": [{"name": "API"}, {"name": "Webhooks"}],
                },
                {
                    "title": "Tied, but listed later",
                    "created_at": "2025-03-10T14:00:00Z",
                },
            ]
        }))
        .unwrap();

        let (at, details) = doc.latest().unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap());

        insta::assert_json_snapshot!(details, @r###"
        {
          "title": "Elevated API latency",
          "description": "A fix has been deployed & we're monitoring.",
          "status": "monitoring",
          "createdAt": "2025-03-10T14:00:00Z",
          "updatedAt": "2025-03-10T15:30:00Z",
          "components": [
            "API",
            "Webhooks"
          ]
        }
        "###);
    }

    #[test]
    fn test_incident_fallbacks() {
        let doc: IncidentsDocument = serde_json::from_value(serde_json::json!({
            "incidents": [{
                "body": "Connectivity issues",
                "started_at": "2025-03-10T08:00:00Z",
                "incident_updates": [
                    {"affected_components": [{"name": "Database"}, {"code": "xyz"}]}
                ],
            }]
        }))
        .unwrap();

        let (at, details) = doc.latest().unwrap();
        let started = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();

        assert_eq!(at, started);
        assert_eq!(
            details,
            IncidentDetails {
                title: "Unknown Incident".to_string(),
                description: "Connectivity issues".to_string(),
                lifecycle_stage: LifecycleStage::Investigating,
                created_at: Some(started),
                updated_at: Some(started),
                components: ["Database".to_string()].into(),
            }
        );

        // A present but empty component list doesn't fall back to the update.
        let doc: IncidentsDocument = serde_json::from_value(serde_json::json!({
            "incidents": [{
                "name": "Outage",
                "created_at": "2025-03-10T08:00:00Z",
                "body": null,
                "components": [],
                "incident_updates": [{"affected_components": [{"name": "Database"}]}],
            }]
        }))
        .unwrap();
        assert!(doc.latest().unwrap().1.components.is_empty());
    }

    #[test]
    fn test_no_usable_incidents() {
        let doc: IncidentsDocument = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(doc.latest(), None);

        let doc: IncidentsDocument = serde_json::from_value(serde_json::json!({
            "incidents": [{"name": "Bad date", "created_at": "last tuesday"}]
        }))
        .unwrap();
        assert_eq!(doc.latest(), None);
    }
}
