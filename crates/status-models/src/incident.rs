use crate::{CanonicalStatus, LifecycleStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Details of the most recent incident reported by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDetails {
    pub title: String,
    /// Plain-text description, with any HTML markup removed.
    pub description: String,
    #[serde(rename = "status")]
    pub lifecycle_stage: LifecycleStage,
    /// Source-reported creation time. Absent if the source omits it or it
    /// could not be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Best-effort set of affected components, which may be empty.
    #[serde(default)]
    pub components: BTreeSet<String>,
}

/// The result of fetching a single service: its status, and what's known of
/// its most recent incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub status: CanonicalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_incident: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident: Option<IncidentDetails>,
}

impl Observation {
    /// Observation of a service which could not be fetched.
    pub fn unknown() -> Self {
        Self::bare(CanonicalStatus::Unknown)
    }

    /// Observation with a status and no incident information.
    pub fn bare(status: CanonicalStatus) -> Self {
        Self {
            status,
            last_incident: None,
            incident: None,
        }
    }
}
