use crate::{CanonicalStatus, IncidentDetails, Observation, ServiceDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted status of a service, overwritten on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub slug: String,
    pub status: CanonicalStatus,
    pub last_incident_timestamp: Option<DateTime<Utc>>,
    pub last_incident_details: Option<IncidentDetails>,
    /// Wall-clock time of the run which wrote this record.
    pub updated_at: DateTime<Utc>,
}

impl StatusRecord {
    pub fn new(
        slug: impl Into<String>,
        observation: Observation,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let Observation {
            status,
            last_incident,
            incident,
        } = observation;

        Self {
            slug: slug.into(),
            status,
            last_incident_timestamp: last_incident,
            last_incident_details: incident,
            updated_at,
        }
    }
}

/// A transition of a service's status between its previously persisted value
/// and the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeEvent {
    pub slug: String,
    pub display_name: String,
    pub old_status: CanonicalStatus,
    pub new_status: CanonicalStatus,
}

impl StatusChangeEvent {
    pub fn new(
        service: &ServiceDescriptor,
        old_status: CanonicalStatus,
        new_status: CanonicalStatus,
    ) -> Self {
        Self {
            slug: service.slug.clone(),
            display_name: service.display_name.clone(),
            old_status,
            new_status,
        }
    }
}
