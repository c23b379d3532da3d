use serde::{Deserialize, Serialize};

pub mod config;
mod incident;
mod record;
mod service;

pub use config::{Config, ConfigError, RunConfig};
pub use incident::{IncidentDetails, Observation};
pub use record::{StatusChangeEvent, StatusRecord};
pub use service::{ServiceDescriptor, ServiceSource, SourceKind};

/// Feed entries older than this are presumed resolved, no matter what they say.
pub fn freshness_window() -> chrono::Duration {
    chrono::Duration::hours(24)
}

/// The canonical status that every source is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    Operational,
    Degraded,
    Incident,
    Maintenance,
    Unknown,
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl CanonicalStatus {
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalStatus::Operational => "operational",
            CanonicalStatus::Degraded => "degraded",
            CanonicalStatus::Incident => "incident",
            CanonicalStatus::Maintenance => "maintenance",
            CanonicalStatus::Unknown => "unknown",
        }
    }

    pub fn all() -> &'static [CanonicalStatus] {
        &[
            CanonicalStatus::Operational,
            CanonicalStatus::Degraded,
            CanonicalStatus::Incident,
            CanonicalStatus::Maintenance,
            CanonicalStatus::Unknown,
        ]
    }

    pub fn from_str(name: &str) -> Option<CanonicalStatus> {
        CanonicalStatus::all()
            .iter()
            .find(|status| name.trim().eq_ignore_ascii_case(status.name()))
            .copied()
    }

    /// Rank used only when ordering statuses for display. Change detection
    /// compares statuses for equality and never consults this.
    pub fn severity(&self) -> u8 {
        match self {
            CanonicalStatus::Operational => 0,
            CanonicalStatus::Maintenance => 1,
            CanonicalStatus::Degraded => 2,
            CanonicalStatus::Incident => 3,
            CanonicalStatus::Unknown => 4,
        }
    }
}

/// Lifecycle stage of an incident, as reported (or guessed) from its source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    #[default]
    Investigating,
    Identified,
    Monitoring,
    Resolved,
}

impl LifecycleStage {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleStage::Investigating => "investigating",
            LifecycleStage::Identified => "identified",
            LifecycleStage::Monitoring => "monitoring",
            LifecycleStage::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
