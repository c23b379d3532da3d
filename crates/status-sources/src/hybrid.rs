use crate::normalize::normalize_aggregate_state;
use serde::Deserialize;
use status_models::CanonicalStatus;

/// Summary document of a hybrid source, of the form
/// `{"data": {"attributes": {"aggregate_state": ..}}}`.
#[derive(Debug, Default, Deserialize)]
pub struct HybridDocument {
    pub data: Option<HybridData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HybridData {
    pub attributes: Option<HybridAttributes>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HybridAttributes {
    pub aggregate_state: Option<String>,
}

impl HybridDocument {
    pub fn aggregate_state(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|d| d.attributes.as_ref())
            .and_then(|a| a.aggregate_state.as_deref())
            .unwrap_or("unknown")
    }

    pub fn canonical_status(&self) -> CanonicalStatus {
        normalize_aggregate_state(self.aggregate_state())
    }
}
