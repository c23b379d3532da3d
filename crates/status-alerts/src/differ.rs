use status_models::{CanonicalStatus, ServiceDescriptor, StatusChangeEvent};
use std::collections::BTreeMap;

/// Diff the statuses of the current run against those previously persisted.
///
/// An event is returned for each service which has a prior status that
/// differs from its current one. Services without a prior status are
/// observed for the first time, and are never changes. Events are ordered
/// as `current` is.
pub fn diff<'a>(
    prior: &BTreeMap<String, CanonicalStatus>,
    current: impl IntoIterator<Item = (&'a ServiceDescriptor, CanonicalStatus)>,
) -> Vec<StatusChangeEvent> {
    current
        .into_iter()
        .filter_map(|(service, new_status)| match prior.get(&service.slug) {
            Some(old_status) if *old_status != new_status => {
                Some(StatusChangeEvent::new(service, *old_status, new_status))
            }
            _ => None,
        })
        .collect()
}
