use status_models::CanonicalStatus;

// Keyword groups are evaluated in this order, and the first group having any
// term contained in the text wins. Note the ordering is significant: text
// mentioning both "operational" and "monitoring" is operational.
const KEYWORD_GROUPS: &[(CanonicalStatus, &[&str])] = &[
    (
        CanonicalStatus::Operational,
        &["operational", "available", "none", "100.000% uptime", "100% uptime"],
    ),
    (
        CanonicalStatus::Degraded,
        &["degraded", "partial", "slow", "performance"],
    ),
    (
        CanonicalStatus::Incident,
        &[
            "minor",
            "major",
            "outage",
            "incident",
            "disruption",
            "monitoring",
        ],
    ),
    (CanonicalStatus::Maintenance, &["maintenance"]),
];

/// Map free-form status text, such as a status page's indicator and
/// description, into a CanonicalStatus.
pub fn normalize(text: &str) -> CanonicalStatus {
    let text = text.to_lowercase();

    KEYWORD_GROUPS
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| text.contains(term)))
        .map(|(status, _)| *status)
        .unwrap_or(CanonicalStatus::Unknown)
}

/// Map the `aggregate_state` of a hybrid source's JSON summary. Unlike
/// `normalize`, this is an exact match over a small fixed vocabulary.
pub fn normalize_aggregate_state(state: &str) -> CanonicalStatus {
    match state.trim().to_lowercase().as_str() {
        "operational" => CanonicalStatus::Operational,
        "degraded" | "partial_outage" | "partial outage" => CanonicalStatus::Degraded,
        "major_outage" | "major outage" | "outage" | "incident" => CanonicalStatus::Incident,
        "maintenance" => CanonicalStatus::Maintenance,
        _ => CanonicalStatus::Unknown,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_cases() {
        let cases = [
            ("none All Systems Operational", CanonicalStatus::Operational),
            ("NONE", CanonicalStatus::Operational),
            ("Service is available", CanonicalStatus::Operational),
            ("100.000% uptime", CanonicalStatus::Operational),
            ("minor Partially Degraded Service", CanonicalStatus::Degraded),
            ("Slow API responses", CanonicalStatus::Degraded),
            ("major outage", CanonicalStatus::Incident),
            ("critical Major Service Outage", CanonicalStatus::Incident),
            ("We are monitoring a fix", CanonicalStatus::Incident),
            ("Service Disruption", CanonicalStatus::Incident),
            ("maintenance Service Under Maintenance", CanonicalStatus::Maintenance),
            ("", CanonicalStatus::Unknown),
            ("critical", CanonicalStatus::Unknown),
        ];

        for (text, expect) in cases {
            assert_eq!(normalize(text), expect, "normalizing {text:?}");
        }
    }

    #[test]
    fn test_normalize_precedence_is_fixed() {
        // Operational terms are checked before incident terms, even when the
        // text plainly describes an incident.
        assert_eq!(
            normalize("Monitoring: most services operational"),
            CanonicalStatus::Operational
        );
        assert_eq!(
            normalize("major outage, none affected"),
            CanonicalStatus::Operational
        );
        // Degraded terms are checked before incident terms.
        assert_eq!(
            normalize("major performance issues"),
            CanonicalStatus::Degraded
        );
        // And incident terms before maintenance.
        assert_eq!(
            normalize("minor issue during maintenance"),
            CanonicalStatus::Incident
        );
    }

    #[test]
    fn test_normalize_aggregate_state() {
        let cases = [
            ("operational", CanonicalStatus::Operational),
            ("degraded", CanonicalStatus::Degraded),
            ("partial_outage", CanonicalStatus::Degraded),
            ("Partial Outage", CanonicalStatus::Degraded),
            ("major_outage", CanonicalStatus::Incident),
            ("outage", CanonicalStatus::Incident),
            ("incident", CanonicalStatus::Incident),
            ("maintenance", CanonicalStatus::Maintenance),
            ("downtime", CanonicalStatus::Unknown),
            ("all systems operational", CanonicalStatus::Unknown),
        ];

        for (state, expect) in cases {
            assert_eq!(normalize_aggregate_state(state), expect, "mapping {state:?}");
        }
    }
}
