//! Utilities for extracting plain, classifiable content out of the loosely
//! structured text that status pages publish.
use lazy_static::lazy_static;
use regex::Regex;
use status_models::LifecycleStage;
use std::collections::BTreeSet;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    // A line break followed by whitespace which includes another line break.
    static ref BLANK_LINES_RE: Regex = Regex::new(r"\n\s*\n").unwrap();
    static ref COMPONENT_RES: Vec<Regex> = [
        "API",
        "DNS",
        "CDN",
        "Database",
        "Web Interface",
        "Dashboard",
        "Authentication",
        "Storage",
        "Compute",
        "Networking",
    ]
    .iter()
    .map(|name| Regex::new(&format!("(?i){}", regex::escape(name))).unwrap())
    .collect();
}

// Replacements are applied in order. `&amp;#39;` is a doubly-escaped
// apostrophe which some status pages emit.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&amp;#39;", "'"),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
];

/// Remove markup from `html`, decode common entities, and collapse blank lines.
pub fn strip_html(html: &str) -> String {
    let mut text = TAG_RE.replace_all(html, "").into_owned();

    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    BLANK_LINES_RE.replace_all(&text, "\n").trim().to_string()
}

/// Best-effort extraction of well-known component names mentioned by `text`.
/// Each component contributes its first match, as written in the text.
pub fn extract_components(text: &str) -> BTreeSet<String> {
    COMPONENT_RES
        .iter()
        .filter_map(|re| re.find(text))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Guess the lifecycle stage of an incident from its free-form content.
pub fn classify_lifecycle(text: &str) -> LifecycleStage {
    let text = text.to_lowercase();

    if text.contains("resolved") {
        LifecycleStage::Resolved
    } else if text.contains("monitoring") {
        LifecycleStage::Monitoring
    } else if text.contains("identified") {
        LifecycleStage::Identified
    } else {
        LifecycleStage::Investigating
    }
}

/// Map the `status` field of a status-page incident into its lifecycle stage.
pub fn map_api_lifecycle(status: Option<&str>) -> LifecycleStage {
    match status.map(str::to_lowercase).as_deref() {
        Some("resolved") => LifecycleStage::Resolved,
        Some("monitoring") => LifecycleStage::Monitoring,
        Some("identified") => LifecycleStage::Identified,
        _ => LifecycleStage::Investigating,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_strip_html() {
        let html = "<p>We&#39;re investigating&nbsp;errors in the <b>API</b>.</p>\n\n  \n<p>Fix &amp; monitor &lt;soon&gt; &quot;ish&quot;</p>\n";
        insta::assert_snapshot!(strip_html(html), @r###"
        We're investigating errors in the API.
        Fix & monitor <soon> "ish"
        "###);

        assert_eq!(strip_html("It&amp;#39;s &apos;fine&apos;"), "It's 'fine'");
        assert_eq!(strip_html("   "), "");
        // Tags are removed before entities are decoded, so escaped markup survives as text.
        assert_eq!(strip_html("&lt;b&gt;bold&lt;/b&gt;"), "<b>bold</b>");
    }

    #[test]
    fn test_extract_components() {
        let found = extract_components(
            "Elevated latency for the api and dashboard; DNS resolution and the web interface are unaffected. The API is fine.",
        );
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["DNS", "api", "dashboard", "web interface"]
        );
        assert!(extract_components("All good").is_empty());
    }

    #[test]
    fn test_classify_lifecycle() {
        assert_eq!(
            classify_lifecycle("Resolved: we were monitoring"),
            LifecycleStage::Resolved
        );
        assert_eq!(
            classify_lifecycle("MONITORING - issue identified"),
            LifecycleStage::Monitoring
        );
        assert_eq!(
            classify_lifecycle("The cause has been identified"),
            LifecycleStage::Identified
        );
        assert_eq!(
            classify_lifecycle("Elevated error rates"),
            LifecycleStage::Investigating
        );
    }

    #[test]
    fn test_map_api_lifecycle() {
        assert_eq!(map_api_lifecycle(Some("Resolved")), LifecycleStage::Resolved);
        assert_eq!(map_api_lifecycle(Some("monitoring")), LifecycleStage::Monitoring);
        assert_eq!(map_api_lifecycle(Some("identified")), LifecycleStage::Identified);
        assert_eq!(
            map_api_lifecycle(Some("postmortem")),
            LifecycleStage::Investigating
        );
        assert_eq!(map_api_lifecycle(None), LifecycleStage::Investigating);
    }
}
