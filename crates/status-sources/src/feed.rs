//! RSS and Atom feeds: parsing entries out of a feed document, and evaluating
//! the most recent entry into an Observation.
use crate::content::{classify_lifecycle, extract_components, strip_html};
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::Event;
use status_models::{CanonicalStatus, IncidentDetails, Observation};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to parse feed XML")]
    Xml(#[from] quick_xml::Error),
    #[error("feed ended within an unterminated <{0}> element")]
    Unterminated(String),
}

/// The syndication format of a feed, which determines the elements read from
/// each of its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFlavor {
    /// `<item>` entries having `<title>`, `<description>`, and `<pubDate>`.
    Rss,
    /// `<entry>` entries having `<title>`, `<summary>`, and `<updated>`.
    Atom,
}

impl FeedFlavor {
    fn entry_tag(&self) -> &'static [u8] {
        match self {
            FeedFlavor::Rss => b"item",
            FeedFlavor::Atom => b"entry",
        }
    }

    fn field(&self, tag: &[u8]) -> Option<Field> {
        match (self, tag) {
            (_, b"title") => Some(Field::Title),
            (FeedFlavor::Rss, b"description") | (FeedFlavor::Atom, b"summary") => {
                Some(Field::Body)
            }
            (FeedFlavor::Rss, b"pubDate") | (FeedFlavor::Atom, b"updated") => Some(Field::Date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Body,
    Date,
}

/// An entry of a feed, holding the raw text of the elements we care about.
/// Text of CDATA sections and of regular character data are both retained.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub body: Option<String>,
    pub date: Option<String>,
}

impl FeedEntry {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Body => &mut self.body,
            Field::Date => &mut self.date,
        }
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_feed_date)
    }

    /// Title and body of the entry, joined for keyword classification.
    fn content(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or_default(),
            self.body.as_deref().unwrap_or_default()
        )
    }
}

/// A field of an entry whose text is being captured.
struct Capture {
    field: Field,
    tag: Vec<u8>,
    text: String,
    // Open elements within the capture which share its tag.
    depth: usize,
}

/// Parse all entries of the feed, in document order.
/// Only the first occurrence of each field within an entry is kept.
///
/// Fields regularly embed raw HTML, including void elements like `<br>`, so
/// end tags aren't required to balance. Markup nested within a field is kept
/// as written.
pub fn parse_entries(flavor: FeedFlavor, xml: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().check_end_names = false;

    let mut entries = Vec::new();
    let mut entry: Option<FeedEntry> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = start.local_name();
                let name = name.as_ref();

                if let Some(open) = capture.as_mut() {
                    if name == open.tag {
                        open.depth += 1;
                    }
                    open.text.push('<');
                    open.text.push_str(&String::from_utf8_lossy(&start));
                    open.text.push('>');
                } else if let Some(current) = entry.as_mut() {
                    if let Some(field) = flavor.field(name) {
                        if current.slot(field).is_none() {
                            capture = Some(Capture {
                                field,
                                tag: name.to_vec(),
                                text: String::new(),
                                depth: 0,
                            });
                        }
                    }
                } else if name == flavor.entry_tag() {
                    entry = Some(FeedEntry::default());
                }
            }
            Event::Empty(empty) => {
                if let Some(open) = capture.as_mut() {
                    open.text.push('<');
                    open.text.push_str(&String::from_utf8_lossy(&empty));
                    open.text.push_str("/>");
                }
            }
            Event::End(end) => {
                let name = end.local_name();
                let name = name.as_ref();

                match capture.take() {
                    Some(Capture {
                        field,
                        tag,
                        text,
                        depth: 0,
                    }) if name == tag => {
                        if let Some(current) = entry.as_mut() {
                            *current.slot(field) = Some(text.trim().to_string());
                        }
                    }
                    Some(mut open) => {
                        if name == open.tag {
                            open.depth -= 1;
                        }
                        open.text.push_str("</");
                        open.text.push_str(&String::from_utf8_lossy(&end));
                        open.text.push('>');
                        capture = Some(open);
                    }
                    None => {
                        if name == flavor.entry_tag() {
                            if let Some(done) = entry.take() {
                                entries.push(done);
                            }
                        }
                    }
                }
            }
            Event::Text(text) => {
                if let Some(open) = capture.as_mut() {
                    // Feeds commonly embed HTML entities (`&nbsp;`) which aren't
                    // valid XML. Keep such text verbatim for `strip_html` to decode.
                    match text.unescape() {
                        Ok(unescaped) => open.text.push_str(&unescaped),
                        Err(_) => open.text.push_str(&String::from_utf8_lossy(&text)),
                    }
                }
            }
            Event::CData(cdata) => {
                if let Some(open) = capture.as_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = capture {
        return Err(FeedError::Unterminated(
            String::from_utf8_lossy(&open.tag).into_owned(),
        ));
    }
    if entry.is_some() {
        return Err(FeedError::Unterminated(
            String::from_utf8_lossy(flavor.entry_tag()).into_owned(),
        ));
    }
    Ok(entries)
}

/// Parse a feed date. RSS uses RFC 2822 and Atom uses RFC 3339, but feeds in
/// the wild are loose about both, so a few common variants are accepted.
pub fn parse_feed_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(stripped) = s.strip_suffix(" UTC") {
        if let Ok(dt) = DateTime::parse_from_rfc2822(&format!("{stripped} +0000")) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

const MAINTENANCE_TERMS: &[&str] = &["maintenance", "scheduled", "planned", "upgrade"];
const INCIDENT_TERMS: &[&str] = &[
    "outage",
    "incident",
    "disruption",
    "degraded",
    "investigating",
    "monitoring",
];
const RESOLUTION_TERMS: &[&str] = &["resolved", "completed", "fixed", "restored"];

/// Classify the content of a fresh feed entry.
pub fn classify_entry_content(content: &str) -> CanonicalStatus {
    let content = content.to_lowercase();
    let any = |terms: &[&str]| terms.iter().any(|term| content.contains(term));

    if any(RESOLUTION_TERMS) {
        CanonicalStatus::Operational
    } else if any(MAINTENANCE_TERMS) {
        CanonicalStatus::Maintenance
    } else if any(INCIDENT_TERMS) {
        CanonicalStatus::Incident
    } else {
        CanonicalStatus::Operational
    }
}

/// Whether an entry dated `at` is still within the freshness window at `now`.
pub fn is_fresh(at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - at <= status_models::freshness_window()
}

/// Build incident details out of a feed entry.
/// `classify` is the text from which the lifecycle stage is guessed.
fn entry_details(entry: &FeedEntry, at: DateTime<Utc>, classify: &str) -> IncidentDetails {
    let body = entry.body.as_deref().unwrap_or_default();

    IncidentDetails {
        title: strip_html(entry.title.as_deref().unwrap_or_default()),
        description: strip_html(body),
        lifecycle_stage: classify_lifecycle(classify),
        created_at: Some(at),
        updated_at: Some(at),
        components: extract_components(body),
    }
}

/// Evaluate the entries of an RSS or Atom feed at time `now`.
///
/// The most recent entry which isn't dated in the future is selected (ties go
/// to the earlier entry in document order). An entry older than the freshness
/// window is presumed resolved, and its content is ignored.
pub fn evaluate_entries(entries: &[FeedEntry], now: DateTime<Utc>) -> Observation {
    let mut latest: Option<(&FeedEntry, DateTime<Utc>)> = None;

    for entry in entries {
        let Some(at) = entry.published() else {
            tracing::debug!(date = ?entry.date, "skipping feed entry without a parseable date");
            continue;
        };
        if at > now {
            continue;
        }
        if latest.map_or(true, |(_, latest_at)| at > latest_at) {
            latest = Some((entry, at));
        }
    }

    let Some((entry, at)) = latest else {
        return Observation::bare(CanonicalStatus::Operational);
    };

    if !is_fresh(at, now) {
        return Observation {
            status: CanonicalStatus::Operational,
            last_incident: Some(at),
            incident: None,
        };
    }

    let content = entry.content();
    Observation {
        status: classify_entry_content(&content),
        last_incident: Some(at),
        incident: Some(entry_details(entry, at, &content)),
    }
}

/// Evaluate only the first entry of a feed, in document order, which is
/// reported only if it's fresh. This never determines a status.
pub fn evaluate_first_entry(
    entries: &[FeedEntry],
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, IncidentDetails)> {
    let entry = entries.first()?;
    entry.title.as_ref()?;
    let at = entry.published()?;

    if !is_fresh(at, now) {
        return None;
    }
    let body = entry.body.as_deref().unwrap_or_default();
    Some((at, entry_details(entry, at, body)))
}
