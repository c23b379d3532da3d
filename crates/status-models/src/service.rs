use serde::{Deserialize, Serialize};

/// A monitored third-party service, as defined by the catalog configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique key of the service, used as the primary key of its status record.
    pub slug: String,
    /// Human readable name used in notifications.
    #[serde(rename = "name")]
    pub display_name: String,
    /// Where and how the service publishes its status.
    #[serde(flatten)]
    pub source: ServiceSource,
}

/// The endpoint(s) from which a service's status is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ServiceSource {
    /// A status-page style JSON API, with an optional incidents endpoint.
    Json {
        status_url: url::Url,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        incidents_url: Option<url::Url>,
    },
    Rss {
        feed_url: url::Url,
    },
    Atom {
        feed_url: url::Url,
    },
    /// A JSON aggregate-state endpoint, optionally enriched by an RSS feed.
    Hybrid {
        json_url: url::Url,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feed_url: Option<url::Url>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Json,
    Rss,
    Atom,
    Hybrid,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Json => "json",
            SourceKind::Rss => "rss",
            SourceKind::Atom => "atom",
            SourceKind::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl ServiceSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ServiceSource::Json { .. } => SourceKind::Json,
            ServiceSource::Rss { .. } => SourceKind::Rss,
            ServiceSource::Atom { .. } => SourceKind::Atom,
            ServiceSource::Hybrid { .. } => SourceKind::Hybrid,
        }
    }

    /// All endpoints of this source, primary endpoint first.
    pub fn urls(&self) -> Vec<&url::Url> {
        match self {
            ServiceSource::Json {
                status_url,
                incidents_url,
            } => std::iter::once(status_url)
                .chain(incidents_url.iter())
                .collect(),
            ServiceSource::Rss { feed_url } | ServiceSource::Atom { feed_url } => vec![feed_url],
            ServiceSource::Hybrid { json_url, feed_url } => {
                std::iter::once(json_url).chain(feed_url.iter()).collect()
            }
        }
    }
}
