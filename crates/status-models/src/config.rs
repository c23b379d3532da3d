//! The service catalog: which services are monitored, how each is fetched,
//! and which of them are important enough to notify about.
//!
//! A catalog is a YAML document of the form:
//! ```yaml
//! triggers: [github, slack]
//! run:
//!   concurrency: 8
//!   fetch_timeout: 15s
//! services:
//!   - slug: github
//!     name: GitHub
//!     source: json
//!     status_url: https://www.githubstatus.com/api/v2/status.json
//!     incidents_url: https://www.githubstatus.com/api/v2/incidents.json
//!   - slug: slack
//!     name: Slack
//!     source: rss
//!     feed_url: https://slack-status.com/feed/rss
//! ```
//!
//! It's loaded once per run and is never mutated afterwards.
use crate::ServiceDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read service catalog '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse service catalog")]
    Yaml(#[from] serde_yaml::Error),
    #[error("service slug '{0}' is defined more than once")]
    DuplicateSlug(String),
    #[error("service slug must not be empty (display name '{0}')")]
    EmptySlug(String),
    #[error("service '{slug}' has an unsupported URL scheme: '{url}'")]
    UnsupportedScheme { slug: String, url: url::Url },
    #[error("run concurrency must be at least one")]
    ZeroConcurrency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Slugs of high-priority services whose changes warrant a notification.
    #[serde(default)]
    pub triggers: BTreeSet<String>,
    #[serde(default)]
    pub run: RunConfig,
    /// Monitored services, in processing order.
    pub services: Vec<ServiceDescriptor>,
}

/// Tuning of a single polling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum number of services fetched concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Deadline for fetching a single service, including all its endpoints.
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: std::time::Duration,
}

fn default_concurrency() -> usize {
    8
}

fn default_fetch_timeout() -> std::time::Duration {
    std::time::Duration::from_secs(15)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        let mut seen = BTreeSet::new();
        for service in &self.services {
            if service.slug.trim().is_empty() {
                return Err(ConfigError::EmptySlug(service.display_name.clone()));
            }
            if !seen.insert(service.slug.as_str()) {
                return Err(ConfigError::DuplicateSlug(service.slug.clone()));
            }
            for url in service.source.urls() {
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::UnsupportedScheme {
                        slug: service.slug.clone(),
                        url: url.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn service(&self, slug: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.slug == slug)
    }

    pub fn is_trigger(&self, slug: &str) -> bool {
        self.triggers.contains(slug)
    }

    /// Trigger slugs which don't name any service of the catalog. These are
    /// tolerated, but can never fire.
    pub fn unknown_triggers(&self) -> Vec<&str> {
        self.triggers
            .iter()
            .filter(|slug| self.service(slug).is_none())
            .map(String::as_str)
            .collect()
    }
}
