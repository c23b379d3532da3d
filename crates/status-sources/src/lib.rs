use chrono::{DateTime, Utc};
use status_models::{Observation, ServiceSource};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub mod content;
pub mod feed;
pub mod hybrid;
pub mod json;
pub mod normalize;

pub use feed::{FeedError, FeedFlavor};
pub use normalize::normalize;

pub const USER_AGENT: &str = concat!("status-watch/", env!("CARGO_PKG_VERSION"));

/// Errors which fail the fetch of a service.
/// A service which can't be fetched is observed to have an unknown status.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP transport error")]
    Transport(#[from] reqwest::Error),
    #[error("{url} responded with status {status}")]
    Status {
        url: url::Url,
        status: reqwest::StatusCode,
    },
    #[error("failed to parse JSON response")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("fetch did not complete within {0:?}")]
    Timeout(Duration),
}

pub fn new_http_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, FetchError> {
    Ok(reqwest::ClientBuilder::new()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}

/// Fetcher turns the source of a service into its current Observation.
#[derive(Clone)]
pub struct Fetcher {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self::with_client(
            new_http_client(USER_AGENT, timeout)?,
            timeout,
        ))
    }

    pub fn with_client(http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    /// Fetch the current Observation of `source`, where `now` is the time
    /// against which the freshness of feed entries is evaluated.
    ///
    /// The fetcher's timeout is a deadline for the whole service. Exceeding it
    /// on the primary endpoint fails the fetch, while a secondary endpoint
    /// (incidents, or the feed of a hybrid) is cut off at the deadline and
    /// contributes nothing.
    pub async fn fetch(
        &self,
        source: &ServiceSource,
        now: DateTime<Utc>,
    ) -> Result<Observation, FetchError> {
        let deadline = Instant::now() + self.timeout;

        match source {
            ServiceSource::Json {
                status_url,
                incidents_url,
            } => {
                let summary: json::StatusDocument =
                    self.before(deadline, self.get_json(status_url)).await?;
                let status = summary.canonical_status();

                let latest = match incidents_url {
                    Some(url) => match self
                        .before(deadline, self.get_json::<json::IncidentsDocument>(url))
                        .await
                    {
                        Ok(doc) => doc.latest(),
                        Err(error) => {
                            tracing::warn!(%url, ?error, "failed to fetch incidents (ignoring)");
                            None
                        }
                    },
                    None => None,
                };

                Ok(match latest {
                    Some((at, details)) => Observation {
                        status,
                        last_incident: Some(at),
                        incident: Some(details),
                    },
                    None => Observation::bare(status),
                })
            }
            ServiceSource::Rss { feed_url } => {
                let entries = self
                    .before(deadline, self.get_entries(FeedFlavor::Rss, feed_url))
                    .await?;
                Ok(feed::evaluate_entries(&entries, now))
            }
            ServiceSource::Atom { feed_url } => {
                let entries = self
                    .before(deadline, self.get_entries(FeedFlavor::Atom, feed_url))
                    .await?;
                Ok(feed::evaluate_entries(&entries, now))
            }
            ServiceSource::Hybrid { json_url, feed_url } => {
                let summary: hybrid::HybridDocument =
                    self.before(deadline, self.get_json(json_url)).await?;
                let mut observation = Observation::bare(summary.canonical_status());

                // The feed only ever enriches the incident of the observation.
                if let Some(url) = feed_url {
                    match self
                        .before(deadline, self.get_entries(FeedFlavor::Rss, url))
                        .await
                    {
                        Ok(entries) => {
                            if let Some((at, details)) = feed::evaluate_first_entry(&entries, now) {
                                observation.last_incident = Some(at);
                                observation.incident = Some(details);
                            }
                        }
                        Err(error) => {
                            tracing::warn!(%url, ?error, "failed to fetch hybrid feed (ignoring)");
                        }
                    }
                }
                Ok(observation)
            }
        }
    }

    /// Await `fut`, failing with a timeout if it's still pending at `deadline`.
    async fn before<T>(
        &self,
        deadline: Instant,
        fut: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        tokio::time::timeout_at(deadline, fut)
            .await
            .unwrap_or(Err(FetchError::Timeout(self.timeout)))
    }

    async fn get_text(&self, url: &url::Url) -> Result<String, FetchError> {
        let response = self.http_client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }
        Ok(response.text().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &url::Url,
    ) -> Result<T, FetchError> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_entries(
        &self,
        flavor: FeedFlavor,
        url: &url::Url,
    ) -> Result<Vec<feed::FeedEntry>, FetchError> {
        let body = self.get_text(url).await?;
        Ok(feed::parse_entries(flavor, &body)?)
    }
}
