use crate::store::Store;
use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use status_alerts::{Decider, Notifier};
use status_models::{
    CanonicalStatus, Config, Observation, ServiceDescriptor, StatusChangeEvent, StatusRecord,
};
use status_sources::Fetcher;

/// Phases of a polling run, in the order they're entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LoadingPriorState,
    Fetching,
    Diffing,
    Deciding,
    Persisting,
    Done,
}

/// Summary of a completed run, reported as its outcome.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub success: bool,
    pub total_services: usize,
    pub successful_services: usize,
    pub failed_services: usize,
    /// Percentage of services which were both fetched and persisted, rounded.
    pub success_rate: u32,
    pub total_changes: usize,
    pub priority_changes: usize,
    pub changes: Vec<StatusChangeEvent>,
}

struct Tracker(Phase);

impl Tracker {
    fn enter(&mut self, next: Phase) {
        tracing::info!(from = ?self.0, to = ?next, "entering run phase");
        self.0 = next;
    }
}

/// Outcome of fetching one service.
struct Fetched<'c> {
    service: &'c ServiceDescriptor,
    observation: Observation,
    ok: bool,
}

/// Perform a single polling run of every service in `config`.
///
/// Only a failure to load prior statuses fails the run. Services which can't
/// be fetched are observed as unknown, and failures to notify or to persist
/// are logged and reflected in the summary.
#[tracing::instrument(skip_all, fields(services = config.services.len(), %now))]
pub async fn run<S: Store, N: Notifier>(
    config: &Config,
    fetcher: &Fetcher,
    store: &S,
    notifier: &N,
    now: DateTime<Utc>,
) -> anyhow::Result<RunSummary> {
    let mut phase = Tracker(Phase::Idle);
    let decider = Decider::new(config.triggers.clone())?;

    for slug in config.unknown_triggers() {
        tracing::warn!(%slug, "trigger doesn't name a configured service and will never fire");
    }

    phase.enter(Phase::LoadingPriorState);
    let prior = store
        .load_statuses()
        .await
        .context("loading prior service statuses")?;

    phase.enter(Phase::Fetching);
    // Collected up-front: streaming through a closure over borrowed services
    // leaves the run future not Send.
    let pending: Vec<_> = config
        .services
        .iter()
        .map(|service| fetch_one(fetcher, service, now))
        .collect();
    let fetched: Vec<Fetched> = futures::stream::iter(pending)
        .buffered(config.run.concurrency)
        .collect()
        .await;

    let mut tally: Vec<(CanonicalStatus, usize)> = CanonicalStatus::all()
        .iter()
        .map(|status| {
            let count = fetched
                .iter()
                .filter(|f| f.observation.status == *status)
                .count();
            (*status, count)
        })
        .filter(|(_, count)| *count != 0)
        .collect();
    tally.sort_by_key(|(status, _)| status.severity());
    tracing::info!(?tally, "fetched all services");

    phase.enter(Phase::Diffing);
    let changes = status_alerts::diff(
        &prior,
        fetched.iter().map(|f| (f.service, f.observation.status)),
    );
    for change in &changes {
        tracing::info!(
            slug = %change.slug,
            old = %change.old_status,
            new = %change.new_status,
            "service status changed"
        );
    }

    phase.enter(Phase::Deciding);
    let incidents: Vec<String> = fetched
        .iter()
        .filter(|f| f.observation.status == CanonicalStatus::Incident)
        .map(|f| f.service.display_name.clone())
        .collect();
    let priority_changes = decider.priority_changes(&changes).len();

    if let Err(error) = decider.notify(notifier, &changes, &incidents).await {
        tracing::error!(?error, priority_changes, "failed to send notification (continuing)");
    }

    phase.enter(Phase::Persisting);
    let (mut successful, mut failed) = (0, 0);

    for Fetched {
        service,
        observation,
        ok,
    } in fetched
    {
        let record = StatusRecord::new(&service.slug, observation, now);

        match store.upsert(&record).await {
            Ok(()) if ok => successful += 1,
            Ok(()) => failed += 1,
            Err(error) => {
                tracing::error!(slug = %service.slug, ?error, "failed to persist service status");
                failed += 1;
            }
        }
    }

    phase.enter(Phase::Done);
    let total = successful + failed;
    let summary = RunSummary {
        success: true,
        total_services: total,
        successful_services: successful,
        failed_services: failed,
        success_rate: success_rate(successful, total),
        total_changes: changes.len(),
        priority_changes,
        changes,
    };
    tracing::info!(
        total = summary.total_services,
        successful = summary.successful_services,
        failed = summary.failed_services,
        changes = summary.total_changes,
        priority_changes = summary.priority_changes,
        "run completed"
    );

    Ok(summary)
}

async fn fetch_one<'c>(
    fetcher: &Fetcher,
    service: &'c ServiceDescriptor,
    now: DateTime<Utc>,
) -> Fetched<'c> {
    match fetcher.fetch(&service.source, now).await {
        Ok(observation) => {
            tracing::debug!(slug = %service.slug, status = %observation.status, "fetched service");
            Fetched {
                service,
                observation,
                ok: true,
            }
        }
        Err(error) => {
            tracing::warn!(
                slug = %service.slug,
                kind = %service.source.kind(),
                ?error,
                "failed to fetch service"
            );
            Fetched {
                service,
                observation: Observation::unknown(),
                ok: false,
            }
        }
    }
}

fn success_rate(successful: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (successful as f64 / total as f64 * 100.0).round() as u32
}
