use crate::{MemoryStore, PgStore};
use anyhow::Context;
use status_alerts::Sender;
use status_models::Config;
use status_sources::Fetcher;
use std::path::{Path, PathBuf};

#[derive(clap::Args, Debug)]
pub struct CatalogArgs {
    /// Path to the YAML catalog of monitored services.
    #[clap(
        long = "config",
        env = "STATUS_CONFIG",
        default_value = "config/services.yaml",
        global = true
    )]
    pub config: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// URL of the postgres database holding service statuses.
    /// If not set, statuses are held in memory and every service is
    /// observed for the first time.
    #[clap(long = "database", env = "DATABASE_URL")]
    database_url: Option<url::Url>,
    /// Webhook to which priority notifications are posted.
    /// If not set, notifications are logged and skipped.
    #[clap(long = "notify-url", env = "NOTIFY_URL")]
    notify_url: Option<url::Url>,
    /// Maximum number of services fetched concurrently.
    /// Overrides the catalog's `run.concurrency`.
    #[clap(long = "concurrency", env = "FETCH_CONCURRENCY")]
    concurrency: Option<usize>,
    /// Deadline for fetching a single service.
    /// Overrides the catalog's `run.fetch_timeout`.
    #[clap(long = "fetch-timeout", env = "FETCH_TIMEOUT")]
    #[arg(value_parser = humantime::parse_duration)]
    fetch_timeout: Option<std::time::Duration>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Slug of the service to check.
    #[clap(long)]
    slug: String,
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).with_context(|| format!("loading service catalog {}", path.display()))
}

/// Perform one polling run, and print its summary as JSON.
pub async fn run_job(catalog: CatalogArgs, args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(&catalog.config)?;

    if let Some(concurrency) = args.concurrency {
        config.run.concurrency = concurrency;
    }
    if let Some(fetch_timeout) = args.fetch_timeout {
        config.run.fetch_timeout = fetch_timeout;
    }
    config.validate().context("validating run options")?;

    tracing::info!(
        services = config.services.len(),
        triggers = config.triggers.len(),
        concurrency = config.run.concurrency,
        fetch_timeout = ?config.run.fetch_timeout,
        "starting run"
    );

    let fetcher = Fetcher::new(config.run.fetch_timeout).context("building HTTP client")?;
    let notifier = match args.notify_url {
        Some(url) => Sender::webhook(
            url,
            status_sources::new_http_client(status_sources::USER_AGENT, config.run.fetch_timeout)?,
        ),
        None => Sender::Disabled,
    };
    let now = chrono::Utc::now();

    let summary = match &args.database_url {
        Some(database_url) => {
            let store = PgStore::connect(database_url).await?;
            crate::run(&config, &fetcher, &store, &notifier, now).await?
        }
        None => {
            tracing::warn!("no database configured; statuses will not be persisted");
            let store = MemoryStore::default();
            crate::run(&config, &fetcher, &store, &notifier, now).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Fetch a single service and print its observation as JSON.
pub async fn check_service(catalog: CatalogArgs, args: CheckArgs) -> anyhow::Result<()> {
    let config = load_config(&catalog.config)?;
    let service = config
        .service(&args.slug)
        .with_context(|| format!("service '{}' is not in the catalog", args.slug))?;

    let fetcher = Fetcher::new(config.run.fetch_timeout).context("building HTTP client")?;
    let observation = fetcher
        .fetch(&service.source, chrono::Utc::now())
        .await
        .with_context(|| format!("fetching service '{}'", service.slug))?;

    println!("{}", serde_json::to_string_pretty(&observation)?);
    Ok(())
}

/// List the services of the catalog.
pub fn list_services(catalog: CatalogArgs) -> anyhow::Result<()> {
    let config = load_config(&catalog.config)?;

    for service in &config.services {
        let trigger = if config.is_trigger(&service.slug) {
            "*"
        } else {
            ""
        };
        println!(
            "{}{trigger}\t{}\t{}",
            service.slug,
            service.source.kind(),
            service.display_name
        );
    }
    Ok(())
}
