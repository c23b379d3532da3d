use anyhow::Context;
use status_models::{CanonicalStatus, StatusRecord};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error")]
    Sqlx(#[from] sqlx::Error),
    #[error("failed to encode incident details")]
    Encode(#[from] serde_json::Error),
}

/// Store persists the status record of each service across runs.
pub trait Store: Send + Sync {
    /// Load the persisted status of every service, keyed by slug.
    fn load_statuses(
        &self,
    ) -> impl std::future::Future<Output = Result<BTreeMap<String, CanonicalStatus>, StoreError>>
           + Send
           + '_;

    /// Insert or overwrite the record of `record.slug`.
    fn upsert<'s>(
        &'s self,
        record: &'s StatusRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send + 's;
}

const CREATE_TABLE: &str = r#"
create table if not exists service_status (
    service_slug text primary key,
    status text not null,
    last_incident timestamptz,
    last_incident_details jsonb,
    updated_at timestamptz not null
)
"#;

/// Store of status records in the `service_status` table of a Postgres database.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &url::Url) -> anyhow::Result<Self> {
        let pg_options = database_url
            .as_str()
            .parse::<sqlx::postgres::PgConnectOptions>()
            .context("parsing database URL")?
            .application_name("status-agent")
            .ssl_mode(sqlx::postgres::PgSslMode::Prefer);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(pg_options)
            .await
            .context("connecting to database")?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .context("creating service_status table")?;

        Ok(Self::new(pool))
    }
}

impl Store for PgStore {
    async fn load_statuses(&self) -> Result<BTreeMap<String, CanonicalStatus>, StoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("select service_slug, status from service_status")
                .fetch_all(&self.pool)
                .await?;

        let mut statuses = BTreeMap::new();
        for (slug, status) in rows {
            match CanonicalStatus::from_str(&status) {
                Some(status) => {
                    statuses.insert(slug, status);
                }
                None => {
                    tracing::warn!(%slug, %status, "ignoring stored status which isn't recognized");
                }
            }
        }
        Ok(statuses)
    }

    async fn upsert<'s>(&'s self, record: &'s StatusRecord) -> Result<(), StoreError> {
        let details = record
            .last_incident_details
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            insert into service_status (
                service_slug,
                status,
                last_incident,
                last_incident_details,
                updated_at
            ) values ($1, $2, $3, $4, $5)
            on conflict (service_slug) do update set
                status = excluded.status,
                last_incident = excluded.last_incident,
                last_incident_details = excluded.last_incident_details,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.slug)
        .bind(record.status.name())
        .bind(record.last_incident_timestamp)
        .bind(details)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Store which holds records in memory, for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: tokio::sync::Mutex<BTreeMap<String, StatusRecord>>,
}

impl MemoryStore {
    pub fn with_records(records: impl IntoIterator<Item = StatusRecord>) -> Self {
        Self {
            records: tokio::sync::Mutex::new(
                records
                    .into_iter()
                    .map(|record| (record.slug.clone(), record))
                    .collect(),
            ),
        }
    }

    pub async fn records(&self) -> BTreeMap<String, StatusRecord> {
        self.records.lock().await.clone()
    }
}

impl Store for MemoryStore {
    async fn load_statuses(&self) -> Result<BTreeMap<String, CanonicalStatus>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .map(|(slug, record)| (slug.clone(), record.status))
            .collect())
    }

    async fn upsert<'s>(&'s self, record: &'s StatusRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .await
            .insert(record.slug.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};
    use status_models::Observation;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let store = MemoryStore::with_records([StatusRecord::new(
            "github",
            Observation::bare(CanonicalStatus::Operational),
            at,
        )]);

        store
            .upsert(&StatusRecord::new(
                "github",
                Observation::bare(CanonicalStatus::Incident),
                at,
            ))
            .await
            .unwrap();
        store
            .upsert(&StatusRecord::new("slack", Observation::unknown(), at))
            .await
            .unwrap();

        insta::assert_debug_snapshot!(store.load_statuses().await.unwrap(), @r###"
        {
            "github": Incident,
            "slack": Unknown,
        }
        "###);
    }
}
