//! Postgres-backed repository implementations.

mod audit;
mod contact;
mod posts;
mod util;

pub use util::map_sqlx_error;

use std::{sync::Arc, time::Duration};

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::RepoError;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reader-visible posts at bind position `now`: published with a past
/// publication time, or scheduled with a past schedule the scheduler has not
/// picked up yet.
const VISIBLE_PREDICATE_PREFIX: &str = " AND ((p.status = 'published'::post_status \
    AND p.published_at IS NOT NULL AND p.published_at <= ";
const VISIBLE_PREDICATE_MIDDLE: &str = ") OR (p.status = 'scheduled'::post_status \
    AND p.scheduled_at IS NOT NULL AND p.scheduled_at <= ";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn push_visible_predicate<'q>(
        qb: &mut QueryBuilder<'q, Postgres>,
        now: time::OffsetDateTime,
    ) {
        qb.push(VISIBLE_PREDICATE_PREFIX);
        qb.push_bind(now);
        qb.push(VISIBLE_PREDICATE_MIDDLE);
        qb.push_bind(now);
        qb.push("))");
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}
