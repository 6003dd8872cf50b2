use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{ContactRepo, RepoError},
    domain::{entities::ContactMessageRecord, locale::Locale},
};

use super::{PostgresRepositories, map_sqlx_error};

const MAX_LIST_LIMIT: u32 = 200;

#[derive(sqlx::FromRow)]
struct ContactMessageRow {
    id: Uuid,
    name: String,
    email: String,
    company: Option<String>,
    message: String,
    locale: String,
    client_ip: Option<String>,
    delivered: bool,
    created_at: OffsetDateTime,
}

impl From<ContactMessageRow> for ContactMessageRecord {
    fn from(row: ContactMessageRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            company: row.company,
            message: row.message,
            // Messages outlive locale support changes; show them regardless.
            locale: Locale::parse(&row.locale).unwrap_or_default(),
            client_ip: row.client_ip,
            delivered: row.delivered,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ContactRepo for PostgresRepositories {
    async fn append_message(&self, record: ContactMessageRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO contact_messages
                (id, name, email, company, message, locale, client_ip, delivered, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.name)
        .bind(record.email)
        .bind(record.company)
        .bind(record.message)
        .bind(record.locale.code())
        .bind(record.client_ip)
        .bind(record.delivered)
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn mark_delivered(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("UPDATE contact_messages SET delivered = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<ContactMessageRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ContactMessageRow>(
            r#"
            SELECT id, name, email, company, message, locale, client_ip, delivered, created_at
            FROM contact_messages
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit.clamp(1, MAX_LIST_LIMIT)))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ContactMessageRecord::from).collect())
    }
}
