use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams, UpdatePostStatusParams,
};
use crate::domain::entities::PostRecord;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::RETURNING_COLUMNS;
use super::types::{PostRow, into_records};

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "INSERT INTO posts (id, translation_group_id, locale, slug, title, excerpt, \
             body_markdown, tags, author, cover_image, status, scheduled_at, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {RETURNING_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.translation_group_id)
            .bind(params.locale.code())
            .bind(params.slug)
            .bind(params.title)
            .bind(params.excerpt)
            .bind(params.body_markdown)
            .bind(params.tags)
            .bind(params.author)
            .bind(params.cover_image)
            .bind(params.status)
            .bind(params.scheduled_at)
            .bind(params.published_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        PostRecord::try_from(row)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "UPDATE posts SET slug = $2, title = $3, excerpt = $4, body_markdown = $5, \
             tags = $6, author = $7, cover_image = $8, updated_at = now() \
             WHERE id = $1 RETURNING {RETURNING_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(params.id)
            .bind(params.slug)
            .bind(params.title)
            .bind(params.excerpt)
            .bind(params.body_markdown)
            .bind(params.tags)
            .bind(params.author)
            .bind(params.cover_image)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        PostRecord::try_from(row)
    }

    async fn update_post_status(
        &self,
        params: UpdatePostStatusParams,
    ) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "UPDATE posts SET status = $2, scheduled_at = $3, published_at = $4, \
             updated_at = now() WHERE id = $1 RETURNING {RETURNING_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(params.id)
            .bind(params.status)
            .bind(params.scheduled_at)
            .bind(params.published_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        PostRecord::try_from(row)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "UPDATE posts SET status = 'published'::post_status, \
             published_at = scheduled_at, scheduled_at = NULL, updated_at = now() \
             WHERE status = 'scheduled'::post_status AND scheduled_at IS NOT NULL \
             AND scheduled_at <= $1 RETURNING {RETURNING_COLUMNS}"
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(now)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_records(rows)
    }
}
