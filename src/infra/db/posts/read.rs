use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AdminPostFilter, PostStatusCounts, PostsRepo, RepoError};
use crate::domain::entities::PostRecord;
use crate::domain::locale::Locale;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::POST_COLUMNS;
use super::types::{PostRow, into_records};

const ADMIN_LIST_LIMIT: i64 = 500;

#[derive(FromRow)]
struct StatusCountsRow {
    total: i64,
    draft: i64,
    published: i64,
    scheduled: i64,
}

impl PostgresRepositories {
    fn select_posts<'q>() -> QueryBuilder<'q, sqlx::Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(" FROM posts p WHERE 1=1 ");
        qb
    }

    async fn fetch_one_post(
        &self,
        mut qb: QueryBuilder<'_, sqlx::Postgres>,
    ) -> Result<Option<PostRecord>, RepoError> {
        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(PostRecord::try_from).transpose()
    }

    async fn fetch_posts(
        &self,
        mut qb: QueryBuilder<'_, sqlx::Postgres>,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        into_records(rows)
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_visible(
        &self,
        locale: Option<Locale>,
        now: OffsetDateTime,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        if let Some(locale) = locale {
            qb.push(" AND p.locale = ");
            qb.push_bind(locale.code());
        }
        Self::push_visible_predicate(&mut qb, now);
        qb.push(" ORDER BY COALESCE(p.published_at, p.scheduled_at) DESC, p.slug ASC");

        self.fetch_posts(qb).await
    }

    async fn find_visible(
        &self,
        locale: Locale,
        slug: &str,
        now: OffsetDateTime,
    ) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.locale = ");
        qb.push_bind(locale.code());
        qb.push(" AND p.slug = ");
        qb.push_bind(slug);
        Self::push_visible_predicate(&mut qb, now);

        self.fetch_one_post(qb).await
    }

    async fn list_translations(&self, group_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.translation_group_id = ");
        qb.push_bind(group_id);
        qb.push(" ORDER BY p.locale");

        self.fetch_posts(qb).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        self.fetch_one_post(qb).await
    }

    async fn find_by_slug(
        &self,
        locale: Locale,
        slug: &str,
    ) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.locale = ");
        qb.push_bind(locale.code());
        qb.push(" AND p.slug = ");
        qb.push_bind(slug);

        self.fetch_one_post(qb).await
    }

    async fn list_admin(&self, filter: &AdminPostFilter) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();

        if let Some(status) = filter.status {
            qb.push(" AND p.status = ");
            qb.push_bind(status);
        }

        if let Some(locale) = filter.locale {
            qb.push(" AND p.locale = ");
            qb.push_bind(locale.code());
        }

        if let Some(search) = filter.search.as_ref() {
            let pattern = format!("%{search}%");
            qb.push(" AND (p.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.slug ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY p.updated_at DESC, p.id DESC LIMIT ");
        qb.push_bind(ADMIN_LIST_LIMIT);

        self.fetch_posts(qb).await
    }

    async fn count_by_status(&self) -> Result<PostStatusCounts, RepoError> {
        let row = sqlx::query_as::<_, StatusCountsRow>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'draft'::post_status) AS draft,
                   COUNT(*) FILTER (WHERE status = 'published'::post_status) AS published,
                   COUNT(*) FILTER (WHERE status = 'scheduled'::post_status) AS scheduled
            FROM posts
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostStatusCounts {
            total: Self::convert_count(row.total)?,
            draft: Self::convert_count(row.draft)?,
            published: Self::convert_count(row.published)?,
            scheduled: Self::convert_count(row.scheduled)?,
        })
    }
}
