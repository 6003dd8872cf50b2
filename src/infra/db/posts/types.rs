use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::entities::PostRecord;
use crate::domain::locale::Locale;
use crate::domain::types::PostStatus;

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) translation_group_id: Uuid,
    pub(crate) locale: String,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) excerpt: String,
    pub(crate) body_markdown: String,
    pub(crate) tags: Vec<String>,
    pub(crate) author: Option<String>,
    pub(crate) cover_image: Option<String>,
    pub(crate) status: PostStatus,
    pub(crate) scheduled_at: Option<OffsetDateTime>,
    pub(crate) published_at: Option<OffsetDateTime>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl TryFrom<PostRow> for PostRecord {
    type Error = RepoError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let locale = Locale::parse(&row.locale).ok_or_else(|| RepoError::Integrity {
            message: format!("post {} has unsupported locale `{}`", row.id, row.locale),
        })?;

        Ok(Self {
            id: row.id,
            translation_group_id: row.translation_group_id,
            locale,
            slug: row.slug,
            title: row.title,
            excerpt: row.excerpt,
            body_markdown: row.body_markdown,
            tags: row.tags,
            author: row.author,
            cover_image: row.cover_image,
            status: row.status,
            scheduled_at: row.scheduled_at,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn into_records(rows: Vec<PostRow>) -> Result<Vec<PostRecord>, RepoError> {
    rows.into_iter().map(PostRecord::try_from).collect()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn row(locale: &str) -> PostRow {
        PostRow {
            id: Uuid::nil(),
            translation_group_id: Uuid::nil(),
            locale: locale.to_string(),
            slug: "launch".to_string(),
            title: "Launch".to_string(),
            excerpt: String::new(),
            body_markdown: String::new(),
            tags: vec!["news".to_string()],
            author: None,
            cover_image: None,
            status: PostStatus::Published,
            scheduled_at: None,
            published_at: Some(datetime!(2024-01-01 0:00 UTC)),
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    #[test]
    fn row_locale_is_parsed() {
        let record = PostRecord::try_from(row("ja")).expect("record");
        assert_eq!(record.locale, Locale::Ja);
    }

    #[test]
    fn unknown_locale_is_an_integrity_error() {
        let err = PostRecord::try_from(row("fr")).expect_err("unsupported");
        assert!(matches!(err, RepoError::Integrity { .. }));
    }
}
