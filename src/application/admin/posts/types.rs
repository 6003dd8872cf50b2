use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::RepoError,
    domain::{error::DomainError, locale::Locale, types::PostStatus},
};

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("slug `{slug}` is already used by another {locale} post")]
    SlugTaken { slug: String, locale: Locale },
    #[error("translation group already has a {0} post")]
    TranslationExists(Locale),
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummarySnapshot<'a> {
    pub locale: Locale,
    pub slug: &'a str,
    pub title: &'a str,
    pub status: PostStatus,
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub locale: Locale,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub cover_image: Option<String>,
    pub status: PostStatus,
    pub scheduled_at: Option<OffsetDateTime>,
    pub published_at: Option<OffsetDateTime>,
    /// Existing post whose translation group the new post joins.
    pub translation_of: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostContentCommand {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostStatusCommand {
    pub id: Uuid,
    pub status: PostStatus,
    pub scheduled_at: Option<OffsetDateTime>,
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTimestamps {
    pub scheduled_at: Option<OffsetDateTime>,
    pub published_at: Option<OffsetDateTime>,
}

pub fn normalize_status(
    status: PostStatus,
    scheduled_at: Option<OffsetDateTime>,
    published_at: Option<OffsetDateTime>,
) -> Result<StatusTimestamps, AdminPostError> {
    match status {
        PostStatus::Published => Ok(StatusTimestamps {
            scheduled_at: None,
            published_at: Some(published_at.unwrap_or_else(OffsetDateTime::now_utc)),
        }),
        PostStatus::Scheduled => match scheduled_at {
            Some(at) => Ok(StatusTimestamps {
                scheduled_at: Some(at),
                published_at: None,
            }),
            None => Err(AdminPostError::ConstraintViolation("scheduled_at")),
        },
        PostStatus::Draft => Ok(StatusTimestamps {
            scheduled_at: None,
            published_at: None,
        }),
    }
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AdminPostError> {
    if value.trim().is_empty() {
        return Err(AdminPostError::ConstraintViolation(field));
    }
    Ok(())
}

/// Trimmed, lowercased, deduplicated tags in first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

pub(super) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
