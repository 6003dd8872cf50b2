use serde::Deserialize;
use time::{OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::application::{
    admin::posts::{AdminPostError, CreatePostCommand, UpdatePostContentCommand},
    repos::AdminPostFilter,
};
use crate::domain::{locale::Locale, types::PostStatus};
use crate::presentation::admin::views::{AdminPostFormValues, DATETIME_LOCAL_FORMAT};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AdminPostListQuery {
    pub(super) status: Option<String>,
    pub(super) locale: Option<String>,
    pub(super) q: Option<String>,
}

impl AdminPostListQuery {
    pub(super) fn filter(&self) -> AdminPostFilter {
        AdminPostFilter {
            status: blank_to_none(self.status.as_deref()).and_then(PostStatus::parse),
            locale: blank_to_none(self.locale.as_deref()).and_then(Locale::parse),
            search: blank_to_none(self.q.as_deref()).map(str::to_string),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AdminNewPostQuery {
    pub(super) translation_of: Option<Uuid>,
    pub(super) locale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AdminPostForm {
    pub(super) title: String,
    pub(super) slug: String,
    pub(super) excerpt: String,
    pub(super) body_markdown: String,
    pub(super) tags: String,
    pub(super) author: String,
    pub(super) cover_image: String,
    pub(super) locale: String,
    pub(super) status: String,
    pub(super) scheduled_at: String,
    pub(super) translation_of: String,
}

impl AdminPostForm {
    pub(super) fn values(&self) -> AdminPostFormValues {
        AdminPostFormValues {
            title: self.title.clone(),
            slug: self.slug.clone(),
            excerpt: self.excerpt.clone(),
            body_markdown: self.body_markdown.clone(),
            tags: self.tags.clone(),
            author: self.author.clone(),
            cover_image: self.cover_image.clone(),
            locale: self.locale.clone(),
            status: self.status.clone(),
            scheduled_at: self.scheduled_at.clone(),
            translation_of: self.translation_of.clone(),
        }
    }

    pub(super) fn create_command(&self) -> Result<CreatePostCommand, AdminPostError> {
        let locale = Locale::parse(&self.locale)
            .ok_or(AdminPostError::ConstraintViolation("locale"))?;
        let status = PostStatus::parse(self.status.trim())
            .ok_or(AdminPostError::ConstraintViolation("status"))?;
        let translation_of = match blank_to_none(Some(&self.translation_of)) {
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| AdminPostError::ConstraintViolation("translation_of"))?,
            ),
            None => None,
        };

        Ok(CreatePostCommand {
            locale,
            slug: blank_to_none(Some(&self.slug)).map(str::to_string),
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            body_markdown: self.body_markdown.clone(),
            tags: split_tags(&self.tags),
            author: blank_to_none(Some(&self.author)).map(str::to_string),
            cover_image: blank_to_none(Some(&self.cover_image)).map(str::to_string),
            status,
            scheduled_at: parse_schedule(&self.scheduled_at)?,
            published_at: None,
            translation_of,
        })
    }

    pub(super) fn update_command(&self, id: Uuid) -> UpdatePostContentCommand {
        UpdatePostContentCommand {
            id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            body_markdown: self.body_markdown.clone(),
            tags: split_tags(&self.tags),
            author: blank_to_none(Some(&self.author)).map(str::to_string),
            cover_image: blank_to_none(Some(&self.cover_image)).map(str::to_string),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AdminScheduleForm {
    pub(super) scheduled_at: String,
}

/// `datetime-local` input (read as UTC) or a full RFC 3339 timestamp.
pub(super) fn parse_schedule(raw: &str) -> Result<Option<OffsetDateTime>, AdminPostError> {
    let Some(value) = blank_to_none(Some(raw)) else {
        return Ok(None);
    };
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(Some(parsed));
    }
    PrimitiveDateTime::parse(value, DATETIME_LOCAL_FORMAT)
        .map(|parsed| Some(parsed.assume_utc()))
        .map_err(|_| AdminPostError::ConstraintViolation("scheduled_at"))
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
