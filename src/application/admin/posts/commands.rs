use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CreatePostParams, UpdatePostParams, UpdatePostStatusParams};
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::domain::locale::Locale;
use crate::domain::slug::{
    SlugAsyncError, SlugError, generate_unique_slug_async, has_reserved_suffix, is_canonical,
};

use super::service::AdminPostService;
use super::types::{
    AdminPostError, CreatePostCommand, PostSummarySnapshot, UpdatePostContentCommand,
    UpdatePostStatusCommand, ensure_non_empty, normalize_status, normalize_tags, optional_text,
};

const SCHEDULER_ACTOR: &str = "scheduler";

impl AdminPostService {
    pub async fn create_post(
        &self,
        actor: &str,
        command: CreatePostCommand,
    ) -> Result<PostRecord, AdminPostError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.excerpt, "excerpt")?;
        ensure_non_empty(&command.body_markdown, "body_markdown")?;

        let translation_group_id = self
            .translation_group_for(command.translation_of, command.locale)
            .await?;

        let slug = match optional_text(command.slug) {
            Some(slug) => {
                self.ensure_slug_available(&slug, command.locale, None)
                    .await?;
                slug
            }
            None => self.derive_unique_slug(&command.title, command.locale).await?,
        };

        let timestamps =
            normalize_status(command.status, command.scheduled_at, command.published_at)?;

        let params = CreatePostParams {
            translation_group_id,
            locale: command.locale,
            slug,
            title: command.title.trim().to_string(),
            excerpt: command.excerpt.trim().to_string(),
            body_markdown: command.body_markdown,
            tags: normalize_tags(&command.tags),
            author: optional_text(command.author),
            cover_image: optional_text(command.cover_image),
            status: command.status,
            scheduled_at: timestamps.scheduled_at,
            published_at: timestamps.published_at,
        };

        let post = self.writer.create_post(params).await?;
        self.record_post_audit(actor, "post.create", &post).await?;

        Ok(post)
    }

    pub async fn update_post(
        &self,
        actor: &str,
        command: UpdatePostContentCommand,
    ) -> Result<PostRecord, AdminPostError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.excerpt, "excerpt")?;
        ensure_non_empty(&command.body_markdown, "body_markdown")?;

        let existing = self
            .reader
            .find_by_id(command.id)
            .await?
            .ok_or(AdminPostError::NotFound)?;

        let slug = command.slug.trim().to_string();
        if slug != existing.slug {
            self.ensure_slug_available(&slug, existing.locale, Some(existing.id))
                .await?;
        }

        let params = UpdatePostParams {
            id: command.id,
            slug,
            title: command.title.trim().to_string(),
            excerpt: command.excerpt.trim().to_string(),
            body_markdown: command.body_markdown,
            tags: normalize_tags(&command.tags),
            author: optional_text(command.author),
            cover_image: optional_text(command.cover_image),
        };

        let post = self.writer.update_post(params).await?;
        self.record_post_audit(actor, "post.update", &post).await?;

        Ok(post)
    }

    pub async fn update_status(
        &self,
        actor: &str,
        command: UpdatePostStatusCommand,
    ) -> Result<PostRecord, AdminPostError> {
        let normalized =
            normalize_status(command.status, command.scheduled_at, command.published_at)?;

        let params = UpdatePostStatusParams {
            id: command.id,
            status: command.status,
            scheduled_at: normalized.scheduled_at,
            published_at: normalized.published_at,
        };

        let post = self.writer.update_post_status(params).await?;
        self.record_post_audit(actor, "post.status", &post).await?;
        Ok(post)
    }

    pub async fn delete_post(&self, actor: &str, id: Uuid) -> Result<(), AdminPostError> {
        let existing = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(AdminPostError::NotFound)?;

        self.writer.delete_post(id).await?;
        self.record_post_audit(actor, "post.delete", &existing)
            .await?;

        Ok(())
    }

    /// Promote scheduled posts whose time has passed. Returns the promoted posts.
    pub async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<PostRecord>, AdminPostError> {
        let published = self.writer.publish_due(now).await?;

        for post in &published {
            self.record_post_audit(SCHEDULER_ACTOR, "post.publish_scheduled", post)
                .await?;
            info!(
                target = "meridian::scheduler",
                post_id = %post.id,
                locale = %post.locale,
                slug = %post.slug,
                "Published scheduled post"
            );
        }

        Ok(published)
    }

    async fn translation_group_for(
        &self,
        translation_of: Option<Uuid>,
        locale: Locale,
    ) -> Result<Uuid, AdminPostError> {
        let Some(source_id) = translation_of else {
            return Ok(Uuid::new_v4());
        };

        let source = self
            .reader
            .find_by_id(source_id)
            .await?
            .ok_or(AdminPostError::NotFound)?;

        let members = self
            .reader
            .list_translations(source.translation_group_id)
            .await?;
        if members.iter().any(|member| member.locale == locale) {
            return Err(AdminPostError::TranslationExists(locale));
        }

        Ok(source.translation_group_id)
    }

    async fn ensure_slug_available(
        &self,
        slug: &str,
        locale: Locale,
        current: Option<Uuid>,
    ) -> Result<(), AdminPostError> {
        if !is_canonical(slug) {
            return Err(AdminPostError::ConstraintViolation("slug"));
        }
        if has_reserved_suffix(slug) {
            return Err(DomainError::ReservedSlugSuffix {
                slug: slug.to_string(),
            }
            .into());
        }

        match self.reader.find_by_slug(locale, slug).await? {
            Some(other) if Some(other.id) != current => Err(AdminPostError::SlugTaken {
                slug: slug.to_string(),
                locale,
            }),
            _ => Ok(()),
        }
    }

    async fn derive_unique_slug(
        &self,
        title: &str,
        locale: Locale,
    ) -> Result<String, AdminPostError> {
        let reader = self.reader.clone();
        match generate_unique_slug_async(title, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_by_slug(locale, &candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await
        {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(err)) => match err {
                SlugError::EmptyInput | SlugError::Unrepresentable { .. } => {
                    Err(AdminPostError::ConstraintViolation("title"))
                }
                SlugError::Exhausted { .. } => Err(AdminPostError::ConstraintViolation("slug")),
            },
            Err(SlugAsyncError::Predicate(err)) => Err(AdminPostError::Repo(err)),
        }
    }

    async fn record_post_audit(
        &self,
        actor: &str,
        action: &str,
        post: &PostRecord,
    ) -> Result<(), AdminPostError> {
        let snapshot = PostSummarySnapshot {
            locale: post.locale,
            slug: post.slug.as_str(),
            title: post.title.as_str(),
            status: post.status,
        };
        self.audit
            .record(
                actor,
                action,
                "post",
                Some(&post.id.to_string()),
                Some(&snapshot),
            )
            .await?;
        Ok(())
    }
}
