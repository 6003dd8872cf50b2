//! Repository traits describing persistence adapters.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{
    entities::{AuditLogRecord, ContactMessageRecord, PostRecord},
    locale::Locale,
    posts::StaticPost,
    types::PostStatus,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Failures while reading static posts from disk.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid front matter in `{path}`: {message}")]
    FrontMatter { path: PathBuf, message: String },
    #[error("invalid static post slug `{slug}`")]
    InvalidSlug { slug: String },
}

#[derive(Debug, Clone, Default)]
pub struct AdminPostFilter {
    pub status: Option<PostStatus>,
    pub locale: Option<Locale>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostStatusCounts {
    pub total: u64,
    pub draft: u64,
    pub published: u64,
    pub scheduled: u64,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub translation_group_id: Uuid,
    pub locale: Locale,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub cover_image: Option<String>,
    pub status: PostStatus,
    pub scheduled_at: Option<OffsetDateTime>,
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
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
pub struct UpdatePostStatusParams {
    pub id: Uuid,
    pub status: PostStatus,
    pub scheduled_at: Option<OffsetDateTime>,
    pub published_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts visible to readers at `now`, optionally restricted to one locale.
    async fn list_visible(
        &self,
        locale: Option<Locale>,
        now: OffsetDateTime,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_visible(
        &self,
        locale: Locale,
        slug: &str,
        now: OffsetDateTime,
    ) -> Result<Option<PostRecord>, RepoError>;

    async fn list_translations(&self, group_id: Uuid) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    /// Lookup regardless of status.
    async fn find_by_slug(&self, locale: Locale, slug: &str)
    -> Result<Option<PostRecord>, RepoError>;

    async fn list_admin(&self, filter: &AdminPostFilter) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_by_status(&self) -> Result<PostStatusCounts, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post_status(
        &self,
        params: UpdatePostStatusParams,
    ) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    /// Flip scheduled posts whose time has come to `published`.
    async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<PostRecord>, RepoError>;
}

#[async_trait]
pub trait ContactRepo: Send + Sync {
    async fn append_message(&self, record: ContactMessageRecord) -> Result<(), RepoError>;

    async fn mark_delivered(&self, id: Uuid) -> Result<(), RepoError>;

    async fn list_recent(&self, limit: u32) -> Result<Vec<ContactMessageRecord>, RepoError>;
}

#[async_trait]
pub trait AuditRepo: Send + Sync {
    async fn append_log(&self, record: AuditLogRecord) -> Result<(), RepoError>;

    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditLogRecord>, RepoError>;
}

/// Read access to Markdown/MDX posts kept alongside the site.
#[async_trait]
pub trait StaticPostSource: Send + Sync {
    async fn list(&self) -> Result<Vec<StaticPost>, ContentError>;

    /// Look up a post by file stem. Returns `Ok(None)` when no file exists.
    async fn find(&self, slug: &str) -> Result<Option<StaticPost>, ContentError>;
}
