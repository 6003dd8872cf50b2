//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{locale::Locale, types::PostStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
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
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PostRecord {
    /// Whether readers may see the post at `now`.
    pub fn is_visible_at(&self, now: OffsetDateTime) -> bool {
        match self.status {
            PostStatus::Published => self.published_at.is_some_and(|at| at <= now),
            PostStatus::Scheduled => self.scheduled_at.is_some_and(|at| at <= now),
            PostStatus::Draft => false,
        }
    }

    pub fn effective_published_at(&self) -> OffsetDateTime {
        self.published_at
            .or(self.scheduled_at)
            .unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessageRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
    pub locale: Locale,
    pub client_ip: Option<String>,
    pub delivered: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogRecord {
    pub id: Uuid,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub payload_text: Option<String>,
    pub created_at: OffsetDateTime,
}
