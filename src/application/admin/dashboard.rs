use std::sync::Arc;

use crate::application::admin::{audit::AdminAuditService, posts::AdminPostService};
use crate::application::repos::{ContactRepo, PostStatusCounts, RepoError};
use crate::domain::entities::{AuditLogRecord, ContactMessageRecord};

use super::posts::AdminPostError;

const DASHBOARD_MESSAGES: u32 = 5;
const DASHBOARD_AUDIT_ENTRIES: u32 = 10;

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub counts: PostStatusCounts,
    pub recent_messages: Vec<ContactMessageRecord>,
    pub recent_audit: Vec<AuditLogRecord>,
}

#[derive(Clone)]
pub struct AdminDashboardService {
    posts: AdminPostService,
    contact: Arc<dyn ContactRepo>,
    audit: AdminAuditService,
}

impl AdminDashboardService {
    pub fn new(
        posts: AdminPostService,
        contact: Arc<dyn ContactRepo>,
        audit: AdminAuditService,
    ) -> Self {
        Self {
            posts,
            contact,
            audit,
        }
    }

    pub async fn overview(&self) -> Result<DashboardSnapshot, AdminPostError> {
        let (counts, recent_messages, recent_audit) = tokio::try_join!(
            self.posts.status_counts(),
            async {
                self.contact
                    .list_recent(DASHBOARD_MESSAGES)
                    .await
                    .map_err(AdminPostError::from)
            },
            async {
                self.audit
                    .list_recent(DASHBOARD_AUDIT_ENTRIES)
                    .await
                    .map_err(AdminPostError::from)
            },
        )?;

        Ok(DashboardSnapshot {
            counts,
            recent_messages,
            recent_audit,
        })
    }

    pub async fn messages(&self, limit: u32) -> Result<Vec<ContactMessageRecord>, RepoError> {
        self.contact.list_recent(limit).await
    }
}
