use askama::Template;

use super::{AdminLayout, format_timestamp};
use crate::application::admin::DashboardSnapshot;
use crate::domain::entities::AuditLogRecord;

use super::messages::AdminMessageRowView;

#[derive(Clone)]
pub struct AdminMetricView {
    pub label: &'static str,
    pub value: u64,
    pub href: String,
}

#[derive(Clone)]
pub struct AdminAuditRowView {
    pub when: String,
    pub actor: String,
    pub action: String,
    pub target: String,
}

impl From<&AuditLogRecord> for AdminAuditRowView {
    fn from(record: &AuditLogRecord) -> Self {
        let target = match record.entity_id.as_deref() {
            Some(id) => format!("{} {id}", record.entity_type),
            None => record.entity_type.clone(),
        };
        Self {
            when: format_timestamp(record.created_at),
            actor: record.actor.clone(),
            action: record.action.clone(),
            target,
        }
    }
}

#[derive(Clone)]
pub struct AdminDashboardView {
    pub metrics: Vec<AdminMetricView>,
    pub messages: Vec<AdminMessageRowView>,
    pub audit: Vec<AdminAuditRowView>,
}

impl From<&DashboardSnapshot> for AdminDashboardView {
    fn from(snapshot: &DashboardSnapshot) -> Self {
        let counts = &snapshot.counts;
        Self {
            metrics: vec![
                AdminMetricView {
                    label: "All posts",
                    value: counts.total,
                    href: "/posts".to_string(),
                },
                AdminMetricView {
                    label: "Published",
                    value: counts.published,
                    href: "/posts?status=published".to_string(),
                },
                AdminMetricView {
                    label: "Scheduled",
                    value: counts.scheduled,
                    href: "/posts?status=scheduled".to_string(),
                },
                AdminMetricView {
                    label: "Drafts",
                    value: counts.draft,
                    href: "/posts?status=draft".to_string(),
                },
            ],
            messages: snapshot
                .recent_messages
                .iter()
                .map(AdminMessageRowView::from)
                .collect(),
            audit: snapshot
                .recent_audit
                .iter()
                .map(AdminAuditRowView::from)
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub view: AdminLayout<AdminDashboardView>,
}
