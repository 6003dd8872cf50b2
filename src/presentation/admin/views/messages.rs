use askama::Template;

use super::{AdminLayout, format_timestamp};
use crate::domain::entities::ContactMessageRecord;

#[derive(Clone)]
pub struct AdminMessageRowView {
    pub received: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub locale: &'static str,
    pub message: String,
    pub delivered: bool,
}

impl From<&ContactMessageRecord> for AdminMessageRowView {
    fn from(record: &ContactMessageRecord) -> Self {
        Self {
            received: format_timestamp(record.created_at),
            name: record.name.clone(),
            email: record.email.clone(),
            company: record.company.clone(),
            locale: record.locale.code(),
            message: record.message.clone(),
            delivered: record.delivered,
        }
    }
}

#[derive(Clone)]
pub struct AdminMessagesView {
    pub messages: Vec<AdminMessageRowView>,
}

#[derive(Template)]
#[template(path = "admin/messages.html")]
pub struct AdminMessagesTemplate {
    pub view: AdminLayout<AdminMessagesView>,
}
