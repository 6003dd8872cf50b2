//! Admin console view models.

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::domain::types::PostStatus;

mod dashboard;
mod messages;
mod posts;

pub use dashboard::*;
pub use messages::*;
pub use posts::*;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute] UTC");

/// Value format of `<input type="datetime-local">`, read as UTC.
pub const DATETIME_LOCAL_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");

const NAVIGATION: [(&str, &str, &str); 4] = [
    ("dashboard", "Dashboard", "/"),
    ("posts", "Posts", "/posts"),
    ("new_post", "New post", "/posts/new"),
    ("messages", "Messages", "/messages"),
];

#[derive(Clone)]
pub struct AdminNavigationItemView {
    pub label: &'static str,
    pub href: &'static str,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct AdminChrome {
    pub brand: String,
    pub title: String,
    pub actor: String,
    pub navigation: Vec<AdminNavigationItemView>,
}

impl AdminChrome {
    pub fn new(brand: &str, title: impl Into<String>, active: &str, actor: &str) -> Self {
        Self {
            brand: brand.to_string(),
            title: title.into(),
            actor: actor.to_string(),
            navigation: NAVIGATION
                .iter()
                .map(|&(key, label, href)| AdminNavigationItemView {
                    label,
                    href,
                    is_active: key == active,
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct AdminLayout<T> {
    pub chrome: AdminChrome,
    pub asset_version: String,
    pub content: T,
}

impl<T> AdminLayout<T> {
    pub fn new(chrome: AdminChrome, content: T) -> Self {
        Self {
            chrome,
            asset_version: asset_version(),
            content,
        }
    }
}

fn asset_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[derive(Clone)]
pub struct AdminOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).unwrap_or_default()
}

pub fn format_optional(time: Option<OffsetDateTime>) -> String {
    time.map(format_timestamp).unwrap_or_else(|| "-".to_string())
}

pub fn format_datetime_local(time: Option<OffsetDateTime>) -> String {
    time.and_then(|value| value.format(DATETIME_LOCAL_FORMAT).ok())
        .unwrap_or_default()
}

pub fn status_label(status: PostStatus) -> &'static str {
    match status {
        PostStatus::Draft => "Draft",
        PostStatus::Published => "Published",
        PostStatus::Scheduled => "Scheduled",
    }
}
