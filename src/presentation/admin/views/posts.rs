use askama::Template;

use super::{AdminLayout, AdminOption, format_datetime_local, format_optional, status_label};
use crate::domain::{
    entities::PostRecord,
    locale::{Locale, with_lang},
    types::PostStatus,
};

#[derive(Clone)]
pub struct AdminPostRowView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub locale: &'static str,
    pub status_key: &'static str,
    pub status_label: &'static str,
    pub display_time: String,
    pub edit_href: String,
    pub public_href: String,
}

impl AdminPostRowView {
    pub fn from_record(record: &PostRecord, default_locale: Locale) -> Self {
        let display_time = match record.status {
            PostStatus::Scheduled => format_optional(record.scheduled_at),
            PostStatus::Published => format_optional(record.published_at),
            PostStatus::Draft => format_optional(Some(record.updated_at)),
        };
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            slug: record.slug.clone(),
            locale: record.locale.code(),
            status_key: record.status.as_str(),
            status_label: status_label(record.status),
            display_time,
            edit_href: format!("/posts/{}/edit", record.id),
            public_href: public_href(record, default_locale),
        }
    }
}

fn public_href(record: &PostRecord, default_locale: Locale) -> String {
    with_lang(&format!("/blog/{}", record.slug), record.locale, default_locale)
}

#[derive(Clone)]
pub struct AdminPostFilterView {
    pub search: String,
    pub statuses: Vec<AdminOption>,
    pub locales: Vec<AdminOption>,
}

impl AdminPostFilterView {
    pub fn new(status: Option<PostStatus>, locale: Option<Locale>, search: Option<&str>) -> Self {
        Self {
            search: search.unwrap_or_default().to_string(),
            statuses: status_options(status),
            locales: locale_options(locale),
        }
    }
}

#[derive(Clone)]
pub struct AdminPostListView {
    pub rows: Vec<AdminPostRowView>,
    pub filter: AdminPostFilterView,
}

#[derive(Template)]
#[template(path = "admin/posts.html")]
pub struct AdminPostsTemplate {
    pub view: AdminLayout<AdminPostListView>,
}

/// Raw field values shown in the post editor, echoed back on validation errors.
#[derive(Clone, Default)]
pub struct AdminPostFormValues {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub tags: String,
    pub author: String,
    pub cover_image: String,
    pub locale: String,
    pub status: String,
    pub scheduled_at: String,
    pub translation_of: String,
}

impl AdminPostFormValues {
    pub fn from_record(record: &PostRecord) -> Self {
        Self {
            title: record.title.clone(),
            slug: record.slug.clone(),
            excerpt: record.excerpt.clone(),
            body_markdown: record.body_markdown.clone(),
            tags: record.tags.join(", "),
            author: record.author.clone().unwrap_or_default(),
            cover_image: record.cover_image.clone().unwrap_or_default(),
            locale: record.locale.code().to_string(),
            status: record.status.as_str().to_string(),
            scheduled_at: format_datetime_local(record.scheduled_at),
            translation_of: String::new(),
        }
    }
}

#[derive(Clone)]
pub struct AdminTranslationView {
    pub locale: &'static str,
    pub label: String,
    pub href: String,
    pub exists: bool,
}

#[derive(Clone)]
pub struct AdminPostEditorView {
    pub heading: String,
    pub action: String,
    pub is_new: bool,
    pub id: Option<String>,
    pub values: AdminPostFormValues,
    pub locales: Vec<AdminOption>,
    pub statuses: Vec<AdminOption>,
    pub error: Option<String>,
    pub status_key: Option<&'static str>,
    pub public_href: Option<String>,
    pub translations: Vec<AdminTranslationView>,
}

impl AdminPostEditorView {
    pub fn new_post(values: AdminPostFormValues, error: Option<String>) -> Self {
        let locale = Locale::parse(&values.locale);
        let status = PostStatus::parse(&values.status);
        Self {
            heading: "New post".to_string(),
            action: "/posts/create".to_string(),
            is_new: true,
            id: None,
            locales: locale_options(locale.or(Some(Locale::En))),
            statuses: status_options(status.or(Some(PostStatus::Draft))),
            values,
            error,
            status_key: None,
            public_href: None,
            translations: Vec::new(),
        }
    }

    /// Editor for an existing post; `siblings` are the other members of its translation group.
    pub fn edit_post(
        record: &PostRecord,
        siblings: &[PostRecord],
        values: AdminPostFormValues,
        error: Option<String>,
        default_locale: Locale,
    ) -> Self {
        let translations = Locale::ALL
            .into_iter()
            .filter(|locale| *locale != record.locale)
            .map(|locale| match siblings.iter().find(|post| post.locale == locale) {
                Some(sibling) => AdminTranslationView {
                    locale: locale.code(),
                    label: sibling.title.clone(),
                    href: format!("/posts/{}/edit", sibling.id),
                    exists: true,
                },
                None => AdminTranslationView {
                    locale: locale.code(),
                    label: format!("Translate to {}", locale.native_name()),
                    href: format!(
                        "/posts/new?translation_of={}&locale={}",
                        record.id,
                        locale.code()
                    ),
                    exists: false,
                },
            })
            .collect();

        Self {
            heading: format!("Edit \u{201c}{}\u{201d}", record.title),
            action: format!("/posts/{}/edit", record.id),
            is_new: false,
            id: Some(record.id.to_string()),
            values,
            locales: locale_options(Some(record.locale)),
            statuses: status_options(Some(record.status)),
            error,
            status_key: Some(record.status.as_str()),
            public_href: Some(public_href(record, default_locale)),
            translations,
        }
    }
}

#[derive(Template)]
#[template(path = "admin/post_editor.html")]
pub struct AdminPostEditorTemplate {
    pub view: AdminLayout<AdminPostEditorView>,
}

fn status_options(selected: Option<PostStatus>) -> Vec<AdminOption> {
    PostStatus::ALL
        .into_iter()
        .map(|status| AdminOption {
            value: status.as_str().to_string(),
            label: status_label(status).to_string(),
            selected: selected == Some(status),
        })
        .collect()
}

fn locale_options(selected: Option<Locale>) -> Vec<AdminOption> {
    Locale::ALL
        .into_iter()
        .map(|locale| AdminOption {
            value: locale.code().to_string(),
            label: locale.native_name().to_string(),
            selected: selected == Some(locale),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;

    fn record(locale: Locale, status: PostStatus) -> PostRecord {
        PostRecord {
            id: Uuid::nil(),
            translation_group_id: Uuid::nil(),
            locale,
            slug: "edge".to_string(),
            title: "Edge".to_string(),
            excerpt: "About the edge".to_string(),
            body_markdown: "# Edge".to_string(),
            tags: vec!["cloud".to_string(), "rust".to_string()],
            author: None,
            cover_image: None,
            status,
            scheduled_at: Some(datetime!(2025-05-01 09:30 UTC)),
            published_at: None,
            created_at: datetime!(2025-04-01 00:00 UTC),
            updated_at: datetime!(2025-04-02 00:00 UTC),
        }
    }

    #[test]
    fn scheduled_rows_show_the_schedule_time() {
        let row = AdminPostRowView::from_record(
            &record(Locale::Ja, PostStatus::Scheduled),
            Locale::En,
        );
        assert_eq!(row.display_time, "2025-05-01 09:30 UTC");
        assert_eq!(row.public_href, "/blog/edge?lang=ja");
        assert_eq!(row.status_label, "Scheduled");
    }

    #[test]
    fn form_values_round_trip_editable_fields() {
        let values = AdminPostFormValues::from_record(&record(Locale::En, PostStatus::Scheduled));
        assert_eq!(values.tags, "cloud, rust");
        assert_eq!(values.scheduled_at, "2025-05-01T09:30");
        assert_eq!(values.locale, "en");
    }

    #[test]
    fn editor_offers_missing_translations() {
        let base = record(Locale::En, PostStatus::Draft);
        let sibling = PostRecord {
            id: Uuid::from_u128(7),
            locale: Locale::Ar,
            title: "الحافة".to_string(),
            ..base.clone()
        };

        let view = AdminPostEditorView::edit_post(
            &base,
            &[sibling],
            AdminPostFormValues::from_record(&base),
            None,
            Locale::En,
        );

        let links: Vec<(&str, bool)> = view
            .translations
            .iter()
            .map(|t| (t.locale, t.exists))
            .collect();
        assert_eq!(links, vec![("ja", false), ("ar", true)]);
        assert!(view.translations[0].href.contains("translation_of="));
        assert!(view.translations[0].href.ends_with("locale=ja"));
    }
}
