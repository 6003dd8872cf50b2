//! Hybrid post model: filesystem posts and database posts viewed as one list.

use std::collections::{BTreeMap, HashMap, hash_map::Entry};

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};
use uuid::Uuid;

use super::{
    entities::PostRecord,
    locale::{Locale, split_locale_suffix, with_lang},
};

pub const ISO_DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A post parsed from a Markdown/MDX file.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPost {
    /// File stem, including any locale suffix.
    pub slug: String,
    pub base_slug: String,
    pub locale: Locale,
    pub title: String,
    pub description: String,
    pub published_at: OffsetDateTime,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub cover_image: Option<String>,
    pub draft: bool,
    pub body_markdown: String,
    pub is_mdx: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrigin {
    Static,
    Dynamic {
        id: Uuid,
        translation_group_id: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HybridPost {
    pub locale: Locale,
    /// Slug used in the `/blog/{slug}` route.
    pub slug: String,
    pub base_slug: String,
    pub title: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub cover_image: Option<String>,
    pub published_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub body_markdown: String,
    pub is_mdx: bool,
    pub origin: PostOrigin,
}

impl HybridPost {
    pub fn from_dynamic(record: &PostRecord) -> Self {
        Self {
            locale: record.locale,
            slug: record.slug.clone(),
            base_slug: record.slug.clone(),
            title: record.title.clone(),
            excerpt: record.excerpt.clone(),
            tags: record.tags.clone(),
            author: record.author.clone(),
            cover_image: record.cover_image.clone(),
            published_at: record.effective_published_at(),
            updated_at: Some(record.updated_at),
            body_markdown: record.body_markdown.clone(),
            is_mdx: false,
            origin: PostOrigin::Dynamic {
                id: record.id,
                translation_group_id: record.translation_group_id,
            },
        }
    }

    pub fn from_static(post: &StaticPost) -> Self {
        Self {
            locale: post.locale,
            slug: post.slug.clone(),
            base_slug: post.base_slug.clone(),
            title: post.title.clone(),
            excerpt: post.description.clone(),
            tags: post.tags.clone(),
            author: post.author.clone(),
            cover_image: post.cover_image.clone(),
            published_at: post.published_at,
            updated_at: None,
            body_markdown: post.body_markdown.clone(),
            is_mdx: post.is_mdx,
            origin: PostOrigin::Static,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.origin, PostOrigin::Static)
    }

    pub fn path(&self) -> String {
        format!("/blog/{}", self.slug)
    }

    /// Link to the post. Suffixed static slugs carry their locale already.
    pub fn href(&self, default_locale: Locale) -> String {
        if split_locale_suffix(&self.slug).1.is_some() {
            self.path()
        } else {
            with_lang(&self.path(), self.locale, default_locale)
        }
    }

    /// Key shared by the language versions of one article.
    pub fn translation_key(&self) -> String {
        match self.origin {
            PostOrigin::Dynamic {
                translation_group_id,
                ..
            } => format!("group:{translation_group_id}"),
            PostOrigin::Static => format!("static:{}", self.base_slug),
        }
    }

    pub fn published_date_label(&self) -> String {
        self.published_at
            .date()
            .format(ISO_DATE_FORMAT)
            .unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Merge both sources for `locale`, keyed by (locale, base slug).
///
/// Visible dynamic posts are inserted first so they shadow static files with
/// the same key. The result is newest first, ties broken by slug.
pub fn merge_posts(
    dynamic: &[PostRecord],
    statics: &[StaticPost],
    locale: Locale,
    now: OffsetDateTime,
) -> Vec<HybridPost> {
    let mut merged: HashMap<(Locale, String), HybridPost> = HashMap::new();

    for record in dynamic
        .iter()
        .filter(|record| record.locale == locale && record.is_visible_at(now))
    {
        merged
            .entry((record.locale, record.slug.clone()))
            .or_insert_with(|| HybridPost::from_dynamic(record));
    }

    for post in statics
        .iter()
        .filter(|post| post.locale == locale && !post.draft)
    {
        if let Entry::Vacant(slot) = merged.entry((post.locale, post.base_slug.clone())) {
            slot.insert(HybridPost::from_static(post));
        }
    }

    let mut posts: Vec<HybridPost> = merged.into_values().collect();
    posts.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    posts
}

/// Tags across `posts`, most used first.
pub fn tag_counts(posts: &[HybridPost]) -> Vec<TagCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for post in posts {
        for tag in &post.tags {
            *counts.entry(tag.to_lowercase()).or_default() += 1;
        }
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(name, count)| TagCount { name, count })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    tags
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::types::PostStatus;

    fn record(locale: Locale, slug: &str, status: PostStatus) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            translation_group_id: Uuid::new_v4(),
            locale,
            slug: slug.to_string(),
            title: format!("db {slug}"),
            excerpt: String::new(),
            body_markdown: String::new(),
            tags: vec!["rust".to_string()],
            author: None,
            cover_image: None,
            status,
            scheduled_at: None,
            published_at: Some(datetime!(2025-03-01 0:00 UTC)),
            created_at: datetime!(2025-02-01 0:00 UTC),
            updated_at: datetime!(2025-03-01 0:00 UTC),
        }
    }

    fn static_post(slug: &str, published: OffsetDateTime) -> StaticPost {
        let (base, suffix) = split_locale_suffix(slug);
        StaticPost {
            slug: slug.to_string(),
            base_slug: base.to_string(),
            locale: suffix.unwrap_or(Locale::En),
            title: format!("fs {slug}"),
            description: String::new(),
            published_at: published,
            tags: vec!["Rust".to_string(), "web".to_string()],
            author: None,
            cover_image: None,
            draft: false,
            body_markdown: String::new(),
            is_mdx: true,
        }
    }

    fn now() -> OffsetDateTime {
        datetime!(2025-06-01 0:00 UTC)
    }

    #[test]
    fn dynamic_post_shadows_static_with_same_key() {
        let dynamic = vec![record(Locale::Ja, "hello", PostStatus::Published)];
        let statics = vec![
            static_post("hello-ja", datetime!(2024-01-01 0:00 UTC)),
            static_post("hello", datetime!(2024-01-01 0:00 UTC)),
        ];

        let merged = merge_posts(&dynamic, &statics, Locale::Ja, now());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "db hello");
        assert!(!merged[0].is_static());
    }

    #[test]
    fn other_locales_are_excluded() {
        let dynamic = vec![record(Locale::Ar, "only-ar", PostStatus::Published)];
        let statics = vec![
            static_post("guide-ja", datetime!(2024-01-01 0:00 UTC)),
            static_post("guide", datetime!(2024-02-01 0:00 UTC)),
        ];

        let merged = merge_posts(&dynamic, &statics, Locale::En, now());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].slug, "guide");
    }

    #[test]
    fn drafts_and_future_posts_are_hidden() {
        let mut scheduled = record(Locale::En, "later", PostStatus::Scheduled);
        scheduled.published_at = None;
        scheduled.scheduled_at = Some(datetime!(2026-01-01 0:00 UTC));
        let mut due = record(Locale::En, "due", PostStatus::Scheduled);
        due.published_at = None;
        due.scheduled_at = Some(datetime!(2025-05-01 0:00 UTC));
        let draft = record(Locale::En, "draft", PostStatus::Draft);
        let mut static_draft = static_post("wip", datetime!(2024-01-01 0:00 UTC));
        static_draft.draft = true;

        let merged = merge_posts(&[scheduled, due, draft], &[static_draft], Locale::En, now());

        let slugs: Vec<&str> = merged.iter().map(|post| post.slug.as_str()).collect();
        assert_eq!(slugs, vec!["due"]);
    }

    #[test]
    fn merged_posts_are_newest_first() {
        let statics = vec![
            static_post("old", datetime!(2023-01-01 0:00 UTC)),
            static_post("new", datetime!(2025-01-01 0:00 UTC)),
            static_post("alpha", datetime!(2024-01-01 0:00 UTC)),
            static_post("beta", datetime!(2024-01-01 0:00 UTC)),
        ];

        let merged = merge_posts(&[], &statics, Locale::En, now());
        let slugs: Vec<&str> = merged.iter().map(|post| post.slug.as_str()).collect();

        assert_eq!(slugs, vec!["new", "alpha", "beta", "old"]);
    }

    #[test]
    fn href_keeps_suffix_routes_bare() {
        let post = HybridPost::from_static(&static_post("guide-ja", now()));
        assert_eq!(post.href(Locale::En), "/blog/guide-ja");

        let dynamic =
            HybridPost::from_dynamic(&record(Locale::Ar, "intro", PostStatus::Published));
        assert_eq!(dynamic.href(Locale::En), "/blog/intro?lang=ar");
    }

    #[test]
    fn tag_counts_fold_case() {
        let statics = vec![static_post("one", now()), static_post("two", now())];
        let merged = merge_posts(&[], &statics, Locale::En, now());

        let tags = tag_counts(&merged);
        assert_eq!(
            tags,
            vec![
                TagCount {
                    name: "rust".to_string(),
                    count: 2
                },
                TagCount {
                    name: "web".to_string(),
                    count: 2
                },
            ]
        );
    }
}
