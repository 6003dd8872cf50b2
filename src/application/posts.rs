//! Hybrid post resolution across the database and the content directory.
//!
//! Database failures never surface to readers: every read path logs the
//! error, bumps `meridian_post_fallback_total` and continues with the static
//! files alone.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::pagination::{Page, paginate};
use crate::application::repos::{ContentError, PostsRepo, RepoError, StaticPostSource};
use crate::domain::{
    entities::PostRecord,
    locale::{Locale, localized_slug, split_locale_suffix, static_candidates},
    posts::{HybridPost, PostOrigin, StaticPost, TagCount, merge_posts, tag_counts},
};

const FALLBACK_METRIC: &str = "meridian_post_fallback_total";
const STATIC_ERRORS_METRIC: &str = "meridian_static_post_errors_total";

#[derive(Debug, Error)]
pub enum PostsError {
    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Debug, Clone)]
pub struct PostQuery {
    pub locale: Locale,
    pub tag: Option<String>,
    pub page: usize,
}

#[derive(Debug, Clone)]
pub struct PostListing {
    pub page: Page<HybridPost>,
    pub tags: Vec<TagCount>,
    pub active_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageVariant {
    pub locale: Locale,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedPost {
    pub post: HybridPost,
    pub requested_locale: Locale,
    pub variants: Vec<LanguageVariant>,
}

impl ResolvedPost {
    /// The article exists, but not in the language that was asked for.
    pub fn is_locale_fallback(&self) -> bool {
        self.post.locale != self.requested_locale
    }
}

#[derive(Clone)]
pub struct HybridPostService {
    dynamic: Option<Arc<dyn PostsRepo>>,
    statics: Arc<dyn StaticPostSource>,
    default_locale: Locale,
    per_page: usize,
}

impl HybridPostService {
    pub fn new(
        dynamic: Option<Arc<dyn PostsRepo>>,
        statics: Arc<dyn StaticPostSource>,
        default_locale: Locale,
        per_page: usize,
    ) -> Self {
        Self {
            dynamic,
            statics,
            default_locale,
            per_page: per_page.max(1),
        }
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    /// Merged posts for one locale.
    pub async fn list(&self, locale: Locale) -> Result<Vec<HybridPost>, PostsError> {
        let now = OffsetDateTime::now_utc();
        let dynamic = self.dynamic_visible(Some(locale), now).await;
        let statics = self.statics.list().await?;
        Ok(merge_posts(&dynamic, &statics, locale, now))
    }

    /// Merged posts for every locale, each list deduplicated on its own.
    pub async fn list_all_locales(&self) -> Result<Vec<HybridPost>, PostsError> {
        let now = OffsetDateTime::now_utc();
        let dynamic = self.dynamic_visible(None, now).await;
        let statics = self.statics.list().await?;

        Ok(Locale::ALL
            .into_iter()
            .flat_map(|locale| merge_posts(&dynamic, &statics, locale, now))
            .collect())
    }

    pub async fn latest(
        &self,
        locale: Locale,
        limit: usize,
    ) -> Result<Vec<HybridPost>, PostsError> {
        let mut posts = self.list(locale).await?;
        posts.truncate(limit);
        Ok(posts)
    }

    pub async fn listing(&self, query: &PostQuery) -> Result<PostListing, PostsError> {
        let posts = self.list(query.locale).await?;
        let tags = tag_counts(&posts);

        let active_tag = query
            .tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_lowercase);

        let filtered = match active_tag.as_deref() {
            Some(tag) => posts.into_iter().filter(|post| post.has_tag(tag)).collect(),
            None => posts,
        };

        Ok(PostListing {
            page: paginate(filtered, query.page, self.per_page),
            tags,
            active_tag,
        })
    }

    /// Resolve `/blog/{slug}` for the requested language.
    ///
    /// A `-ja`/`-ar` suffix on the slug wins over `lang`. The database is
    /// consulted first; a miss or any error falls through to the static
    /// candidates for the locale, skipping files that fail to load.
    pub async fn resolve(&self, slug: &str, lang: Option<Locale>) -> Option<ResolvedPost> {
        let (base, suffix_locale) = split_locale_suffix(slug);
        let locale = suffix_locale.or(lang).unwrap_or(self.default_locale);
        let now = OffsetDateTime::now_utc();

        if let Some(repo) = self.dynamic.as_ref() {
            match repo.find_visible(locale, base, now).await {
                Ok(Some(record)) => {
                    let post = HybridPost::from_dynamic(&record);
                    return Some(self.finish(post, locale).await);
                }
                Ok(None) => {}
                Err(err) => self.note_fallback("resolve", &err),
            }
        }

        let found = self.find_static(base, locale).await?;
        Some(self.finish(HybridPost::from_static(&found), locale).await)
    }

    async fn finish(&self, post: HybridPost, requested_locale: Locale) -> ResolvedPost {
        let variants = self.variants(&post).await;
        ResolvedPost {
            post,
            requested_locale,
            variants,
        }
    }

    async fn find_static(&self, base: &str, locale: Locale) -> Option<StaticPost> {
        for candidate in static_candidates(base, locale) {
            match self.statics.find(&candidate).await {
                Ok(Some(post)) if !post.draft => return Some(post),
                Ok(_) => continue,
                Err(ContentError::InvalidSlug { .. }) => return None,
                Err(err) => {
                    counter!(STATIC_ERRORS_METRIC).increment(1);
                    warn!(
                        target = "meridian::posts",
                        slug = %candidate,
                        error = %err,
                        "Skipping unreadable static candidate"
                    );
                }
            }
        }
        None
    }

    /// Language versions of `post` that exist exactly in each locale.
    pub async fn variants(&self, post: &HybridPost) -> Vec<LanguageVariant> {
        let now = OffsetDateTime::now_utc();
        let group = self.translation_group(post, now).await;
        let mut variants = Vec::with_capacity(Locale::ALL.len());

        for locale in Locale::ALL {
            if locale == post.locale {
                variants.push(self.variant_for(post));
                continue;
            }

            if let Some(record) = group.iter().find(|record| record.locale == locale) {
                variants.push(self.variant_for(&HybridPost::from_dynamic(record)));
                continue;
            }

            if let Some(repo) = self.dynamic.as_ref() {
                match repo.find_visible(locale, &post.base_slug, now).await {
                    Ok(Some(record)) => {
                        variants.push(self.variant_for(&HybridPost::from_dynamic(&record)));
                        continue;
                    }
                    Ok(None) => {}
                    Err(err) => self.note_fallback("variants", &err),
                }
            }

            let candidate = localized_slug(&post.base_slug, locale);
            match self.statics.find(&candidate).await {
                Ok(Some(found)) if !found.draft && found.locale == locale => {
                    variants.push(self.variant_for(&HybridPost::from_static(&found)));
                }
                Ok(_) => {}
                Err(err) => warn!(
                    target = "meridian::posts",
                    slug = %candidate,
                    error = %err,
                    "Skipping unreadable language variant"
                ),
            }
        }

        variants
    }

    fn variant_for(&self, post: &HybridPost) -> LanguageVariant {
        LanguageVariant {
            locale: post.locale,
            href: post.href(self.default_locale),
        }
    }

    async fn translation_group(&self, post: &HybridPost, now: OffsetDateTime) -> Vec<PostRecord> {
        let (
            PostOrigin::Dynamic {
                translation_group_id,
                ..
            },
            Some(repo),
        ) = (post.origin, self.dynamic.as_ref())
        else {
            return Vec::new();
        };

        match repo.list_translations(translation_group_id).await {
            Ok(records) => records
                .into_iter()
                .filter(|record| record.is_visible_at(now))
                .collect(),
            Err(err) => {
                self.note_fallback("translations", &err);
                Vec::new()
            }
        }
    }

    async fn dynamic_visible(
        &self,
        locale: Option<Locale>,
        now: OffsetDateTime,
    ) -> Vec<PostRecord> {
        let Some(repo) = self.dynamic.as_ref() else {
            return Vec::new();
        };

        match repo.list_visible(locale, now).await {
            Ok(records) => records,
            Err(err) => {
                self.note_fallback("list", &err);
                Vec::new()
            }
        }
    }

    fn note_fallback(&self, operation: &'static str, err: &RepoError) {
        counter!(FALLBACK_METRIC, "operation" => operation).increment(1);
        warn!(
            target = "meridian::posts",
            operation,
            error = %err,
            "Database post lookup failed; serving static content"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::application::repos::{AdminPostFilter, PostStatusCounts};
    use crate::domain::types::PostStatus;

    #[derive(Default)]
    struct FakePosts {
        records: Vec<PostRecord>,
        fail: bool,
    }

    impl FakePosts {
        fn check(&self) -> Result<(), RepoError> {
            if self.fail {
                Err(RepoError::Timeout)
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PostsRepo for FakePosts {
        async fn list_visible(
            &self,
            locale: Option<Locale>,
            now: OffsetDateTime,
        ) -> Result<Vec<PostRecord>, RepoError> {
            self.check()?;
            Ok(self
                .records
                .iter()
                .filter(|r| locale.is_none_or(|l| r.locale == l) && r.is_visible_at(now))
                .cloned()
                .collect())
        }

        async fn find_visible(
            &self,
            locale: Locale,
            slug: &str,
            now: OffsetDateTime,
        ) -> Result<Option<PostRecord>, RepoError> {
            self.check()?;
            Ok(self
                .records
                .iter()
                .find(|r| r.locale == locale && r.slug == slug && r.is_visible_at(now))
                .cloned())
        }

        async fn list_translations(&self, group_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
            self.check()?;
            Ok(self
                .records
                .iter()
                .filter(|r| r.translation_group_id == group_id)
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<PostRecord>, RepoError> {
            unimplemented!()
        }

        async fn find_by_slug(
            &self,
            _locale: Locale,
            _slug: &str,
        ) -> Result<Option<PostRecord>, RepoError> {
            unimplemented!()
        }

        async fn list_admin(
            &self,
            _filter: &AdminPostFilter,
        ) -> Result<Vec<PostRecord>, RepoError> {
            unimplemented!()
        }

        async fn count_by_status(&self) -> Result<PostStatusCounts, RepoError> {
            unimplemented!()
        }
    }

    struct FakeStatics {
        posts: HashMap<String, StaticPost>,
        broken: Vec<String>,
    }

    impl FakeStatics {
        fn new(posts: Vec<StaticPost>) -> Self {
            Self {
                posts: posts.into_iter().map(|p| (p.slug.clone(), p)).collect(),
                broken: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl StaticPostSource for FakeStatics {
        async fn list(&self) -> Result<Vec<StaticPost>, ContentError> {
            Ok(self.posts.values().cloned().collect())
        }

        async fn find(&self, slug: &str) -> Result<Option<StaticPost>, ContentError> {
            if self.broken.iter().any(|broken| broken == slug) {
                return Err(ContentError::FrontMatter {
                    path: format!("{slug}.md").into(),
                    message: "unclosed sequence".to_string(),
                });
            }
            Ok(self.posts.get(slug).cloned())
        }
    }

    fn static_post(slug: &str) -> StaticPost {
        let (base, suffix) = split_locale_suffix(slug);
        StaticPost {
            slug: slug.to_string(),
            base_slug: base.to_string(),
            locale: suffix.unwrap_or(Locale::En),
            title: format!("fs {slug}"),
            description: String::new(),
            published_at: datetime!(2024-05-01 0:00 UTC),
            tags: vec!["rust".to_string()],
            author: None,
            cover_image: None,
            draft: false,
            body_markdown: "body".to_string(),
            is_mdx: false,
        }
    }

    fn record(locale: Locale, slug: &str, group: Uuid) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            translation_group_id: group,
            locale,
            slug: slug.to_string(),
            title: format!("db {slug}"),
            excerpt: String::new(),
            body_markdown: "db body".to_string(),
            tags: vec!["cloud".to_string()],
            author: None,
            cover_image: None,
            status: PostStatus::Published,
            scheduled_at: None,
            published_at: Some(datetime!(2025-01-01 0:00 UTC)),
            created_at: datetime!(2025-01-01 0:00 UTC),
            updated_at: datetime!(2025-01-01 0:00 UTC),
        }
    }

    fn service(posts: Option<FakePosts>, statics: Vec<StaticPost>) -> HybridPostService {
        HybridPostService::new(
            posts.map(|p| Arc::new(p) as Arc<dyn PostsRepo>),
            Arc::new(FakeStatics::new(statics)),
            Locale::En,
            2,
        )
    }

    #[tokio::test]
    async fn database_failure_falls_back_to_static_file() {
        let svc = service(
            Some(FakePosts {
                fail: true,
                ..Default::default()
            }),
            vec![static_post("hello")],
        );

        let resolved = svc.resolve("hello", None).await.expect("post");
        assert!(resolved.post.is_static());
        assert_eq!(resolved.post.title, "fs hello");
    }

    #[tokio::test]
    async fn dynamic_post_takes_precedence() {
        let svc = service(
            Some(FakePosts {
                records: vec![record(Locale::En, "hello", Uuid::new_v4())],
                fail: false,
            }),
            vec![static_post("hello")],
        );

        let resolved = svc.resolve("hello", None).await.expect("post");
        assert!(!resolved.post.is_static());
        assert_eq!(resolved.post.title, "db hello");
    }

    #[tokio::test]
    async fn suffix_overrides_lang_parameter() {
        let svc = service(None, vec![static_post("hello"), static_post("hello-ar")]);

        let resolved = svc
            .resolve("hello-ar", Some(Locale::Ja))
            .await
            .expect("post");
        assert_eq!(resolved.post.locale, Locale::Ar);
        assert_eq!(resolved.requested_locale, Locale::Ar);
        assert!(!resolved.is_locale_fallback());
    }

    #[tokio::test]
    async fn missing_translation_falls_back_to_base_file() {
        let svc = service(None, vec![static_post("hello")]);

        let resolved = svc
            .resolve("hello", Some(Locale::Ja))
            .await
            .expect("post");
        assert_eq!(resolved.post.slug, "hello");
        assert!(resolved.is_locale_fallback());
    }

    #[tokio::test]
    async fn unparsable_candidate_is_skipped() {
        let mut statics = FakeStatics::new(vec![static_post("hello")]);
        statics.broken.push("hello-ja".to_string());
        let svc = HybridPostService::new(None, Arc::new(statics), Locale::En, 2);

        let resolved = svc
            .resolve("hello", Some(Locale::Ja))
            .await
            .expect("post");
        assert_eq!(resolved.post.slug, "hello");
        assert!(resolved.is_locale_fallback());
    }

    #[tokio::test]
    async fn explicit_english_file_is_last_candidate() {
        let svc = service(None, vec![static_post("hello-en")]);

        let resolved = svc
            .resolve("hello", Some(Locale::Ar))
            .await
            .expect("post");
        assert_eq!(resolved.post.slug, "hello-en");
    }

    #[tokio::test]
    async fn unknown_slug_resolves_to_none() {
        let svc = service(None, vec![static_post("hello")]);
        assert!(svc.resolve("missing", None).await.is_none());
    }

    #[tokio::test]
    async fn drafts_are_never_resolved() {
        let mut draft = static_post("wip");
        draft.draft = true;
        let svc = service(None, vec![draft]);
        assert!(svc.resolve("wip", None).await.is_none());
    }

    #[tokio::test]
    async fn static_variants_cover_existing_files() {
        let svc = service(None, vec![static_post("hello"), static_post("hello-ja")]);

        let resolved = svc.resolve("hello", None).await.expect("post");
        assert_eq!(
            resolved.variants,
            vec![
                LanguageVariant {
                    locale: Locale::En,
                    href: "/blog/hello".to_string()
                },
                LanguageVariant {
                    locale: Locale::Ja,
                    href: "/blog/hello-ja".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn dynamic_variants_follow_translation_group() {
        let group = Uuid::new_v4();
        let svc = service(
            Some(FakePosts {
                records: vec![
                    record(Locale::En, "launch", group),
                    record(Locale::Ar, "itlaq", group),
                ],
                fail: false,
            }),
            Vec::new(),
        );

        let resolved = svc.resolve("launch", None).await.expect("post");
        let hrefs: Vec<&str> = resolved.variants.iter().map(|v| v.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/blog/launch", "/blog/itlaq?lang=ar"]);
    }

    #[tokio::test]
    async fn listing_survives_database_failure() {
        let svc = service(
            Some(FakePosts {
                fail: true,
                ..Default::default()
            }),
            vec![static_post("one"), static_post("two"), static_post("three")],
        );

        let listing = svc
            .listing(&PostQuery {
                locale: Locale::En,
                tag: None,
                page: 2,
            })
            .await
            .unwrap();

        assert_eq!(listing.page.total_items, 3);
        assert_eq!(listing.page.total_pages, 2);
        assert_eq!(listing.page.items.len(), 1);
    }

    #[tokio::test]
    async fn listing_filters_by_tag() {
        let svc = service(
            Some(FakePosts {
                records: vec![record(Locale::En, "cloud-post", Uuid::new_v4())],
                fail: false,
            }),
            vec![static_post("rusty")],
        );

        let listing = svc
            .listing(&PostQuery {
                locale: Locale::En,
                tag: Some("Cloud".to_string()),
                page: 1,
            })
            .await
            .unwrap();

        assert_eq!(listing.active_tag.as_deref(), Some("cloud"));
        assert_eq!(listing.page.items.len(), 1);
        assert_eq!(listing.page.items[0].slug, "cloud-post");
        assert_eq!(listing.tags.len(), 2);
    }
}
