#![allow(dead_code)]

use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use time::OffsetDateTime;
use uuid::Uuid;

use meridian::{
    application::{
        contact::ContactService,
        posts::HybridPostService,
        repos::{
            AdminPostFilter, AuditRepo, ContactRepo, CreatePostParams, PostStatusCounts,
            PostsRepo, PostsWriteRepo, RepoError, StaticPostSource, UpdatePostParams,
            UpdatePostStatusParams,
        },
        site::SiteProfile,
        sitemap::SitemapService,
    },
    domain::{
        entities::{AuditLogRecord, ContactMessageRecord, PostRecord},
        locale::Locale,
        types::PostStatus,
    },
    infra::{
        content::FsStaticPosts,
        http::{ContactRateLimiter, HttpState, SecurityPolicy},
    },
};

/// In-memory stand-in for the Postgres repositories.
#[derive(Default)]
pub struct MemoryStore {
    pub posts: Mutex<Vec<PostRecord>>,
    pub messages: Mutex<Vec<ContactMessageRecord>>,
    pub audit: Mutex<Vec<AuditLogRecord>>,
    /// Makes every post read fail like an unreachable database.
    pub offline: AtomicBool,
}

impl MemoryStore {
    pub fn with_posts(posts: Vec<PostRecord>) -> Arc<Self> {
        let store = Self::default();
        *store.posts.lock().expect("lock") = posts;
        Arc::new(store)
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), RepoError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }

    pub fn post_by_slug(&self, locale: Locale, slug: &str) -> Option<PostRecord> {
        self.posts
            .lock()
            .expect("lock")
            .iter()
            .find(|post| post.locale == locale && post.slug == slug)
            .cloned()
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_visible(
        &self,
        locale: Option<Locale>,
        now: OffsetDateTime,
    ) -> Result<Vec<PostRecord>, RepoError> {
        self.check_online()?;
        Ok(self
            .posts
            .lock()
            .expect("lock")
            .iter()
            .filter(|post| locale.is_none_or(|locale| post.locale == locale))
            .filter(|post| post.is_visible_at(now))
            .cloned()
            .collect())
    }

    async fn find_visible(
        &self,
        locale: Locale,
        slug: &str,
        now: OffsetDateTime,
    ) -> Result<Option<PostRecord>, RepoError> {
        self.check_online()?;
        Ok(self
            .post_by_slug(locale, slug)
            .filter(|post| post.is_visible_at(now)))
    }

    async fn list_translations(&self, group_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
        self.check_online()?;
        Ok(self
            .posts
            .lock()
            .expect("lock")
            .iter()
            .filter(|post| post.translation_group_id == group_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        self.check_online()?;
        Ok(self
            .posts
            .lock()
            .expect("lock")
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }

    async fn find_by_slug(
        &self,
        locale: Locale,
        slug: &str,
    ) -> Result<Option<PostRecord>, RepoError> {
        self.check_online()?;
        Ok(self.post_by_slug(locale, slug))
    }

    async fn list_admin(&self, filter: &AdminPostFilter) -> Result<Vec<PostRecord>, RepoError> {
        self.check_online()?;
        let search = filter.search.as_deref().map(str::to_lowercase);
        Ok(self
            .posts
            .lock()
            .expect("lock")
            .iter()
            .filter(|post| filter.status.is_none_or(|status| post.status == status))
            .filter(|post| filter.locale.is_none_or(|locale| post.locale == locale))
            .filter(|post| {
                search.as_deref().is_none_or(|needle| {
                    post.title.to_lowercase().contains(needle) || post.slug.contains(needle)
                })
            })
            .cloned()
            .collect())
    }

    async fn count_by_status(&self) -> Result<PostStatusCounts, RepoError> {
        self.check_online()?;
        let posts = self.posts.lock().expect("lock");
        let count = |status: PostStatus| posts.iter().filter(|post| post.status == status).count() as u64;
        Ok(PostStatusCounts {
            total: posts.len() as u64,
            draft: count(PostStatus::Draft),
            published: count(PostStatus::Published),
            scheduled: count(PostStatus::Scheduled),
        })
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: Uuid::new_v4(),
            translation_group_id: params.translation_group_id,
            locale: params.locale,
            slug: params.slug,
            title: params.title,
            excerpt: params.excerpt,
            body_markdown: params.body_markdown,
            tags: params.tags,
            author: params.author,
            cover_image: params.cover_image,
            status: params.status,
            scheduled_at: params.scheduled_at,
            published_at: params.published_at,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().expect("lock").push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().expect("lock");
        let post = posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.slug = params.slug;
        post.title = params.title;
        post.excerpt = params.excerpt;
        post.body_markdown = params.body_markdown;
        post.tags = params.tags;
        post.author = params.author;
        post.cover_image = params.cover_image;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }

    async fn update_post_status(
        &self,
        params: UpdatePostStatusParams,
    ) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().expect("lock");
        let post = posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.status = params.status;
        post.scheduled_at = params.scheduled_at;
        post.published_at = params.published_at;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts.lock().expect("lock").retain(|post| post.id != id);
        Ok(())
    }

    async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<PostRecord>, RepoError> {
        let mut promoted = Vec::new();
        for post in self.posts.lock().expect("lock").iter_mut() {
            if post.status == PostStatus::Scheduled && post.scheduled_at.is_some_and(|at| at <= now)
            {
                post.status = PostStatus::Published;
                post.published_at = post.scheduled_at;
                post.scheduled_at = None;
                promoted.push(post.clone());
            }
        }
        Ok(promoted)
    }
}

#[async_trait]
impl ContactRepo for MemoryStore {
    async fn append_message(&self, record: ContactMessageRecord) -> Result<(), RepoError> {
        self.messages.lock().expect("lock").push(record);
        Ok(())
    }

    async fn mark_delivered(&self, id: Uuid) -> Result<(), RepoError> {
        for message in self.messages.lock().expect("lock").iter_mut() {
            if message.id == id {
                message.delivered = true;
            }
        }
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<ContactMessageRecord>, RepoError> {
        Ok(self
            .messages
            .lock()
            .expect("lock")
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditRepo for MemoryStore {
    async fn append_log(&self, record: AuditLogRecord) -> Result<(), RepoError> {
        self.audit.lock().expect("lock").push(record);
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditLogRecord>, RepoError> {
        Ok(self
            .audit
            .lock()
            .expect("lock")
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

pub fn site() -> SiteProfile {
    SiteProfile {
        public_url: "https://meridian.test".to_string(),
        brand: "Meridian Systems".to_string(),
        default_locale: Locale::En,
        analytics_id: None,
        captcha_site_key: None,
    }
}

/// A published database post.
pub fn published_post(locale: Locale, slug: &str, title: &str) -> PostRecord {
    let at = OffsetDateTime::now_utc() - time::Duration::days(1);
    PostRecord {
        id: Uuid::new_v4(),
        translation_group_id: Uuid::new_v4(),
        locale,
        slug: slug.to_string(),
        title: title.to_string(),
        excerpt: format!("{title} excerpt"),
        body_markdown: format!("# {title}\n\nBody text."),
        tags: vec!["cloud".to_string()],
        author: Some("Meridian".to_string()),
        cover_image: None,
        status: PostStatus::Published,
        scheduled_at: None,
        published_at: Some(at),
        created_at: at,
        updated_at: at,
    }
}

pub fn write_post(dir: &Path, file: &str, title: &str, date: &str) {
    let source = format!(
        "---\ntitle: \"{title}\"\ndescription: \"{title} summary\"\ndate: \"{date}\"\ntags: [cloud]\n---\n\n# {title}\n\nStatic body.\n"
    );
    std::fs::write(dir.join(file), source).expect("write post");
}

/// Public router state over a content directory and an optional in-memory database.
pub fn http_state(
    content: &Path,
    store: Option<Arc<MemoryStore>>,
    contact_limit: u32,
) -> HttpState {
    let site = site();
    let statics: Arc<dyn StaticPostSource> = Arc::new(FsStaticPosts::new(content));
    let dynamic = store.clone().map(|store| store as Arc<dyn PostsRepo>);
    let posts = Arc::new(HybridPostService::new(dynamic, statics, Locale::En, 9));
    let contact_repo = store.map(|store| store as Arc<dyn ContactRepo>);

    HttpState {
        sitemap: Arc::new(SitemapService::new(posts.clone(), site.clone())),
        posts,
        contact: Arc::new(ContactService::new(contact_repo, None, None)),
        limiter: ContactRateLimiter::new(Duration::from_secs(600), contact_limit),
        security: Arc::new(SecurityPolicy::public(&site, true)),
        site: Arc::new(site),
        db: None,
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = to_bytes(body, usize::MAX).await.expect("collect body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
