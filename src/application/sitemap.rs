//! Sitemap service for sitemap.xml and robots.txt generation.

use std::{collections::HashMap, sync::Arc};

use time::format_description::well_known::Rfc3339;

use crate::application::posts::{HybridPostService, PostsError};
use crate::application::site::{MARKETING_PATHS, SiteProfile};
use crate::domain::{locale::Locale, posts::HybridPost};

#[derive(Clone)]
pub struct SitemapService {
    posts: Arc<HybridPostService>,
    site: SiteProfile,
}

struct SitemapEntry {
    loc: String,
    lastmod: Option<String>,
    alternates: Vec<(String, String)>,
}

impl SitemapService {
    pub fn new(posts: Arc<HybridPostService>, site: SiteProfile) -> Self {
        Self { posts, site }
    }

    /// Generate sitemap.xml content with `xhtml:link` language alternates.
    pub async fn sitemap_xml(&self) -> Result<String, PostsError> {
        let mut entries = self.marketing_entries();
        entries.extend(self.post_entries().await?);

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" xmlns:xhtml=\"http://www.w3.org/1999/xhtml\">\n",
        );
        for entry in entries {
            push_entry(&mut xml, &entry);
        }
        xml.push_str("</urlset>\n");
        Ok(xml)
    }

    pub fn robots_txt(&self) -> String {
        let sitemap_url = self.site.absolute("/sitemap.xml");
        format!("User-agent: *\nAllow: /\nSitemap: {sitemap_url}\n")
    }

    fn marketing_entries(&self) -> Vec<SitemapEntry> {
        let mut entries = Vec::new();
        for path in MARKETING_PATHS {
            let mut alternates: Vec<(String, String)> = Locale::ALL
                .into_iter()
                .map(|locale| {
                    (
                        locale.code().to_string(),
                        self.site.localized_url(path, locale),
                    )
                })
                .collect();
            alternates.push((
                "x-default".to_string(),
                self.site.localized_url(path, self.site.default_locale),
            ));

            for locale in Locale::ALL {
                entries.push(SitemapEntry {
                    loc: self.site.localized_url(path, locale),
                    lastmod: None,
                    alternates: alternates.clone(),
                });
            }
        }
        entries
    }

    /// One entry per merged post. Alternates follow the same rule as the
    /// page language switcher: the translation group first, then a post with
    /// the same base slug in the other locale.
    async fn post_entries(&self) -> Result<Vec<SitemapEntry>, PostsError> {
        let posts = self.posts.list_all_locales().await?;

        let mut by_group: HashMap<(String, Locale), &HybridPost> = HashMap::new();
        let mut by_base: HashMap<(Locale, &str), &HybridPost> = HashMap::new();
        for post in &posts {
            by_group
                .entry((post.translation_key(), post.locale))
                .or_insert(post);
            by_base
                .entry((post.locale, post.base_slug.as_str()))
                .or_insert(post);
        }

        let mut entries = Vec::with_capacity(posts.len());
        for post in &posts {
            let key = post.translation_key();
            let members: Vec<&HybridPost> = Locale::ALL
                .into_iter()
                .filter_map(|locale| {
                    if locale == post.locale {
                        return Some(post);
                    }
                    by_group
                        .get(&(key.clone(), locale))
                        .or_else(|| by_base.get(&(locale, post.base_slug.as_str())))
                        .copied()
                })
                .collect();

            // A lone post has no translations to advertise.
            let alternates = if members.len() > 1 {
                self.post_alternates(&members)
            } else {
                Vec::new()
            };

            let lastmod = post.updated_at.unwrap_or(post.published_at);
            entries.push(SitemapEntry {
                loc: self.site.absolute(&post.href(self.site.default_locale)),
                lastmod: lastmod.format(&Rfc3339).ok(),
                alternates,
            });
        }
        Ok(entries)
    }

    fn post_alternates(&self, members: &[&HybridPost]) -> Vec<(String, String)> {
        let default_locale = self.site.default_locale;
        let mut alternates: Vec<(String, String)> = members
            .iter()
            .map(|post| {
                (
                    post.locale.code().to_string(),
                    self.site.absolute(&post.href(default_locale)),
                )
            })
            .collect();
        if let Some(default) = members.iter().find(|post| post.locale == default_locale) {
            alternates.push((
                "x-default".to_string(),
                self.site.absolute(&default.href(default_locale)),
            ));
        }
        alternates
    }
}

fn push_entry(xml: &mut String, entry: &SitemapEntry) {
    xml.push_str("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&entry.loc)));
    if let Some(lastmod) = entry.lastmod.as_ref() {
        xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
    }
    for (hreflang, href) in &entry.alternates {
        xml.push_str(&format!(
            "    <xhtml:link rel=\"alternate\" hreflang=\"{hreflang}\" href=\"{}\"/>\n",
            xml_escape(href)
        ));
    }
    xml.push_str("  </url>\n");
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use time::macros::datetime;

    use super::*;
    use crate::application::repos::{ContentError, StaticPostSource};
    use crate::application::site::test_profile;
    use crate::domain::locale::split_locale_suffix;
    use crate::domain::posts::StaticPost;

    struct Files(Vec<StaticPost>);

    #[async_trait]
    impl StaticPostSource for Files {
        async fn list(&self) -> Result<Vec<StaticPost>, ContentError> {
            Ok(self.0.clone())
        }

        async fn find(&self, slug: &str) -> Result<Option<StaticPost>, ContentError> {
            Ok(self.0.iter().find(|p| p.slug == slug).cloned())
        }
    }

    fn file(slug: &str) -> StaticPost {
        let (base, locale) = split_locale_suffix(slug);
        StaticPost {
            slug: slug.to_string(),
            base_slug: base.to_string(),
            locale: locale.unwrap_or(Locale::En),
            title: slug.to_string(),
            description: String::new(),
            published_at: datetime!(2024-09-10 0:00 UTC),
            tags: Vec::new(),
            author: None,
            cover_image: None,
            draft: false,
            body_markdown: String::new(),
            is_mdx: false,
        }
    }

    fn service(files: Vec<StaticPost>) -> SitemapService {
        let posts = HybridPostService::new(None, Arc::new(Files(files)), Locale::En, 10);
        SitemapService::new(Arc::new(posts), test_profile())
    }

    #[test]
    fn robots_points_at_sitemap() {
        insta::assert_snapshot!(service(Vec::new()).robots_txt(), @r"
        User-agent: *
        Allow: /
        Sitemap: https://example.com/sitemap.xml
        ");
    }

    #[tokio::test]
    async fn marketing_pages_exist_in_every_locale() {
        let xml = service(Vec::new()).sitemap_xml().await.expect("sitemap");

        assert!(xml.contains("<loc>https://example.com/services</loc>"));
        assert!(xml.contains("<loc>https://example.com/services?lang=ja</loc>"));
        assert!(xml.contains("<loc>https://example.com/services?lang=ar</loc>"));
        assert_eq!(xml.matches("<url>").count(), MARKETING_PATHS.len() * 3);
    }

    #[tokio::test]
    async fn translated_posts_link_to_each_other() {
        let xml = service(vec![file("guide"), file("guide-ar"), file("solo")])
            .sitemap_xml()
            .await
            .expect("sitemap");

        assert!(xml.contains("<loc>https://example.com/blog/guide-ar</loc>"));
        assert!(xml.contains("<lastmod>2024-09-10T00:00:00Z</lastmod>"));
        assert!(xml.contains(
            "<xhtml:link rel=\"alternate\" hreflang=\"ar\" href=\"https://example.com/blog/guide-ar\"/>"
        ));
        assert!(xml.contains(
            "<xhtml:link rel=\"alternate\" hreflang=\"x-default\" href=\"https://example.com/blog/guide\"/>"
        ));
        assert!(!xml.contains("href=\"https://example.com/blog/solo\""));
    }
}
