//! Page metadata: titles, canonical links, OpenGraph and hreflang alternates.

use serde_json::json;
use time::format_description::well_known::Rfc3339;

use crate::application::posts::ResolvedPost;
use crate::application::site::SiteProfile;
use crate::domain::locale::Locale;

const DEFAULT_OG_IMAGE: &str = "/static/public/og-default.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateLink {
    pub hreflang: String,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub og_type: &'static str,
    pub og_locale: &'static str,
    pub og_image: String,
    pub alternates: Vec<AlternateLink>,
    pub json_ld: Option<String>,
    pub noindex: bool,
}

impl PageMeta {
    pub fn robots(&self) -> &'static str {
        if self.noindex {
            "noindex, follow"
        } else {
            "index, follow"
        }
    }
}

fn compose_title(site: &SiteProfile, title: &str) -> String {
    if title.is_empty() || title == site.brand {
        site.brand.clone()
    } else {
        format!("{title} | {}", site.brand)
    }
}

/// Metadata for a page that exists in every locale under the same path.
pub fn page_meta(
    site: &SiteProfile,
    locale: Locale,
    path: &str,
    title: &str,
    description: &str,
) -> PageMeta {
    let mut alternates: Vec<AlternateLink> = Locale::ALL
        .into_iter()
        .map(|candidate| AlternateLink {
            hreflang: candidate.code().to_string(),
            href: site.localized_url(path, candidate),
        })
        .collect();
    alternates.push(AlternateLink {
        hreflang: "x-default".to_string(),
        href: site.localized_url(path, site.default_locale),
    });

    PageMeta {
        title: compose_title(site, title),
        description: description.to_string(),
        canonical: site.localized_url(path, locale),
        og_type: "website",
        og_locale: locale.og_locale(),
        og_image: site.absolute(DEFAULT_OG_IMAGE),
        alternates,
        json_ld: None,
        noindex: false,
    }
}

/// Metadata for a blog article, with `BlogPosting` structured data.
pub fn article_meta(site: &SiteProfile, resolved: &ResolvedPost) -> PageMeta {
    let post = &resolved.post;
    let canonical = site.absolute(&post.href(site.default_locale));

    let mut alternates: Vec<AlternateLink> = resolved
        .variants
        .iter()
        .map(|variant| AlternateLink {
            hreflang: variant.locale.code().to_string(),
            href: site.absolute(&variant.href),
        })
        .collect();
    let x_default = resolved
        .variants
        .iter()
        .find(|variant| variant.locale == site.default_locale)
        .or_else(|| resolved.variants.first());
    if let Some(variant) = x_default {
        alternates.push(AlternateLink {
            hreflang: "x-default".to_string(),
            href: site.absolute(&variant.href),
        });
    }

    let og_image = post
        .cover_image
        .as_deref()
        .map(|image| site.absolute(image))
        .unwrap_or_else(|| site.absolute(DEFAULT_OG_IMAGE));

    let published = post.published_at.format(&Rfc3339).unwrap_or_default();
    let modified = post
        .updated_at
        .and_then(|at| at.format(&Rfc3339).ok())
        .unwrap_or_else(|| published.clone());
    let author = post.author.clone().unwrap_or_else(|| site.brand.clone());

    let document = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.excerpt,
        "datePublished": published,
        "dateModified": modified,
        "inLanguage": post.locale.code(),
        "url": canonical,
        "image": og_image,
        "author": { "@type": "Person", "name": author },
        "publisher": { "@type": "Organization", "name": site.brand },
        "keywords": post.tags.join(", "),
    });

    PageMeta {
        title: compose_title(site, &post.title),
        description: post.excerpt.clone(),
        canonical,
        og_type: "article",
        og_locale: post.locale.og_locale(),
        og_image,
        alternates,
        json_ld: Some(script_safe_json(&document.to_string())),
        noindex: resolved.is_locale_fallback(),
    }
}

/// Escape `<` so JSON can sit inside a `<script>` element.
fn script_safe_json(raw: &str) -> String {
    raw.replace('<', "\\u003c")
}
