use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Page;
use crate::application::posts::{LanguageVariant, PostListing, ResolvedPost};
use crate::application::render::{RenderedBody, reading_minutes};
use crate::application::seo::PageMeta;
use crate::application::site::SiteProfile;
use crate::domain::{
    locale::{Locale, with_lang},
    posts::HybridPost,
    types::CookieConsent,
};
use crate::presentation::i18n;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView::not_found(&chrome);
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Localized error page carrying the original failure report.
pub fn render_server_error_response(chrome: LayoutChrome, error: HttpError) -> Response {
    let content = ErrorPageView::server_error(&chrome);
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, error.status());
    error.attach_report(&mut response);
    response
}

#[derive(Clone)]
pub struct NavLink {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Clone)]
pub struct LanguageLink {
    pub code: &'static str,
    pub name: &'static str,
    pub href: String,
    pub active: bool,
}

const NAVIGATION: [(&str, &str); 5] = [
    ("/", "nav.home"),
    ("/services", "nav.services"),
    ("/about", "nav.about"),
    ("/blog", "nav.blog"),
    ("/contact", "nav.contact"),
];

/// Everything the base layout needs besides the page body.
#[derive(Clone)]
pub struct LayoutChrome {
    pub locale: Locale,
    pub lang: &'static str,
    pub dir: &'static str,
    pub brand: String,
    pub home_href: String,
    pub privacy_href: String,
    pub nav: Vec<NavLink>,
    pub languages: Vec<LanguageLink>,
    pub meta: PageMeta,
    pub consent: Option<CookieConsent>,
    pub return_to: String,
    pub analytics_id: Option<String>,
    pub year: i32,
}

impl LayoutChrome {
    /// Chrome for `path`, which may already carry query parameters other than `lang`.
    pub fn new(
        site: &SiteProfile,
        locale: Locale,
        path: &str,
        meta: PageMeta,
        consent: Option<CookieConsent>,
    ) -> Self {
        let section = path.split('?').next().unwrap_or("/");
        let nav = NAVIGATION
            .iter()
            .map(|&(href, key)| NavLink {
                href: site.link(href, locale),
                label: i18n::t(locale, key),
                active: is_active_section(section, href),
            })
            .collect();

        let languages = Locale::ALL
            .into_iter()
            .map(|candidate| LanguageLink {
                code: candidate.code(),
                name: candidate.native_name(),
                href: site.link(path, candidate),
                active: candidate == locale,
            })
            .collect();

        Self {
            locale,
            lang: locale.code(),
            dir: locale.direction(),
            brand: site.brand.clone(),
            home_href: site.link("/", locale),
            privacy_href: site.link("/privacy", locale),
            nav,
            languages,
            meta,
            consent,
            return_to: site.link(path, locale),
            analytics_id: site.analytics_id.clone(),
            year: OffsetDateTime::now_utc().year(),
        }
    }

    /// Replace the language switcher with links to concrete article versions.
    pub fn with_variants(self, variants: &[LanguageVariant]) -> Self {
        let languages = variants
            .iter()
            .map(|variant| LanguageLink {
                code: variant.locale.code(),
                name: variant.locale.native_name(),
                href: variant.href.clone(),
                active: variant.locale == self.locale,
            })
            .collect();
        Self { languages, ..self }
    }

    pub fn show_cookie_banner(&self) -> bool {
        self.consent.is_none()
    }

    /// Measurement id, present only once the visitor accepted analytics.
    pub fn analytics_tag(&self) -> Option<&str> {
        match self.consent {
            Some(CookieConsent::Accepted) => self.analytics_id.as_deref(),
            _ => None,
        }
    }
}

fn is_active_section(current: &str, href: &str) -> bool {
    if href == "/" {
        current == "/"
    } else {
        current == href || current.starts_with(&format!("{href}/"))
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub chrome: LayoutChrome,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self { chrome, content }
    }

    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        i18n::t(self.chrome.locale, key)
    }
}

#[derive(Clone)]
pub struct ServiceCard {
    pub title: &'static str,
    pub body: &'static str,
}

const SERVICES: [(&str, &str); 6] = [
    ("service.cloud.title", "service.cloud.body"),
    ("service.data.title", "service.data.body"),
    ("service.security.title", "service.security.body"),
    ("service.web.title", "service.web.body"),
    ("service.ai.title", "service.ai.body"),
    ("service.support.title", "service.support.body"),
];

pub fn service_cards(locale: Locale) -> Vec<ServiceCard> {
    SERVICES
        .iter()
        .map(|&(title, body)| ServiceCard {
            title: i18n::t(locale, title),
            body: i18n::t(locale, body),
        })
        .collect()
}

#[derive(Clone)]
pub struct TagLink {
    pub label: String,
    pub href: String,
    pub count: usize,
    pub active: bool,
}

#[derive(Clone)]
pub struct PostCard {
    pub href: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub reading_minutes: u32,
    pub lang: &'static str,
    pub dir: &'static str,
    pub cover_image: Option<String>,
    pub tags: Vec<TagLink>,
}

impl PostCard {
    pub fn from_post(site: &SiteProfile, locale: Locale, post: &HybridPost) -> Self {
        Self {
            href: post.href(site.default_locale),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            date: post.published_date_label(),
            reading_minutes: reading_minutes(&post.body_markdown),
            lang: post.locale.code(),
            dir: post.locale.direction(),
            cover_image: post.cover_image.clone(),
            tags: post
                .tags
                .iter()
                .map(|tag| TagLink {
                    label: tag.clone(),
                    href: blog_href(site, locale, Some(tag), 1),
                    count: 0,
                    active: false,
                })
                .collect(),
        }
    }
}

/// `/blog` link preserving tag and page, with `lang` appended last.
pub fn blog_href(site: &SiteProfile, locale: Locale, tag: Option<&str>, page: usize) -> String {
    let mut params: Vec<String> = Vec::new();
    if let Some(tag) = tag {
        params.push(format!("tag={}", query_escape(tag)));
    }
    if page > 1 {
        params.push(format!("page={page}"));
    }
    let path = if params.is_empty() {
        "/blog".to_string()
    } else {
        format!("/blog?{}", params.join("&"))
    };
    with_lang(&path, locale, site.default_locale)
}

fn query_escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[derive(Clone)]
pub struct HomeView {
    pub services: Vec<ServiceCard>,
    pub latest: Vec<PostCard>,
    pub blog_href: String,
    pub services_href: String,
    pub contact_href: String,
}

#[derive(Clone)]
pub struct ServicesView {
    pub services: Vec<ServiceCard>,
    pub contact_href: String,
}

#[derive(Clone)]
pub struct AboutView {
    pub values: Vec<&'static str>,
    pub contact_href: String,
}

#[derive(Clone)]
pub struct PrivacyView {
    pub contact_href: String,
}

#[derive(Clone)]
pub struct BlogIndexView {
    pub posts: Vec<PostCard>,
    pub tags: Vec<TagLink>,
    pub all_tags_href: String,
    pub filtered: bool,
    pub page: usize,
    pub total_pages: usize,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl BlogIndexView {
    pub fn from_listing(site: &SiteProfile, locale: Locale, listing: &PostListing) -> Self {
        let active = listing.active_tag.as_deref();
        let Page {
            items,
            page,
            total_pages,
            ..
        } = &listing.page;

        Self {
            posts: items
                .iter()
                .map(|post| PostCard::from_post(site, locale, post))
                .collect(),
            tags: listing
                .tags
                .iter()
                .map(|tag| TagLink {
                    label: tag.name.clone(),
                    href: blog_href(site, locale, Some(&tag.name), 1),
                    count: tag.count,
                    active: active == Some(tag.name.as_str()),
                })
                .collect(),
            all_tags_href: blog_href(site, locale, None, 1),
            filtered: active.is_some(),
            page: *page,
            total_pages: *total_pages,
            previous_href: listing
                .page
                .has_previous()
                .then(|| blog_href(site, locale, active, page - 1)),
            next_href: listing
                .page
                .has_next()
                .then(|| blog_href(site, locale, active, page + 1)),
        }
    }
}

#[derive(Clone)]
pub struct PostView {
    pub title: String,
    pub html: String,
    pub date: String,
    pub author: Option<String>,
    pub cover_image: Option<String>,
    pub reading_minutes: u32,
    pub tags: Vec<TagLink>,
    pub lang: &'static str,
    pub dir: &'static str,
    pub fallback_notice: bool,
    pub variants: Vec<LanguageLink>,
    pub back_href: String,
}

impl PostView {
    pub fn new(
        site: &SiteProfile,
        resolved: &ResolvedPost,
        body: RenderedBody,
    ) -> Self {
        let locale = resolved.requested_locale;
        let post = &resolved.post;
        let card = PostCard::from_post(site, locale, post);

        Self {
            title: post.title.clone(),
            html: body.html,
            date: card.date,
            author: post.author.clone(),
            cover_image: post.cover_image.clone(),
            reading_minutes: body.reading_minutes,
            tags: card.tags,
            lang: post.locale.code(),
            dir: post.locale.direction(),
            fallback_notice: resolved.is_locale_fallback(),
            variants: resolved
                .variants
                .iter()
                .filter(|variant| variant.locale != post.locale)
                .map(|variant| LanguageLink {
                    code: variant.locale.code(),
                    name: variant.locale.native_name(),
                    href: variant.href.clone(),
                    active: false,
                })
                .collect(),
            back_href: blog_href(site, locale, None, 1),
        }
    }
}

#[derive(Clone, Default)]
pub struct ContactFormValues {
    pub name: String,
    pub email: String,
    pub company: String,
    pub message: String,
}

#[derive(Clone)]
pub struct ContactFieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Clone)]
pub struct Notice {
    pub kind: &'static str,
    pub text: &'static str,
}

impl Notice {
    pub fn success(text: &'static str) -> Self {
        Self {
            kind: "success",
            text,
        }
    }

    pub fn error(text: &'static str) -> Self {
        Self {
            kind: "error",
            text,
        }
    }
}

#[derive(Clone)]
pub struct ContactView {
    pub action: String,
    pub values: ContactFormValues,
    pub errors: Vec<ContactFieldError>,
    pub notice: Option<Notice>,
    pub available: bool,
    pub captcha_site_key: Option<String>,
}

impl ContactView {
    pub fn error_for(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }
}

#[derive(Clone)]
pub struct ErrorPageView {
    pub title: &'static str,
    pub body: &'static str,
    pub home_href: String,
    pub home_label: &'static str,
}

impl ErrorPageView {
    pub fn not_found(chrome: &LayoutChrome) -> Self {
        Self {
            title: i18n::t(chrome.locale, "error.not_found_title"),
            body: i18n::t(chrome.locale, "error.not_found_body"),
            home_href: chrome.home_href.clone(),
            home_label: i18n::t(chrome.locale, "error.home_link"),
        }
    }

    pub fn server_error(chrome: &LayoutChrome) -> Self {
        Self {
            title: i18n::t(chrome.locale, "error.server_title"),
            body: i18n::t(chrome.locale, "error.server_body"),
            home_href: chrome.home_href.clone(),
            home_label: i18n::t(chrome.locale, "error.home_link"),
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<HomeView>,
}

#[derive(Template)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub view: LayoutContext<ServicesView>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<AboutView>,
}

#[derive(Template)]
#[template(path = "privacy.html")]
pub struct PrivacyTemplate {
    pub view: LayoutContext<PrivacyView>,
}

#[derive(Template)]
#[template(path = "blog_index.html")]
pub struct BlogIndexTemplate {
    pub view: LayoutContext<BlogIndexView>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostView>,
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub view: LayoutContext<ContactView>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
