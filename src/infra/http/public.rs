use std::sync::Arc;

use axum::{
    Extension, Form, Router,
    extract::{OriginalUri, Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_TYPE, RETRY_AFTER},
    },
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::warn;

use crate::{
    application::{
        contact::{ContactError, ContactService, ContactSubmission},
        error::{ErrorReport, HttpError},
        posts::{HybridPostService, PostQuery},
        render::markdown_renderer,
        seo::{article_meta, page_meta},
        site::SiteProfile,
        sitemap::SitemapService,
    },
    domain::{
        locale::{Locale, resolve, split_locale_suffix},
        types::CookieConsent,
    },
    infra::db::PostgresRepositories,
    presentation::{
        i18n,
        views::{
            AboutTemplate, AboutView, BlogIndexTemplate, BlogIndexView, ContactFieldError,
            ContactFormValues, ContactTemplate, ContactView, HomeTemplate, HomeView, LayoutChrome,
            LayoutContext, Notice, PostCard, PostTemplate, PostView, PrivacyTemplate, PrivacyView,
            ServicesTemplate, ServicesView, blog_href, render_not_found_response,
            render_server_error_response, render_template_response, service_cards,
        },
    },
};

use super::{
    db_health_response,
    middleware::{
        RequestContext, SecurityPolicy, log_responses, security_headers, set_request_context,
    },
    rate_limit::{ContactRateLimiter, RateDecision},
};

pub const CONSENT_COOKIE: &str = "cookie_consent";
const CONSENT_MAX_AGE_DAYS: i64 = 365;
const HOME_LATEST_POSTS: usize = 3;

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<HybridPostService>,
    pub sitemap: Arc<SitemapService>,
    pub contact: Arc<ContactService>,
    pub limiter: ContactRateLimiter,
    pub site: Arc<SiteProfile>,
    pub security: Arc<SecurityPolicy>,
    pub db: Option<Arc<PostgresRepositories>>,
}

pub fn build_router(state: HttpState) -> Router {
    let security = state.security.clone();

    Router::new()
        .route("/", get(home))
        .route("/services", get(services))
        .route("/about", get(about))
        .route("/privacy", get(privacy))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(post_detail))
        .route("/contact", get(contact_page).post(contact_submit))
        .route("/consent", post(record_consent))
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots_txt))
        .route("/_health/db", get(public_health))
        .route(
            "/static/public/{*path}",
            get(crate::infra::assets::serve_public),
        )
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn_with_state(security, security_headers))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LangQuery {
    lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BlogQuery {
    lang: Option<String>,
    tag: Option<String>,
    page: Option<String>,
}

impl HttpState {
    fn locale(&self, lang: Option<&str>) -> Locale {
        resolve(lang, self.site.default_locale)
    }

    fn chrome(
        &self,
        locale: Locale,
        path: &str,
        title_key: &str,
        description_key: &str,
        jar: &CookieJar,
    ) -> LayoutChrome {
        let meta = page_meta(
            &self.site,
            locale,
            path,
            i18n::t(locale, title_key),
            i18n::t(locale, description_key),
        );
        LayoutChrome::new(&self.site, locale, path, meta, consent_from(jar))
    }
}

fn consent_from(jar: &CookieJar) -> Option<CookieConsent> {
    jar.get(CONSENT_COOKIE)
        .and_then(|cookie| CookieConsent::parse(cookie.value()))
}

async fn home(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
    jar: CookieJar,
) -> Response {
    let locale = state.locale(query.lang.as_deref());
    let chrome = state.chrome(locale, "/", "home.title", "home.description", &jar);

    let latest = match state.posts.latest(locale, HOME_LATEST_POSTS).await {
        Ok(posts) => posts,
        Err(err) => {
            warn!(
                target = "meridian::http::public",
                error = %err,
                "Rendering home page without latest posts"
            );
            Vec::new()
        }
    };

    let content = HomeView {
        services: service_cards(locale).into_iter().take(3).collect(),
        latest: latest
            .iter()
            .map(|post| PostCard::from_post(&state.site, locale, post))
            .collect(),
        blog_href: state.site.link("/blog", locale),
        services_href: state.site.link("/services", locale),
        contact_href: state.site.link("/contact", locale),
    };
    let view = LayoutContext::new(chrome, content);
    render_template_response(HomeTemplate { view }, StatusCode::OK)
}

async fn services(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
    jar: CookieJar,
) -> Response {
    let locale = state.locale(query.lang.as_deref());
    let chrome = state.chrome(
        locale,
        "/services",
        "services.title",
        "services.description",
        &jar,
    );
    let content = ServicesView {
        services: service_cards(locale),
        contact_href: state.site.link("/contact", locale),
    };
    let view = LayoutContext::new(chrome, content);
    render_template_response(ServicesTemplate { view }, StatusCode::OK)
}

async fn about(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
    jar: CookieJar,
) -> Response {
    let locale = state.locale(query.lang.as_deref());
    let chrome = state.chrome(locale, "/about", "about.title", "about.description", &jar);
    let content = AboutView {
        values: vec![
            i18n::t(locale, "about.value.quality"),
            i18n::t(locale, "about.value.transparency"),
            i18n::t(locale, "about.value.partnership"),
        ],
        contact_href: state.site.link("/contact", locale),
    };
    let view = LayoutContext::new(chrome, content);
    render_template_response(AboutTemplate { view }, StatusCode::OK)
}

async fn privacy(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
    jar: CookieJar,
) -> Response {
    let locale = state.locale(query.lang.as_deref());
    let chrome = state.chrome(
        locale,
        "/privacy",
        "privacy.title",
        "privacy.description",
        &jar,
    );
    let content = PrivacyView {
        contact_href: state.site.link("/contact", locale),
    };
    let view = LayoutContext::new(chrome, content);
    render_template_response(PrivacyTemplate { view }, StatusCode::OK)
}

async fn blog_index(
    State(state): State<HttpState>,
    Query(query): Query<BlogQuery>,
    jar: CookieJar,
) -> Response {
    let locale = state.locale(query.lang.as_deref());
    let page = query
        .page
        .as_deref()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(1);
    let tag = query
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|tag| !tag.is_empty());

    // Path without `lang`, so chrome links can append it per locale.
    let path = blog_href(&state.site, state.site.default_locale, tag, page);
    let chrome = state.chrome(locale, &path, "blog.title", "blog.description", &jar);

    let listing = state
        .posts
        .listing(&PostQuery {
            locale,
            tag: tag.map(str::to_string),
            page,
        })
        .await;

    match listing {
        Ok(listing) => {
            let content = BlogIndexView::from_listing(&state.site, locale, &listing);
            let view = LayoutContext::new(chrome, content);
            render_template_response(BlogIndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => render_server_error_response(chrome, err.into()),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<LangQuery>,
    jar: CookieJar,
) -> Response {
    let lang = query.lang.as_deref().and_then(Locale::parse);
    let requested = split_locale_suffix(&slug)
        .1
        .or(lang)
        .unwrap_or(state.site.default_locale);
    let path = format!("/blog/{slug}");

    match state.posts.resolve(&slug, lang).await {
        Some(resolved) => {
            let body = markdown_renderer().render(&resolved.post.body_markdown, resolved.post.is_mdx);
            let meta = article_meta(&state.site, &resolved);
            let chrome = LayoutChrome::new(
                &state.site,
                resolved.requested_locale,
                &path,
                meta,
                consent_from(&jar),
            )
            .with_variants(&resolved.variants);
            let content = PostView::new(&state.site, &resolved, body);
            let view = LayoutContext::new(chrome, content);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        None => not_found(&state, requested, &path, &jar),
    }
}

fn not_found(state: &HttpState, locale: Locale, path: &str, jar: &CookieJar) -> Response {
    let mut chrome = state.chrome(
        locale,
        path,
        "error.not_found_title",
        "error.not_found_body",
        jar,
    );
    chrome.meta.noindex = true;
    render_not_found_response(chrome)
}

async fn fallback(
    State(state): State<HttpState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<LangQuery>,
    jar: CookieJar,
) -> Response {
    let locale = state.locale(query.lang.as_deref());
    not_found(&state, locale, uri.path(), &jar)
}

fn contact_view(state: &HttpState) -> ContactView {
    ContactView {
        action: "/contact".to_string(),
        values: ContactFormValues::default(),
        errors: Vec::new(),
        notice: None,
        available: state.contact.is_available(),
        captcha_site_key: state
            .contact
            .captcha_enabled()
            .then(|| state.site.captcha_site_key.clone())
            .flatten(),
    }
}

async fn contact_page(
    State(state): State<HttpState>,
    Query(query): Query<LangQuery>,
    jar: CookieJar,
) -> Response {
    let locale = state.locale(query.lang.as_deref());
    let chrome = state.chrome(
        locale,
        "/contact",
        "contact.title",
        "contact.description",
        &jar,
    );

    let mut content = contact_view(&state);
    if !content.available {
        content.notice = Some(Notice::error(i18n::t(locale, "contact.unavailable")));
    }
    let view = LayoutContext::new(chrome, content);
    render_template_response(ContactTemplate { view }, StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContactForm {
    name: String,
    email: String,
    company: String,
    message: String,
    lang: Option<String>,
    website: String,
    #[serde(rename = "cf-turnstile-response")]
    captcha_token: String,
}

async fn contact_submit(
    State(state): State<HttpState>,
    Extension(ctx): Extension<RequestContext>,
    jar: CookieJar,
    Form(form): Form<ContactForm>,
) -> Response {
    const SOURCE: &str = "infra::http::public::contact_submit";

    let locale = state.locale(form.lang.as_deref());
    let chrome = state.chrome(
        locale,
        "/contact",
        "contact.title",
        "contact.description",
        &jar,
    );
    let mut content = contact_view(&state);
    content.values = ContactFormValues {
        name: form.name.clone(),
        email: form.email.clone(),
        company: form.company.clone(),
        message: form.message.clone(),
    };

    if let RateDecision::Limited { retry_after } = state.limiter.check(&ctx.client_key()) {
        content.notice = Some(Notice::error(i18n::t(locale, "contact.rate_limited")));
        let view = LayoutContext::new(chrome, content);
        let mut response =
            render_template_response(ContactTemplate { view }, StatusCode::TOO_MANY_REQUESTS);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after.as_secs()));
        ErrorReport::from_message(SOURCE, StatusCode::TOO_MANY_REQUESTS, "contact rate limit")
            .attach(&mut response);
        return response;
    }

    let submission = ContactSubmission {
        name: form.name,
        email: form.email,
        company: Some(form.company),
        message: form.message,
        locale,
        honeypot: Some(form.website),
        captcha_token: Some(form.captcha_token).filter(|token| !token.trim().is_empty()),
        client_ip: ctx.client_ip.map(|ip| ip.to_string()),
    };

    let (status, failure) = match state.contact.submit(submission).await {
        Ok(_) => {
            content.values = ContactFormValues::default();
            content.notice = Some(Notice::success(i18n::t(locale, "contact.success")));
            (StatusCode::OK, None)
        }
        Err(ContactError::Invalid(errors)) => {
            content.errors = errors
                .iter()
                .map(|error| ContactFieldError {
                    field: error.field.as_str(),
                    message: i18n::t(locale, error.code),
                })
                .collect();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(ContactError::Invalid(errors)),
            )
        }
        Err(err) => {
            let key = match err {
                ContactError::CaptchaUnavailable => "contact.captcha_unavailable",
                ContactError::NotConfigured => "contact.unavailable",
                _ => "contact.failed",
            };
            content.notice = Some(Notice::error(i18n::t(locale, key)));
            (StatusCode::SERVICE_UNAVAILABLE, Some(err))
        }
    };

    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ContactTemplate { view }, status);
    if let Some(err) = failure {
        ErrorReport::from_error(SOURCE, status, &err).attach(&mut response);
    }
    response
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConsentForm {
    choice: String,
    return_to: Option<String>,
}

async fn record_consent(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<ConsentForm>,
) -> Result<(CookieJar, Redirect), HttpError> {
    let consent = CookieConsent::parse(form.choice.trim()).ok_or_else(|| {
        HttpError::new(
            "infra::http::public::record_consent",
            StatusCode::BAD_REQUEST,
            "Unknown consent choice",
            format!("choice `{}` is not recognised", form.choice),
        )
    })?;

    let cookie = Cookie::build((CONSENT_COOKIE, consent.as_str()))
        .path("/")
        .max_age(time::Duration::days(CONSENT_MAX_AGE_DAYS))
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(state.site.public_url.starts_with("https://"))
        .build();

    let target = safe_return_to(form.return_to.as_deref());
    Ok((jar.add(cookie), Redirect::to(&target)))
}

/// Only same-site relative paths are followed after recording consent.
fn safe_return_to(candidate: Option<&str>) -> String {
    match candidate.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

async fn sitemap(State(state): State<HttpState>) -> Response {
    match state.sitemap.sitemap_xml().await {
        Ok(xml) => (
            [(CONTENT_TYPE, HeaderValue::from_static("application/xml; charset=utf-8"))],
            xml,
        )
            .into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn robots_txt(State(state): State<HttpState>) -> Response {
    (
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        state.sitemap.robots_txt(),
    )
        .into_response()
}

async fn public_health(State(state): State<HttpState>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_message(
                "infra::http::public::public_health",
                StatusCode::SERVICE_UNAVAILABLE,
                "database not configured",
            )
            .attach(&mut response);
            response
        }
    }
}
