mod support;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use meridian::{domain::locale::Locale, infra::http::build_router};
use tempfile::TempDir;
use tower::ServiceExt;

use support::{MemoryStore, body_to_string, http_state, published_post, write_post};

fn content_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_post(dir.path(), "edge-cache.mdx", "Edge caching notes", "2025-02-01");
    write_post(dir.path(), "edge-cache-ja.mdx", "エッジキャッシュのメモ", "2025-02-01");
    write_post(dir.path(), "hello.md", "Hello static", "2025-01-10");
    dir
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, header::HeaderMap, String) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    (status, headers, body_to_string(response.into_body()).await)
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn localized_suffix_serves_static_translation() {
    let dir = content_dir();
    let router = build_router(http_state(dir.path(), None, 5));

    let (status, _, body) = get(router, "/blog/edge-cache-ja").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<html lang=\"ja\""));
    assert!(body.contains("エッジキャッシュのメモ"));
    assert!(body.contains("hreflang=\"en\""));
}

#[tokio::test]
async fn lang_query_falls_back_to_english_with_notice() {
    let dir = content_dir();
    let router = build_router(http_state(dir.path(), None, 5));

    let (status, _, body) = get(router, "/blog/hello?lang=ar").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("dir=\"rtl\""));
    assert!(body.contains("Hello static"));
    assert!(body.contains("noindex"));
}

#[tokio::test]
async fn broken_translation_file_falls_back_to_base_post() {
    let dir = content_dir();
    std::fs::write(dir.path().join("hello-ja.md"), "---\ntitle: [unclosed\n---\n")
        .expect("write broken post");
    let router = build_router(http_state(dir.path(), None, 5));

    let (status, _, body) = get(router.clone(), "/blog/hello?lang=ja").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hello static"));
    assert!(body.contains("noindex"));

    let (status, _, body) = get(router, "/blog").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hello static"));
}

#[tokio::test]
async fn database_post_wins_over_static_file() {
    let dir = content_dir();
    let store = MemoryStore::with_posts(vec![published_post(
        Locale::En,
        "edge-cache",
        "Edge caching, revised",
    )]);
    let router = build_router(http_state(dir.path(), Some(store), 5));

    let (status, _, body) = get(router.clone(), "/blog/edge-cache").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Edge caching, revised"));
    assert!(!body.contains("Edge caching notes"));

    let (_, _, listing) = get(router, "/blog").await;
    assert_eq!(listing.matches("/blog/edge-cache\"").count(), 1);
}

#[tokio::test]
async fn database_outage_falls_back_to_static_posts() {
    let dir = content_dir();
    let store = MemoryStore::with_posts(vec![published_post(
        Locale::En,
        "edge-cache",
        "Edge caching, revised",
    )]);
    store.go_offline();
    let router = build_router(http_state(dir.path(), Some(store), 5));

    let (status, _, body) = get(router.clone(), "/blog/edge-cache").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Edge caching notes"));

    let (status, _, listing) = get(router, "/blog").await;
    assert_eq!(status, StatusCode::OK);
    assert!(listing.contains("Hello static"));
}

#[tokio::test]
async fn unknown_pages_render_localized_not_found() {
    let dir = content_dir();
    let router = build_router(http_state(dir.path(), None, 5));

    let (status, _, body) = get(router.clone(), "/blog/missing-post-ja").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("<html lang=\"ja\""));
    assert!(body.contains("noindex"));

    let (status, _, body) = get(router, "/no/such/page?lang=ar").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("dir=\"rtl\""));
}

#[tokio::test]
async fn pages_carry_security_headers() {
    let dir = content_dir();
    let router = build_router(http_state(dir.path(), None, 5));

    let (status, headers, _) = get(router, "/services?lang=ja").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn contact_submission_is_stored() {
    let dir = content_dir();
    let store = MemoryStore::with_posts(Vec::new());
    let router = build_router(http_state(dir.path(), Some(store.clone()), 5));

    let response = router
        .oneshot(form_post(
            "/contact",
            "name=Aiko&email=aiko%40example.com&company=&message=We+need+a+migration+plan.&lang=ja&website=",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let messages = store.messages.lock().expect("lock");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].locale, Locale::Ja);
    assert_eq!(messages[0].company, None);
}

#[tokio::test]
async fn contact_validation_errors_return_422() {
    let dir = content_dir();
    let store = MemoryStore::with_posts(Vec::new());
    let router = build_router(http_state(dir.path(), Some(store.clone()), 5));

    let response = router
        .oneshot(form_post("/contact", "name=&email=nope&message=short"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_to_string(response.into_body()).await;
    assert!(body.contains("value=\"nope\""));
    assert!(store.messages.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn honeypot_submissions_look_successful_but_are_dropped() {
    let dir = content_dir();
    let store = MemoryStore::with_posts(Vec::new());
    let router = build_router(http_state(dir.path(), Some(store.clone()), 5));

    let response = router
        .oneshot(form_post(
            "/contact",
            "name=Bot&email=bot%40example.com&message=Buy+cheap+things+now&website=http%3A%2F%2Fspam",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.messages.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn contact_without_any_sink_is_unavailable() {
    let dir = content_dir();
    let router = build_router(http_state(dir.path(), None, 5));

    let response = router
        .oneshot(form_post(
            "/contact",
            "name=Aiko&email=aiko%40example.com&message=We+need+a+migration+plan.",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn contact_rate_limit_returns_429() {
    let dir = content_dir();
    let store = MemoryStore::with_posts(Vec::new());
    let router = build_router(http_state(dir.path(), Some(store), 1));
    let body = "name=Aiko&email=aiko%40example.com&message=We+need+a+migration+plan.";

    let first = router
        .clone()
        .oneshot(form_post("/contact", body))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::OK);

    let second = router
        .oneshot(form_post("/contact", body))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn consent_sets_cookie_and_redirects_back() {
    let dir = content_dir();
    let router = build_router(http_state(dir.path(), None, 5));

    let response = router
        .clone()
        .oneshot(form_post(
            "/consent",
            "choice=accepted&return_to=%2Fblog%3Flang%3Dja",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/blog?lang=ja");
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .expect("ascii");
    assert!(cookie.starts_with("cookie_consent=accepted"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Secure"));

    let response = router
        .oneshot(form_post("/consent", "choice=maybe"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sitemap_lists_posts_with_language_alternates() {
    let dir = content_dir();
    let router = build_router(http_state(dir.path(), None, 5));

    let (status, headers, body) = get(router.clone(), "/sitemap.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .expect("ascii")
            .starts_with("application/xml")
    );
    assert!(body.contains("<loc>https://meridian.test/blog/edge-cache</loc>"));
    assert!(body.contains("hreflang=\"ja\" href=\"https://meridian.test/blog/edge-cache-ja\""));

    let (status, _, robots) = get(router, "/robots.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert!(robots.contains("Sitemap: https://meridian.test/sitemap.xml"));
}

#[tokio::test]
async fn sitemap_links_database_translation_to_static_original() {
    let dir = content_dir();
    let store = MemoryStore::with_posts(vec![published_post(
        Locale::Ja,
        "hello",
        "こんにちは",
    )]);
    let router = build_router(http_state(dir.path(), Some(store), 5));

    let (status, _, body) = get(router, "/sitemap.xml").await;
    assert_eq!(status, StatusCode::OK);

    let entry_for = |loc: &str| {
        body.split("<url>")
            .find(|entry| entry.contains(&format!("<loc>{loc}</loc>")))
            .map(str::to_string)
            .expect("sitemap entry")
    };
    let english = entry_for("https://meridian.test/blog/hello");
    assert!(english.contains("hreflang=\"ja\" href=\"https://meridian.test/blog/hello?lang=ja\""));
    let japanese = entry_for("https://meridian.test/blog/hello?lang=ja");
    assert!(japanese.contains("hreflang=\"en\" href=\"https://meridian.test/blog/hello\""));
    assert!(japanese.contains("hreflang=\"x-default\" href=\"https://meridian.test/blog/hello\""));
}

#[tokio::test]
async fn health_without_database_is_unavailable() {
    let dir = content_dir();
    let router = build_router(http_state(dir.path(), None, 5));

    let (status, _, _) = get(router, "/_health/db").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
