//! Embedded static asset serving.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::Mime;
use sha2::{Digest, Sha256};

use crate::application::error::ErrorReport;

static STATIC_PUBLIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static/public");
static STATIC_ADMIN_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static/admin");

const CACHE_CONTROL: &str = "public, max-age=3600";

/// Serve embedded public static assets.
pub async fn serve_public(headers: HeaderMap, path: Option<Path<String>>) -> Response {
    serve_static(
        &STATIC_PUBLIC_ASSETS,
        &headers,
        path,
        "infra::assets::serve_public",
    )
}

/// Serve embedded admin static assets.
pub async fn serve_admin(headers: HeaderMap, path: Option<Path<String>>) -> Response {
    serve_static(
        &STATIC_ADMIN_ASSETS,
        &headers,
        path,
        "infra::assets::serve_admin",
    )
}

fn serve_static(
    bundle: &'static Dir<'static>,
    headers: &HeaderMap,
    path: Option<Path<String>>,
    source: &'static str,
) -> Response {
    let captured = path.map(|Path(value)| value).unwrap_or_default();
    let Some(asset) = resolve_asset(bundle, &captured) else {
        let mut response = StatusCode::NOT_FOUND.into_response();
        ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Static asset not found")
            .attach(&mut response);
        return response;
    };

    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());
    if if_none_match == Some(asset.etag.as_str()) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        insert_cache_headers(response.headers_mut(), &asset.etag);
        return response;
    }

    asset.into_response()
}

struct Asset {
    contents: &'static [u8],
    mime: Mime,
    etag: String,
}

fn resolve_asset(bundle: &'static Dir<'static>, path: &str) -> Option<Asset> {
    let candidate = path.trim_start_matches('/');
    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        return None;
    }

    let file = bundle.get_file(candidate)?;
    let contents = file.contents();
    Some(Asset {
        contents,
        mime: mime_guess::from_path(candidate).first_or_octet_stream(),
        etag: format!("\"{}\"", hex::encode(Sha256::digest(contents))),
    })
}

fn insert_cache_headers(headers: &mut HeaderMap, etag: &str) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, value);
    }
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        let bytes = Bytes::from_static(self.contents);
        let len = bytes.len();
        let mut response = Response::new(Body::from(bytes));

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(self.mime.as_ref()) {
            headers.insert(header::CONTENT_TYPE, value);
        }
        if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
            headers.insert(header::CONTENT_LENGTH, value);
        }
        insert_cache_headers(headers, &self.etag);

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_embedded_stylesheet() {
        let asset = resolve_asset(&STATIC_PUBLIC_ASSETS, "/site.css").expect("asset");
        assert_eq!(asset.mime.essence_str(), "text/css");
        assert!(asset.etag.starts_with('"') && asset.etag.len() == 66);
    }

    #[test]
    fn rejects_traversal_and_directories() {
        assert!(resolve_asset(&STATIC_PUBLIC_ASSETS, "../Cargo.toml").is_none());
        assert!(resolve_asset(&STATIC_PUBLIC_ASSETS, "").is_none());
        assert!(resolve_asset(&STATIC_PUBLIC_ASSETS, "nested/").is_none());
    }

    #[tokio::test]
    async fn matching_etag_returns_not_modified() {
        let etag = resolve_asset(&STATIC_PUBLIC_ASSETS, "site.css")
            .expect("asset")
            .etag;
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_str(&etag).expect("header"),
        );

        let response = serve_public(headers, Some(Path("site.css".to_string()))).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }
}
