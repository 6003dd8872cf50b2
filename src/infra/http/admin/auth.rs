//! HTTP Basic authentication for the admin listener.
//!
//! Any username is accepted and recorded as the audit actor; the password must
//! match the configured admin token.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::application::error::ErrorReport;

const REALM: &str = "Basic realm=\"Meridian admin\", charset=\"UTF-8\"";
const DEFAULT_ACTOR: &str = "admin";

/// Digest of the admin token; the token itself is not retained.
pub struct AdminCredentials {
    token_digest: Vec<u8>,
}

impl AdminCredentials {
    pub fn new(token: &str) -> Self {
        Self {
            token_digest: Sha256::digest(token.as_bytes()).to_vec(),
        }
    }

    fn verify(&self, password: &str) -> bool {
        let candidate = Sha256::digest(password.as_bytes());
        bool::from(candidate[..].ct_eq(&self.token_digest[..]))
    }
}

/// Authenticated operator, available to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct AdminActor(pub String);

pub async fn require_basic_auth(
    State(credentials): State<Arc<AdminCredentials>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_basic);

    match presented {
        Some((user, password)) if credentials.verify(&password) => {
            let actor = if user.trim().is_empty() {
                DEFAULT_ACTOR.to_string()
            } else {
                user.trim().to_string()
            };
            request.extensions_mut().insert(AdminActor(actor));
            next.run(request).await
        }
        Some((user, _)) => {
            warn!(
                target = "meridian::http::admin",
                user = %user,
                "Rejected admin credentials"
            );
            unauthorized("invalid admin credentials")
        }
        None => unauthorized("missing admin credentials"),
    }
}

fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

fn unauthorized(detail: &'static str) -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
    ErrorReport::from_message(
        "infra::http::admin::auth",
        StatusCode::UNAUTHORIZED,
        detail,
    )
    .attach(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_header() {
        let header = format!("Basic {}", STANDARD.encode("editor:s3cret:with-colon"));
        assert_eq!(
            parse_basic(&header),
            Some(("editor".to_string(), "s3cret:with-colon".to_string()))
        );
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic !!!"), None);
    }

    #[test]
    fn verifies_only_the_configured_token() {
        let credentials = AdminCredentials::new("token-123");
        assert!(credentials.verify("token-123"));
        assert!(!credentials.verify("token-124"));
        assert!(!credentials.verify(""));
    }
}
