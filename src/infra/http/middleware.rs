use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Instant,
};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::{error::ErrorReport, site::SiteProfile};

const FORWARDED_FOR: &str = "x-forwarded-for";
const GOOGLE_TAG_ORIGINS: &str = "https://www.googletagmanager.com";
const GOOGLE_ANALYTICS_ORIGINS: &str =
    "https://www.google-analytics.com https://*.google-analytics.com https://*.analytics.google.com";
const TURNSTILE_ORIGIN: &str = "https://challenges.cloudflare.com";
const HSTS_VALUE: &str = "max-age=63072000; includeSubDomains";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: Option<IpAddr>,
}

impl RequestContext {
    /// Key used for per-client throttling.
    pub fn client_key(&self) -> String {
        self.client_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
        client_ip: client_ip(&request),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Peer address, or the first `X-Forwarded-For` hop when the peer is a local proxy.
fn client_ip(request: &Request<Body>) -> Option<IpAddr> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let forwarded = request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());

    match peer {
        Some(ip) if ip.is_loopback() => forwarded.or(Some(ip)),
        Some(ip) => Some(ip),
        None => forwarded,
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "meridian::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "meridian::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}

/// Response headers applied to every page of one listener.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    content_security_policy: HeaderValue,
    hsts: bool,
}

impl SecurityPolicy {
    /// Public-site policy, widened for the analytics and CAPTCHA origins actually in use.
    pub fn public(site: &SiteProfile, hsts: bool) -> Self {
        let mut script_src = vec!["'self'"];
        let mut connect_src = vec!["'self'"];
        let mut frame_src = vec!["'none'"];

        if site.analytics_id.is_some() {
            script_src.push(GOOGLE_TAG_ORIGINS);
            connect_src.push(GOOGLE_ANALYTICS_ORIGINS);
        }
        if site.captcha_site_key.is_some() {
            script_src.push(TURNSTILE_ORIGIN);
            connect_src.push(TURNSTILE_ORIGIN);
            frame_src = vec![TURNSTILE_ORIGIN];
        }

        let policy = format!(
            "default-src 'self'; script-src {}; connect-src {}; frame-src {}; \
             img-src 'self' data: https:; style-src 'self'; font-src 'self'; \
             object-src 'none'; base-uri 'self'; form-action 'self'; frame-ancestors 'none'",
            script_src.join(" "),
            connect_src.join(" "),
            frame_src.join(" "),
        );

        Self::from_policy(&policy, hsts)
    }

    pub fn admin(hsts: bool) -> Self {
        Self::from_policy(
            "default-src 'self'; img-src 'self' data: https:; object-src 'none'; \
             base-uri 'self'; form-action 'self'; frame-ancestors 'none'",
            hsts,
        )
    }

    fn from_policy(policy: &str, hsts: bool) -> Self {
        Self {
            content_security_policy: HeaderValue::from_str(policy)
                .unwrap_or_else(|_| HeaderValue::from_static("default-src 'self'")),
            hsts,
        }
    }

    fn apply(&self, response: &mut Response) {
        let headers = response.headers_mut();
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        headers.insert(
            "permissions-policy",
            HeaderValue::from_static("camera=(), microphone=(), geolocation=(), payment=()"),
        );
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            self.content_security_policy.clone(),
        );
        if self.hsts {
            headers.insert(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(HSTS_VALUE),
            );
        }
    }
}

pub async fn security_headers(
    State(policy): State<Arc<SecurityPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    policy.apply(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::site::test_profile;

    fn csp(policy: &SecurityPolicy) -> &str {
        policy.content_security_policy.to_str().expect("ascii")
    }

    #[test]
    fn public_policy_stays_self_only_without_integrations() {
        let policy = SecurityPolicy::public(&test_profile(), false);
        assert!(csp(&policy).contains("script-src 'self';"));
        assert!(csp(&policy).contains("frame-src 'none';"));
        assert!(!csp(&policy).contains("googletagmanager"));
    }

    #[test]
    fn public_policy_allows_configured_integrations() {
        let site = SiteProfile {
            analytics_id: Some("G-1".to_string()),
            captcha_site_key: Some("key".to_string()),
            ..test_profile()
        };
        let policy = SecurityPolicy::public(&site, true);
        let value = csp(&policy);
        assert!(value.contains("script-src 'self' https://www.googletagmanager.com https://challenges.cloudflare.com;"));
        assert!(value.contains("frame-src https://challenges.cloudflare.com;"));
        assert!(policy.hsts);
    }

    #[test]
    fn forwarded_for_is_only_trusted_from_loopback_peers() {
        let build = |peer: &str| {
            let mut request = Request::builder()
                .header(FORWARDED_FOR, "203.0.113.9, 10.0.0.1")
                .body(Body::empty())
                .expect("request");
            let addr: SocketAddr = peer.parse().expect("addr");
            request.extensions_mut().insert(ConnectInfo(addr));
            client_ip(&request)
        };

        assert_eq!(build("127.0.0.1:9000"), "203.0.113.9".parse().ok());
        assert_eq!(build("198.51.100.4:9000"), "198.51.100.4".parse().ok());
    }
}
