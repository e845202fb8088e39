//! HTTP Middleware
//!
//! 构造阶段安装、位于所有路由之前的中间件：
//! - HTTP 状态码错误日志
//! - 安全响应头
//! - CORS

use axum::{extract::Request, middleware::Next, response::Response, Router};
use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{CorsOptions, CorsPolicy};

/// HTTP 状态码错误日志中间件
///
/// 拦截 HTTP 响应，当状态码为 4xx 或 5xx 时记录日志
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "HTTP client error"
        );
    }

    response
}

/// 默认安全响应头，已存在的同名响应头不会被覆盖
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// 为 Router 附加安全响应头
pub fn with_security_headers(router: Router) -> Router {
    SECURITY_HEADERS
        .iter()
        .fold(router, |router, &(name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            ))
        })
}

/// CORS 默认允许的方法
const CORS_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// 根据策略构造 CORS 层
///
/// 显式策略按原样使用：未给出 origin 时允许任意来源（需要凭据时回显请求来源）
pub fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(CORS_METHODS)
        .allow_headers(AllowHeaders::mirror_request());

    match policy {
        CorsPolicy::AllowAll => base.allow_origin(AllowOrigin::any()),
        CorsPolicy::Explicit(options) => {
            let credentials = options.credentials.unwrap_or(false);
            base.allow_origin(allow_origin(options, credentials))
                .allow_credentials(credentials)
        }
    }
}

fn allow_origin(options: &CorsOptions, credentials: bool) -> AllowOrigin {
    let wildcard = || {
        if credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    };

    match &options.origin {
        None => wildcard(),
        Some(origins) if origins.iter().any(|origin| origin == "*") => wildcard(),
        Some(origins) => AllowOrigin::list(origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
        routing::get,
    };
    use tower::util::ServiceExt;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    async fn not_found_handler() -> StatusCode {
        StatusCode::NOT_FOUND
    }

    async fn error_handler() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    async fn framed_handler() -> ([(HeaderName, &'static str); 1], &'static str) {
        ([(HeaderName::from_static("x-frame-options"), "DENY")], "framed")
    }

    fn create_test_router() -> Router {
        Router::new()
            .route("/ok", get(ok_handler))
            .route("/not-found", get(not_found_handler))
            .route("/error", get(error_handler))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    fn get_request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_ok_response_no_log() {
        let response = create_test_router().oneshot(get_request("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_client_error_logs_warning() {
        let response = create_test_router()
            .oneshot(get_request("/not-found"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_error_logs_error() {
        let response = create_test_router()
            .oneshot(get_request("/error"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let app = with_security_headers(create_test_router());
        let response = app.oneshot(get_request("/ok")).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
    }

    #[tokio::test]
    async fn test_security_headers_do_not_override() {
        let app = with_security_headers(Router::new().route("/framed", get(framed_handler)));
        let response = app.oneshot(get_request("/framed")).await.unwrap();
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    }

    #[tokio::test]
    async fn test_cors_allow_all() {
        let app = create_test_router().layer(cors_layer(&CorsPolicy::AllowAll));
        let request = HttpRequest::builder()
            .uri("/ok")
            .header(header::ORIGIN, "https://anywhere.example")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_explicit_origin_with_credentials() {
        let policy = CorsPolicy::Explicit(CorsOptions {
            origin: Some(vec!["https://app.example.com".to_string()]),
            credentials: Some(true),
        });
        let app = create_test_router().layer(cors_layer(&policy));
        let request = HttpRequest::builder()
            .uri("/ok")
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_explicit_origin_rejects_other() {
        let policy = CorsPolicy::Explicit(CorsOptions {
            origin: Some(vec!["https://app.example.com".to_string()]),
            credentials: None,
        });
        let app = create_test_router().layer(cors_layer(&policy));
        let request = HttpRequest::builder()
            .uri("/ok")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
