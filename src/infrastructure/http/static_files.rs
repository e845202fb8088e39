//! Static Files
//!
//! 在路径前缀下托管目录中的静态文件。只处理 GET/HEAD，文件不存在时交给后续处理。

use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tower::util::ServiceExt;
use tower_http::services::ServeDir;

use super::action::strip_mount;
use super::error::RouteResult;

/// 创建目录服务
pub fn serve_dir(dir: impl AsRef<std::path::Path>) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(false)
}

/// 尝试用目录中的文件响应请求
pub async fn serve(serve_dir: ServeDir, mount: &str, request: Request, next: Next) -> RouteResult {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return Ok(next.run(request).await);
    }
    let Some(path) = strip_mount(mount, request.uri().path()) else {
        return Ok(next.run(request).await);
    };

    let path = if path.ends_with('/') {
        format!("{}index.html", path)
    } else {
        path.to_string()
    };
    let uri = match request.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };

    let mut lookup = Request::builder()
        .method(request.method().clone())
        .uri(uri)
        .version(request.version())
        .body(Body::empty())?;
    *lookup.headers_mut() = request.headers().clone();

    let response = match serve_dir.oneshot(lookup).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        tracing::debug!(uri = %request.uri(), "Static file not found, passing through");
        return Ok(next.run(request).await);
    }

    Ok(response.map(Body::new))
}
