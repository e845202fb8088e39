//! Route Builder
//!
//! 可链式调用的路由注册器。注册动作先按顺序累积，`launch` 时一次性应用：
//! 1. 按注册顺序绑定全部路由与中间件（中间件只作用于其后注册的路由）
//! 2. 安装 404 兜底与兜底错误处理
//! 3. 安装构造阶段的中间件（安全响应头、CORS、请求体上限等），监听端口
//!
//! `launch` 消费 builder，启动后无法再追加路由。

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use chrono_tz::Tz;
use futures_util::FutureExt;

use super::action::{
    invalid_route_path, routes_conflict, BoxMiddleware, BoxRouteHandler, RouteAction, RouteMethod,
};
use super::context::RouteContext;
use super::error::RouteError;
use super::fallback::{catch_all_errors, not_found};
use super::server::{self, LaunchError, LaunchInfo, ReadyHook};
use super::static_files;
use crate::application::{time, OutboundRequest};
use crate::config::{CorsPolicy, ServerConfig};
use crate::infrastructure::adapters::ReqwestTransport;
use crate::infrastructure::network;

/// 路由注册器
pub struct RouteBuilder<S = ()> {
    config: ServerConfig,
    actions: Vec<RouteAction<S>>,
    outbound: Option<OutboundRequest>,
}

impl<S> Default for RouteBuilder<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl<S> RouteBuilder<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// 创建 builder
    pub fn new(config: ServerConfig) -> Self {
        notice_cors(config.cors.as_ref());
        Self {
            config,
            actions: Vec::new(),
            outbound: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn set_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn set_cors(mut self, policy: Option<CorsPolicy>) -> Self {
        notice_cors(policy.as_ref());
        self.config.cors = policy;
        self
    }

    /// 替换处理器中使用的出站请求客户端（默认使用 reqwest）
    pub fn with_outbound(mut self, outbound: OutboundRequest) -> Self {
        self.outbound = Some(outbound);
        self
    }

    /// 已累积的动作（按注册顺序）
    pub fn actions(&self) -> &[RouteAction<S>] {
        &self.actions
    }

    /// 已累积动作的描述
    pub fn describe(&self) -> Vec<String> {
        self.actions.iter().map(RouteAction::describe).collect()
    }

    /// 为给定方法和路径注册处理器
    ///
    /// 处理器返回的 `HttpError` 会被记录并直接响应；其他错误交给兜底错误处理。
    pub fn route<H, Fut, R>(mut self, method: RouteMethod, path: impl Into<String>, handler: H) -> Self
    where
        H: Fn(RouteContext<S>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        let handler: BoxRouteHandler<S> = Arc::new(move |ctx: RouteContext<S>, request: Request| {
            handler(ctx, request)
                .map(|result| result.map(IntoResponse::into_response))
                .boxed()
        });
        self.actions.push(RouteAction::Route {
            method,
            path: normalize_path(path.into()),
            handler,
        });
        self
    }

    pub fn get<H, Fut, R>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Fn(RouteContext<S>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        self.route(RouteMethod::Get, path, handler)
    }

    pub fn post<H, Fut, R>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Fn(RouteContext<S>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        self.route(RouteMethod::Post, path, handler)
    }

    pub fn put<H, Fut, R>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Fn(RouteContext<S>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        self.route(RouteMethod::Put, path, handler)
    }

    pub fn delete<H, Fut, R>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Fn(RouteContext<S>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        self.route(RouteMethod::Delete, path, handler)
    }

    /// 注册作用于所有请求的中间件
    pub fn use_middleware<M, Fut, R>(self, middleware: M) -> Self
    where
        M: Fn(RouteContext<S>, Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        self.push_middleware(None, middleware)
    }

    /// 注册只作用于路径前缀下请求的中间件
    pub fn use_at<M, Fut, R>(self, path: impl Into<String>, middleware: M) -> Self
    where
        M: Fn(RouteContext<S>, Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        self.push_middleware(Some(normalize_path(path.into())), middleware)
    }

    fn push_middleware<M, Fut, R>(mut self, path: Option<String>, middleware: M) -> Self
    where
        M: Fn(RouteContext<S>, Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
        R: IntoResponse,
    {
        let middleware: BoxMiddleware<S> = Arc::new(move |ctx: RouteContext<S>, request: Request, next: Next| {
            middleware(ctx, request, next)
                .map(|result| result.map(IntoResponse::into_response))
                .boxed()
        });
        self.actions.push(RouteAction::Middleware { path, middleware });
        self
    }

    /// 在路径前缀下托管目录中的静态文件
    pub fn static_files(self, path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let mount = normalize_path(path.into());
        let serve_dir = static_files::serve_dir(dir.into());
        let prefix = mount.clone();
        self.use_at(mount, move |_ctx: RouteContext<S>, request: Request, next: Next| {
            let serve_dir = serve_dir.clone();
            let prefix = prefix.clone();
            async move { static_files::serve(serve_dir, &prefix, request, next).await }
        })
    }

    /// 把另一个 builder 的动作按原顺序追加到当前 builder 之后
    pub fn chain(mut self, other: RouteBuilder<S>) -> Self {
        self.actions.extend(other.actions);
        self
    }

    /// 应用全部动作并安装兜底处理，得到可直接服务的 Router
    pub fn into_router(self, state: S) -> Result<Router, LaunchError> {
        let outbound = match self.outbound {
            Some(outbound) => outbound,
            None => OutboundRequest::new(Arc::new(ReqwestTransport::new()?)),
        };
        let config = Arc::new(self.config);
        let ctx = RouteContext::new(state, outbound, config.clone());

        let mut seen = HashSet::new();
        let actions: Vec<RouteAction<S>> = self
            .actions
            .into_iter()
            .filter(|action| match action {
                RouteAction::Route { method, path, .. } => {
                    let first = seen.insert((*method, path.clone()));
                    if !first {
                        tracing::warn!(
                            method = %method,
                            path = %path,
                            "Route already registered, ignoring duplicate"
                        );
                    }
                    first
                }
                RouteAction::Middleware { .. } => true,
            })
            .collect();

        check_route_paths(&actions)?;

        tracing::debug!(actions = actions.len(), "Binding route actions");

        // 逆序应用：中间件的 layer 只包裹已经加入的（即其后注册的）路由与 404 兜底
        let router = actions
            .into_iter()
            .rev()
            .fold(Router::new().fallback(not_found), |router, action| {
                action.apply(router, &ctx)
            })
            .layer(middleware::from_fn(catch_all_errors));

        Ok(server::with_server_layers(router, &config))
    }

    /// 启动服务并输出启动横幅
    pub async fn launch(self, state: S) -> Result<(), LaunchError> {
        self.run(state, ReadyHook::Banner, std::future::pending::<()>()).await
    }

    /// 启动服务，监听就绪后调用 `on_ready`
    pub async fn launch_with<F>(self, state: S, on_ready: F) -> Result<(), LaunchError>
    where
        F: FnOnce(&LaunchInfo) + Send + 'static,
    {
        self.run(
            state,
            ReadyHook::Callback(Box::new(on_ready)),
            std::future::pending::<()>(),
        )
        .await
    }

    /// 启动服务（带优雅关闭）
    pub async fn launch_with_shutdown<F>(self, state: S, shutdown_signal: F) -> Result<(), LaunchError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.run(state, ReadyHook::Banner, shutdown_signal).await
    }

    async fn run<F>(self, state: S, ready: ReadyHook, shutdown_signal: F) -> Result<(), LaunchError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let config = self.config.clone();
        let router = self.into_router(state)?;
        server::serve(router, &config, ready, shutdown_signal).await
    }

    /// 第一个非回环 IPv4 地址
    pub fn network_address() -> String {
        network::network_address()
    }

    /// 指定时区的当前时间戳，未指定时使用本地时区
    pub fn timestamp(zone: Option<Tz>) -> String {
        time::timestamp(zone)
    }
}

fn notice_cors(policy: Option<&CorsPolicy>) {
    if let Some(CorsPolicy::AllowAll) = policy {
        tracing::info!("Notice: CORS is enabled for ALL origins!");
    }
}

/// 在绑定前拒绝路由表无法接受的路径，避免绑定时 panic
fn check_route_paths<S>(actions: &[RouteAction<S>]) -> Result<(), LaunchError> {
    let mut registered: Vec<&str> = Vec::new();
    for action in actions {
        let RouteAction::Route { path, .. } = action else {
            continue;
        };
        if let Some(reason) = invalid_route_path(path) {
            return Err(LaunchError::InvalidRoute {
                path: path.clone(),
                reason,
            });
        }
        if let Some(existing) = registered
            .iter()
            .find(|existing| routes_conflict(existing, path))
        {
            return Err(LaunchError::RouteConflict {
                path: path.clone(),
                existing: existing.to_string(),
            });
        }
        if !registered.contains(&path.as_str()) {
            registered.push(path);
        }
    }
    Ok(())
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        HttpError, HttpTransport, TransportError, TransportRequest, TransportResponse,
    };
    use crate::infrastructure::http::extract;
    use crate::infrastructure::http::fallback::{INTERNAL_ERROR_BODY, NOT_FOUND_BODY};
    use crate::infrastructure::http::RouteResult;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderValue, Method, StatusCode},
        Json,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower::util::ServiceExt;

    /// 不应被调用的传输
    struct UnreachableTransport;

    #[async_trait]
    impl HttpTransport for UnreachableTransport {
        async fn execute(&self, _: TransportRequest) -> Result<TransportResponse, TransportError> {
            Err(TransportError::NoResponse("unreachable".into()))
        }
    }

    fn builder<S: Clone + Send + Sync + 'static>() -> RouteBuilder<S> {
        RouteBuilder::new(ServerConfig::with_port(0))
            .with_outbound(OutboundRequest::new(Arc::new(UnreachableTransport)))
    }

    async fn call(router: Router, method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn route_a(_ctx: RouteContext<()>, _request: Request) -> RouteResult<&'static str> {
        Ok("A")
    }

    async fn route_b(_ctx: RouteContext<()>, _request: Request) -> RouteResult<&'static str> {
        Ok("B")
    }

    async fn teapot(ctx: RouteContext<()>, _request: Request) -> RouteResult<&'static str> {
        Err(ctx.error("teapot", 418).into())
    }

    async fn plain_failure(_ctx: RouteContext<()>, _request: Request) -> RouteResult<&'static str> {
        Err(anyhow::anyhow!("database password is hunter2").into())
    }

    async fn panics(_ctx: RouteContext<()>, _request: Request) -> RouteResult<&'static str> {
        panic!("handler exploded")
    }

    async fn echo_item(_ctx: RouteContext<()>, request: Request) -> RouteResult<Json<Value>> {
        let (id, _request): (u32, Request) = extract::path_params(request).await?;
        Ok(Json(json!({ "id": id })))
    }

    #[tokio::test]
    async fn test_routes_dispatch_to_matching_handler() {
        let router = builder()
            .get("/a", route_a)
            .get("/b", route_b)
            .into_router(())
            .unwrap();

        assert_eq!(call(router.clone(), Method::GET, "/a").await, (StatusCode::OK, "A".into()));
        assert_eq!(call(router.clone(), Method::GET, "/b").await, (StatusCode::OK, "B".into()));
        assert_eq!(
            call(router, Method::GET, "/c").await,
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY.into())
        );
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_found() {
        let router = builder().get("/a", route_a).into_router(()).unwrap();
        assert_eq!(
            call(router, Method::POST, "/a").await,
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY.into())
        );
    }

    #[tokio::test]
    async fn test_methods_on_same_path() {
        let router = builder()
            .get("/item", route_a)
            .post("/item", route_b)
            .put("/item", route_a)
            .delete("/item", route_b)
            .into_router(())
            .unwrap();

        assert_eq!(call(router.clone(), Method::GET, "/item").await.1, "A");
        assert_eq!(call(router.clone(), Method::POST, "/item").await.1, "B");
        assert_eq!(call(router.clone(), Method::PUT, "/item").await.1, "A");
        assert_eq!(call(router, Method::DELETE, "/item").await.1, "B");
    }

    #[tokio::test]
    async fn test_typed_error_is_sent_with_its_status() {
        let router = builder().get("/tea", teapot).into_router(()).unwrap();
        let (status, body) = call(router, Method::GET, "/tea").await;

        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"error": {"message": "teapot"}})
        );
    }

    #[tokio::test]
    async fn test_unexpected_error_is_generic_500() {
        let router = builder().get("/fail", plain_failure).into_router(()).unwrap();
        assert_eq!(
            call(router, Method::GET, "/fail").await,
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY.into())
        );
    }

    #[tokio::test]
    async fn test_panic_is_generic_500() {
        let router = builder().get("/panic", panics).into_router(()).unwrap();
        assert_eq!(
            call(router, Method::GET, "/panic").await,
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY.into())
        );
    }

    #[tokio::test]
    async fn test_path_params() {
        let router = builder().get("/items/:id", echo_item).into_router(()).unwrap();
        let (status, body) = call(router.clone(), Method::GET, "/items/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"id": 42}));

        let (status, _) = call(router, Method::GET, "/items/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_route_first_wins() {
        let router = builder()
            .get("/dup", route_a)
            .get("/dup", route_b)
            .into_router(())
            .unwrap();
        assert_eq!(call(router, Method::GET, "/dup").await.1, "A");
    }

    #[tokio::test]
    async fn test_chain_appends_in_order() {
        let first = builder::<()>().get("/a", route_a).use_at("/admin", |_ctx, request, next: Next| async move {
            Ok::<_, RouteError>(next.run(request).await)
        });
        let second = builder::<()>().get("/b", route_b).static_files("/public", "public");

        let chained = first.chain(second);
        assert_eq!(
            chained.describe(),
            vec!["GET /a", "USE /admin", "GET /b", "USE /public"]
        );

        let router = chained.into_router(()).unwrap();
        assert_eq!(call(router.clone(), Method::GET, "/a").await.1, "A");
        assert_eq!(call(router, Method::GET, "/b").await.1, "B");
    }

    #[tokio::test]
    async fn test_chained_routes_first_registration_wins() {
        let first = builder::<()>().get("/shared", route_a);
        let second = builder::<()>().get("/shared", route_b);
        let router = first.chain(second).into_router(()).unwrap();
        assert_eq!(call(router, Method::GET, "/shared").await.1, "A");
    }

    #[tokio::test]
    async fn test_middleware_applies_to_later_routes_only() {
        let router = builder::<()>()
            .get("/before", route_a)
            .use_middleware(|_ctx, request, next: Next| async move {
                let mut response = next.run(request).await;
                response
                    .headers_mut()
                    .insert("x-tagged", HeaderValue::from_static("yes"));
                Ok::<_, RouteError>(response)
            })
            .get("/after", route_b)
            .into_router(())
            .unwrap();

        let request = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();
        let before = router.clone().oneshot(request("/before")).await.unwrap();
        let after = router.clone().oneshot(request("/after")).await.unwrap();
        let missing = router.oneshot(request("/missing")).await.unwrap();

        assert!(before.headers().get("x-tagged").is_none());
        assert_eq!(after.headers().get("x-tagged").unwrap(), "yes");
        assert_eq!(missing.headers().get("x-tagged").unwrap(), "yes");
    }

    #[tokio::test]
    async fn test_middleware_runs_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (order.clone(), order.clone());

        let router = builder::<()>()
            .use_middleware(move |_ctx, request, next: Next| {
                let order = first.clone();
                async move {
                    order.lock().unwrap().push("first");
                    Ok::<_, RouteError>(next.run(request).await)
                }
            })
            .use_middleware(move |_ctx, request, next: Next| {
                let order = second.clone();
                async move {
                    order.lock().unwrap().push("second");
                    Ok::<_, RouteError>(next.run(request).await)
                }
            })
            .get("/a", route_a)
            .into_router(())
            .unwrap();

        assert_eq!(call(router, Method::GET, "/a").await.1, "A");
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_scoped_middleware_only_matches_prefix() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let router = builder::<()>()
            .use_at("/admin", move |_ctx, request, next: Next| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, RouteError>(next.run(request).await)
                }
            })
            .get("/admin/panel", route_a)
            .get("/administrator", route_b)
            .into_router(())
            .unwrap();

        call(router.clone(), Method::GET, "/admin/panel").await;
        call(router, Method::GET, "/administrator").await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_middleware_errors_reach_catch_all() {
        let router = builder::<()>()
            .use_at("/locked", |_ctx, _request, _next: Next| async move {
                Err::<Response, _>(RouteError::from(HttpError::new("locked", 423)))
            })
            .use_at("/broken", |_ctx, _request, _next: Next| async move {
                Err::<Response, _>(RouteError::from(anyhow::anyhow!("middleware bug")))
            })
            .get("/locked", route_a)
            .get("/broken", route_b)
            .into_router(())
            .unwrap();

        let (status, body) = call(router.clone(), Method::GET, "/locked").await;
        assert_eq!(status, StatusCode::LOCKED);
        assert_eq!(body, r#"{"error":{"message":"locked"}}"#);

        assert_eq!(
            call(router, Method::GET, "/broken").await,
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY.into())
        );
    }

    #[derive(Clone)]
    struct Greeting(&'static str);

    async fn greet(ctx: RouteContext<Greeting>, _request: Request) -> RouteResult<String> {
        Ok(format!("{} from port {}", ctx.state().0, ctx.config().port))
    }

    #[tokio::test]
    async fn test_handlers_receive_state_and_config() {
        let router = builder::<Greeting>()
            .get("/greet", greet)
            .into_router(Greeting("hello"))
            .unwrap();
        assert_eq!(call(router, Method::GET, "/greet").await.1, "hello from port 0");
    }

    #[tokio::test]
    async fn test_outbound_failure_flows_through_route() {
        async fn relay(ctx: RouteContext<()>, _request: Request) -> RouteResult<Json<Value>> {
            let body = ctx
                .outbound()
                .get(crate::application::RequestOptions::new("http://upstream/"))
                .await?;
            Ok(Json(body))
        }

        let router = builder().get("/relay", relay).into_router(()).unwrap();
        let (status, body) = call(router, Method::GET, "/relay").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":{"message":"unreachable"}}"#);
    }

    #[tokio::test]
    async fn test_security_headers_on_all_responses() {
        let router = builder().get("/a", route_a).into_router(()).unwrap();
        let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn test_static_files_served_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"static bytes").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("index.html"), b"<h1>docs</h1>").unwrap();

        let router = builder::<()>()
            .static_files("/public", dir.path())
            .get("/public/dynamic", route_a)
            .into_router(())
            .unwrap();

        assert_eq!(
            call(router.clone(), Method::GET, "/public/hello.txt").await,
            (StatusCode::OK, "static bytes".into())
        );
        assert_eq!(
            call(router.clone(), Method::GET, "/public/docs/").await,
            (StatusCode::OK, "<h1>docs</h1>".into())
        );
        // 文件不存在时继续匹配后续路由
        assert_eq!(call(router.clone(), Method::GET, "/public/dynamic").await.1, "A");
        assert_eq!(
            call(router.clone(), Method::GET, "/public/missing.txt").await,
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY.into())
        );
        assert_eq!(
            call(router, Method::GET, "/hello.txt").await,
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY.into())
        );
    }

    #[tokio::test]
    async fn test_launch_with_ready_callback() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let app = builder().get("/a", route_a);
        let server = tokio::spawn(app.launch_with((), move |info: &LaunchInfo| {
            let _ = tx.send(info.port);
        }));

        let port = rx.await.unwrap();
        assert_ne!(port, 0);

        let body = reqwest::get(format!("http://127.0.0.1:{}/a", port))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "A");

        server.abort();
    }

    #[tokio::test]
    async fn test_wrong_method_behind_middleware_is_not_found() {
        let router = builder::<()>()
            .use_middleware(|_ctx, request, next: Next| async move {
                Ok::<_, RouteError>(next.run(request).await)
            })
            .get("/a", route_a)
            .into_router(())
            .unwrap();

        assert_eq!(call(router.clone(), Method::GET, "/a").await.1, "A");
        assert_eq!(
            call(router, Method::POST, "/a").await,
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY.into())
        );
    }

    #[tokio::test]
    async fn test_wrong_method_behind_static_files_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let router = builder::<()>()
            .static_files("/", dir.path())
            .get("/a", route_a)
            .into_router(())
            .unwrap();

        assert_eq!(
            call(router, Method::POST, "/a").await,
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY.into())
        );
    }

    #[tokio::test]
    async fn test_middleware_response_keeps_route_status() {
        async fn not_allowed(_ctx: RouteContext<()>, _request: Request) -> RouteResult<StatusCode> {
            Ok(StatusCode::METHOD_NOT_ALLOWED)
        }

        let router = builder::<()>()
            .use_middleware(|_ctx, request, next: Next| async move {
                Ok::<_, RouteError>(next.run(request).await)
            })
            .get("/locked", not_allowed)
            .into_router(())
            .unwrap();

        let (status, _) = call(router, Method::GET, "/locked").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_conflicting_parameter_names_are_rejected() {
        let result = builder::<()>()
            .get("/users/:id", route_a)
            .put("/users/:name", route_b)
            .into_router(());

        match result {
            Err(LaunchError::RouteConflict { path, existing }) => {
                assert_eq!(path, "/users/:name");
                assert_eq!(existing, "/users/:id");
            }
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("conflicting routes were accepted"),
        }
    }

    #[test]
    fn test_invalid_route_is_rejected() {
        let result = builder::<()>().get("/files/*rest/tail", route_a).into_router(());
        assert!(matches!(result, Err(LaunchError::InvalidRoute { .. })));
    }

    #[tokio::test]
    async fn test_same_parameter_names_share_a_path() {
        let router = builder::<()>()
            .get("/items/:id", echo_item)
            .delete("/items/:id", route_b)
            .get("/items/:id/parts", route_a)
            .into_router(())
            .unwrap();

        assert_eq!(call(router.clone(), Method::DELETE, "/items/7").await.1, "B");
        assert_eq!(call(router, Method::GET, "/items/7/parts").await.1, "A");
    }

    #[test]
    fn test_actions_keep_registration_order() {
        let app = builder::<()>()
            .post("/orders", route_a)
            .use_middleware(|_ctx, request, next: Next| async move {
                Ok::<_, RouteError>(next.run(request).await)
            })
            .delete("/orders/:id", route_b);

        let actions = app.actions();
        assert_eq!(actions.len(), 3);
        assert!(matches!(
            &actions[0],
            RouteAction::Route { method: RouteMethod::Post, path, .. } if path == "/orders"
        ));
        assert!(matches!(&actions[1], RouteAction::Middleware { path: None, .. }));
        assert_eq!(format!("{:?}", actions[2]), "DELETE /orders/:id");
    }

    #[test]
    fn test_timestamp_in_named_zone() {
        let ts = RouteBuilder::<()>::timestamp(Some(chrono_tz::Asia::Tokyo));
        assert!(ts.ends_with("AM") || ts.ends_with("PM"));
    }

    #[test]
    fn test_setters_before_launch() {
        let app = builder::<()>().set_port(8088).set_cors(Some(CorsPolicy::AllowAll));
        assert_eq!(app.port(), 8088);
        assert_eq!(app.config().cors, Some(CorsPolicy::AllowAll));
    }

    #[test]
    fn test_paths_are_normalized() {
        let app = builder::<()>().get("relative", route_a);
        assert_eq!(app.describe(), vec!["GET /relative"]);
    }
}
