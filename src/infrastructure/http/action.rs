//! Route Actions
//!
//! 延迟绑定的路由/中间件注册动作。按注册顺序保存，在 launch 时一次性应用到 Router。

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{on, MethodFilter},
    Router,
};
use futures_util::future::BoxFuture;

use super::context::RouteContext;
use super::error::{forward, mark_dispatched, resolve_route_error, RouteError};

/// 类型擦除后的路由处理器
pub type BoxRouteHandler<S> = Arc<
    dyn Fn(RouteContext<S>, Request) -> BoxFuture<'static, Result<Response, RouteError>>
        + Send
        + Sync,
>;

/// 类型擦除后的中间件
pub type BoxMiddleware<S> = Arc<
    dyn Fn(RouteContext<S>, Request, Next) -> BoxFuture<'static, Result<Response, RouteError>>
        + Send
        + Sync,
>;

/// 可注册的路由方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    fn filter(&self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Delete => MethodFilter::DELETE,
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 路由动作
pub enum RouteAction<S> {
    /// 方法 + 路径 + 处理器
    Route {
        method: RouteMethod,
        path: String,
        handler: BoxRouteHandler<S>,
    },
    /// 中间件，可选路径前缀
    Middleware {
        path: Option<String>,
        middleware: BoxMiddleware<S>,
    },
}

impl<S> Clone for RouteAction<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Route {
                method,
                path,
                handler,
            } => Self::Route {
                method: *method,
                path: path.clone(),
                handler: handler.clone(),
            },
            Self::Middleware { path, middleware } => Self::Middleware {
                path: path.clone(),
                middleware: middleware.clone(),
            },
        }
    }
}

impl<S> RouteAction<S> {
    /// 人类可读的描述，例如 `GET /users/:id`、`USE /public`、`USE *`
    pub fn describe(&self) -> String {
        match self {
            Self::Route { method, path, .. } => format!("{} {}", method, path),
            Self::Middleware { path: Some(path), .. } => format!("USE {}", path),
            Self::Middleware { path: None, .. } => "USE *".to_string(),
        }
    }
}

impl<S> fmt::Debug for RouteAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl<S> RouteAction<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// 把动作应用到 Router 上
    ///
    /// 中间件通过 `Router::layer` 包裹此前已加入 Router 的路由，
    /// 因此调用方需要按注册顺序的逆序应用动作。
    pub(crate) fn apply(self, router: Router, ctx: &RouteContext<S>) -> Router {
        match self {
            Self::Route {
                method,
                path,
                handler,
            } => {
                let ctx = ctx.clone();
                let endpoint = on(method.filter(), move |request: Request| {
                    let ctx = ctx.clone();
                    let handler = handler.clone();
                    async move {
                        let response = match handler(ctx, request).await {
                            Ok(response) => response,
                            Err(err) => resolve_route_error(err),
                        };
                        mark_dispatched(response)
                    }
                });
                router.route(&path, endpoint)
            }
            Self::Middleware { path, middleware } => {
                let ctx = ctx.clone();
                router.layer(middleware::from_fn(move |request: Request, next: Next| {
                    let ctx = ctx.clone();
                    let middleware = middleware.clone();
                    let path = path.clone();
                    async move {
                        let applies = path
                            .as_deref()
                            .map_or(true, |mount| strip_mount(mount, request.uri().path()).is_some());
                        if !applies {
                            return next.run(request).await;
                        }
                        match middleware(ctx, request, next).await {
                            // 不打标记：只有路由本身的响应带 Dispatched
                            Ok(response) => response,
                            Err(err) => forward(err.into_inner()),
                        }
                    }
                }))
            }
        }
    }
}

/// 路由路径中的一段
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    Wildcard(&'a str),
}

fn segments(path: &str) -> impl Iterator<Item = Segment<'_>> {
    path.split('/').map(|segment| {
        if let Some(name) = segment.strip_prefix(':') {
            Segment::Param(name)
        } else if let Some(name) = segment.strip_prefix('*') {
            Segment::Wildcard(name)
        } else {
            Segment::Static(segment)
        }
    })
}

/// 检查单条路由路径，返回不合法的原因
pub(crate) fn invalid_route_path(path: &str) -> Option<&'static str> {
    let parsed: Vec<Segment<'_>> = segments(path).collect();
    let last = parsed.len().saturating_sub(1);
    for (index, segment) in parsed.iter().enumerate() {
        match segment {
            Segment::Param("") => return Some("parameter name is empty"),
            Segment::Wildcard("") => return Some("wildcard name is empty"),
            Segment::Wildcard(_) if index != last => {
                return Some("wildcard must be the last segment")
            }
            _ => {}
        }
    }
    None
}

/// 两条路由在同一位置使用了不同的参数名（或参数与通配符并存）时返回 true
///
/// 路由表要求共享前缀上的参数名一致，例如 `/users/:id` 与 `/users/:name` 不能共存
pub(crate) fn routes_conflict(a: &str, b: &str) -> bool {
    for pair in segments(a).zip(segments(b)) {
        match pair {
            (Segment::Static(x), Segment::Static(y)) if x == y => continue,
            (Segment::Param(x), Segment::Param(y)) if x == y => continue,
            (Segment::Wildcard(x), Segment::Wildcard(y)) if x == y => continue,
            (Segment::Param(_), Segment::Param(_))
            | (Segment::Wildcard(_), Segment::Wildcard(_))
            | (Segment::Param(_), Segment::Wildcard(_))
            | (Segment::Wildcard(_), Segment::Param(_)) => return true,
            _ => return false,
        }
    }
    false
}

/// 去掉挂载前缀，前缀只在路径段边界上匹配
///
/// `strip_mount("/static", "/static/a.css") == Some("/a.css")`，
/// `strip_mount("/static", "/statics") == None`
pub(crate) fn strip_mount<'a>(mount: &str, path: &'a str) -> Option<&'a str> {
    let mount = mount.trim_end_matches('/');
    if mount.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(mount)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
