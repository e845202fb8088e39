//! HTTP Layer - 路由注册与服务启动
//!
//! RouteBuilder 累积路由动作，launch 时应用到 axum Router 并监听端口

pub mod action;
pub mod builder;
pub mod context;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod static_files;

pub use action::{RouteAction, RouteMethod};
pub use builder::RouteBuilder;
pub use context::RouteContext;
pub use error::{Failure, RouteError, RouteResult};
pub use server::{LaunchError, LaunchInfo};
