//! Launchpad - 示例服务
//!
//! 加载配置，注册 /api/ping 与 /api/echo，按配置托管静态文件后启动

use launchpad::config::{load_config, print_config};
use launchpad::infrastructure::http::handlers;
use launchpad::RouteBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},launchpad={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Launchpad v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    let static_files = config.server.static_files.clone();
    let mut builder = RouteBuilder::<()>::new(config.server)
        .get("/api/ping", handlers::ping)
        .post("/api/echo", handlers::echo);

    if static_files.enabled {
        builder = builder.static_files(static_files.path, static_files.dir);
    }

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    builder
        .launch_with_shutdown((), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
