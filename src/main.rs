//! Tabula - Project CRUD 服务
//!
//! 启动顺序：配置 → 日志 → Sentry → 日志出口 → 数据库 → HTTP 服务器。
//! 日志收集启用但建连失败时视为配置错误，直接退出。

use std::sync::Arc;

use tabula::config::{load_config, print_config};
use tabula::infrastructure::http::{AppState, HttpServer, ServerConfig};
use tabula::infrastructure::logging::{EventLevel, LogSink};
use tabula::infrastructure::persistence::postgres::{create_pool, run_migrations, PgProjectStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},tabula={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Tabula - Project CRUD 服务");
    print_config(&config);

    // Sentry 错误跟踪（可选）
    let _sentry_guard = if config.sentry.enabled && !config.sentry.dsn.is_empty() {
        Some(sentry::init((
            config.sentry.dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        )))
    } else {
        None
    };

    // 结构化日志出口：启用时必须建连成功
    let level = EventLevel::parse(&config.logstash.level);
    let log_sink = if config.logstash.enabled {
        LogSink::connect(
            &config.logstash.host,
            config.logstash.port,
            config.logstash.service_name.clone(),
            level,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to log collector: {}", e))?
    } else {
        LogSink::stream(config.logstash.service_name.clone(), level)
    };

    // 初始化数据库
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;
    let store = Arc::new(PgProjectStore::new(pool));

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(store, Arc::new(log_sink));
    let server = HttpServer::new(server_config, state, config.docs.enabled);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
