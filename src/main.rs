use anyhow::Context;
use file_relay::config::Config;
use file_relay::registry::{DynamoMetadataStore, IdentifierRegistry};
use file_relay::relay::FileRelay;
use file_relay::storage::S3ObjectStore;
use file_relay::{AppState, app};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载 .env 文件
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_timer(LocalTime::rfc_3339())
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("加载配置失败")?;

    let sdk_config = config.load_aws_config().await;
    let metadata = DynamoMetadataStore::new(config.dynamodb_client(&sdk_config), &config.table);
    let objects = S3ObjectStore::new(config.s3_client(&sdk_config), &config.bucket);

    tracing::info!(
        region = ?sdk_config.region(),
        bucket = %objects.bucket(),
        table = %config.table,
        "后端已配置"
    );

    let relay = FileRelay::new(
        IdentifierRegistry::new(Arc::new(metadata)),
        Arc::new(objects),
        config.limits,
    );
    let router = app(AppState::new(relay), &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("无法监听 {}", config.bind_addr))?;
    tracing::info!("服务器运行在 http://{}", config.bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务器异常退出")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听退出信号");
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在关闭");
}
