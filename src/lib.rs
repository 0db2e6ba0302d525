//! 文件中转服务库
//!
//! 这是一个基于 Axum 的文件中转服务，主要功能包括：
//! - 上传文件并返回不透明的文件标识符
//! - 通过标识符下载文件（重定向到对象存储的限时 URL）
//! - 标识符与原始文件名的映射保存在 DynamoDB，文件内容保存在 S3
//! - 提供静态首页

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod relay;
pub mod storage;
pub mod utils;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use http::Method;
use relay::FileRelay;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// 应用状态，请求之间只共享无状态的后端句柄
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<FileRelay>,
}

impl AppState {
    pub fn new(relay: FileRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

/// 创建并配置 Axum 应用程序
///
/// - `GET /` 重定向到静态首页
/// - `POST /file` 上传文件
/// - `GET /file/{identifier}` 重定向到文件的限时下载 URL
/// - 其余路径从 `static_dir` 提供静态文件
///
/// # 参数
///
/// * `state` - 应用状态。
/// * `static_dir` - 静态文件目录。
///
/// # 返回值
///
/// 返回配置好的 Axum Router 实例
pub fn app(state: AppState, static_dir: impl AsRef<Path>) -> axum::Router {
    let cors = CorsLayer::permissive()
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::any());

    let body_limit = usize::try_from(state.relay.limits().max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(handlers::constants::MULTIPART_OVERHEAD);

    axum::Router::new()
        .route("/", get(handlers::index))
        .route("/file", post(handlers::upload_file))
        .route("/file/{identifier}", get(handlers::download_file))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
