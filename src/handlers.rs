//! HTTP 请求处理模块
//!
//! - 文件上传处理器
//! - 文件下载（重定向到预签名 URL）处理器
//! - 首页重定向

pub mod constants;
pub mod files;

pub use files::{download_file, upload_file};

use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};

/// 把根路径重定向到静态首页
pub async fn index() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, constants::LANDING_PAGE)],
    )
}
