//! 对象存储模块
//!
//! 文件内容以标识符为键写入对象存储，下载时通过预签名 URL 直接从对象存储获取。

pub mod s3;

pub use s3::S3ObjectStore;

use crate::error::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use mockall::automock;
use std::time::Duration;

/// 预签名 URL 中覆盖的响应头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseOverrides {
    pub content_disposition: Option<String>,
}

/// 对象存储后端，存储桶在构造时确定
#[automock]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 检查对象是否存在
    ///
    /// 对象不存在时返回 `Ok(false)`，只有后端故障才返回错误。
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// 写入对象，并标记内容类型
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str)
    -> Result<(), StoreError>;

    /// 生成对象的限时下载 URL
    async fn presigned_get(
        &self,
        key: &str,
        expires_in: Duration,
        overrides: &ResponseOverrides,
    ) -> Result<String, StoreError>;
}
