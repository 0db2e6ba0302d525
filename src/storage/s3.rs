//! S3 对象存储
//!
//! 使用 `aws-sdk-s3` 实现 [`ObjectStore`]，兼容 MinIO 等 S3 协议的服务。

use super::{ObjectStore, ResponseOverrides};
use crate::error::StoreError;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::time::Duration;

const BACKEND: &str = "s3";

/// 基于 S3 的 [`ObjectStore`] 实现
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    /// 通过 HeadObject 检查对象是否存在
    ///
    /// 404 视为不存在，其余错误（包括权限不足）都作为后端故障返回。
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(StoreError::unavailable(
                BACKEND,
                DisplayErrorContext(&err).to_string(),
            )),
        }
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let content_length = i64::try_from(body.len())
            .map_err(|_| StoreError::unavailable(BACKEND, "object too large"))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StoreError::unavailable(BACKEND, DisplayErrorContext(&err).to_string()))?;

        Ok(())
    }

    /// 为 GetObject 生成预签名 URL
    ///
    /// # 参数
    ///
    /// * `key` - 对象键。
    /// * `expires_in` - URL 有效期，S3 允许的最长时间为 7 天。
    /// * `overrides` - 通过 `response-*` 查询参数覆盖的响应头。
    ///
    /// # 返回值
    ///
    /// 预签名 URL 的字符串表示。
    async fn presigned_get(
        &self,
        key: &str,
        expires_in: Duration,
        overrides: &ResponseOverrides,
    ) -> Result<String, StoreError> {
        let presigning_config = PresigningConfig::expires_in(expires_in)
            .map_err(|err| StoreError::unavailable(BACKEND, err.to_string()))?;

        let mut request = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(disposition) = &overrides.content_disposition {
            request = request.response_content_disposition(disposition);
        }

        let presigned_request = request
            .presigned(presigning_config)
            .await
            .map_err(|err| StoreError::unavailable(BACKEND, DisplayErrorContext(&err).to_string()))?;

        Ok(presigned_request.uri().to_string())
    }
}
