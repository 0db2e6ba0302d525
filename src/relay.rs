//! 上传/下载流程模块
//!
//! 上传：校验大小和文件名 → 生成标识符并保存映射 → 以标识符为键写入对象存储。
//! 下载：查询映射 → 确认对象存在 → 生成带原始文件名的限时下载 URL。
//!
//! 映射和对象分两步写入，没有事务保证。对象写入失败时映射会保留下来，
//! 因此下载时必须单独确认对象是否存在。

use crate::error::{RelayError, StoreError};
use crate::registry::{FileMapping, IdentifierRegistry, is_identifier};
use crate::storage::{ObjectStore, ResponseOverrides};
use crate::utils::headers::{content_disposition, guess_mime_type};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 文件大小上限（字节）
pub const MAX_FILE_SIZE: u64 = 10_000_000;

/// 文件名长度上限（字符）
pub const MAX_FILENAME_LEN: usize = 1024;

/// 下载 URL 默认有效期：24 小时
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// 上传校验和下载 URL 的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayLimits {
    pub max_file_size: u64,
    pub max_filename_len: usize,
    pub url_ttl: Duration,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            max_filename_len: MAX_FILENAME_LEN,
            url_ttl: DEFAULT_URL_TTL,
        }
    }
}

/// 一次上传请求
#[derive(Debug, Clone)]
pub struct Upload {
    /// 客户端提交的原始文件名
    pub filename: String,
    /// 请求声明的长度，可能缺失
    pub content_length: Option<u64>,
    /// 客户端声明的内容类型，缺失时根据文件名猜测
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// 文件中转服务
pub struct FileRelay {
    registry: IdentifierRegistry,
    objects: Arc<dyn ObjectStore>,
    limits: RelayLimits,
}

impl FileRelay {
    pub fn new(
        registry: IdentifierRegistry,
        objects: Arc<dyn ObjectStore>,
        limits: RelayLimits,
    ) -> Self {
        Self {
            registry,
            objects,
            limits,
        }
    }

    pub fn limits(&self) -> &RelayLimits {
        &self.limits
    }

    /// 在读取请求体之前校验声明的长度
    pub fn check_content_length(&self, declared: Option<u64>) -> Result<(), RelayError> {
        debug!(content_length = ?declared, "校验上传大小");
        match declared {
            Some(length) if length > self.limits.max_file_size => Err(RelayError::PayloadTooLarge {
                max: self.limits.max_file_size,
            }),
            _ => Ok(()),
        }
    }

    /// 校验文件名长度（按字符计）
    pub fn check_filename(&self, filename: &str) -> Result<(), RelayError> {
        if filename.chars().count() > self.limits.max_filename_len {
            return Err(RelayError::InvalidFilename {
                max: self.limits.max_filename_len,
            });
        }
        Ok(())
    }

    /// 上传文件
    ///
    /// 所有校验都在写入任何存储之前完成。映射先于对象写入，
    /// 对象写入失败时不回滚映射。
    ///
    /// # 返回值
    ///
    /// 新生成的文件标识符。
    pub async fn upload(&self, upload: Upload) -> Result<String, RelayError> {
        self.check_content_length(upload.content_length)?;
        self.check_filename(&upload.filename)?;
        // 声明的长度可能缺失或不准确
        self.check_content_length(Some(upload.body.len() as u64))?;

        let mapping = self
            .registry
            .save(FileMapping::new(upload.filename.as_str()))
            .await
            .inspect_err(|err| error!(error = %err, "保存文件映射失败"))?;
        let identifier = mapping
            .identifier()
            .map(str::to_owned)
            .ok_or_else(|| RelayError::Internal("saved mapping has no identifier".into()))?;

        let content_type = upload
            .content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| guess_mime_type(&upload.filename));
        let size = upload.body.len();

        self.objects
            .put_object(&identifier, upload.body, &content_type)
            .await
            .inspect_err(|err| {
                warn!(identifier = %identifier, error = %err, "对象写入失败，映射已保留");
            })?;

        info!(
            identifier = %identifier,
            filename = %upload.filename,
            content_type = %content_type,
            size,
            "文件已上传"
        );
        Ok(identifier)
    }

    /// 生成文件的限时下载 URL
    ///
    /// # 参数
    ///
    /// * `identifier` - 来自请求路径的标识符，未经信任。
    ///
    /// # 返回值
    ///
    /// 对象存储的预签名 URL，Content-Disposition 携带原始文件名。
    ///
    /// # Errors
    ///
    /// - 映射不存在：[`RelayError::MappingNotFound`]
    /// - 映射存在但对象不存在：[`RelayError::ObjectNotFound`]
    /// - 任一后端故障：[`RelayError::Internal`]
    pub async fn download_url(&self, identifier: &str) -> Result<String, RelayError> {
        info!(identifier = %identifier, "下载请求");

        if !is_identifier(identifier) {
            return Err(RelayError::MappingNotFound {
                identifier: identifier.to_owned(),
            });
        }

        let mapping = self
            .registry
            .load(identifier)
            .await
            .map_err(|err| internal(identifier, "查询文件映射失败", err))?
            .ok_or_else(|| RelayError::MappingNotFound {
                identifier: identifier.to_owned(),
            })?;

        let exists = self
            .objects
            .exists(identifier)
            .await
            .map_err(|err| internal(identifier, "检查对象是否存在失败", err))?;
        if !exists {
            warn!(identifier = %identifier, "映射存在但对象缺失");
            return Err(RelayError::ObjectNotFound {
                identifier: identifier.to_owned(),
            });
        }

        let overrides = ResponseOverrides {
            content_disposition: Some(content_disposition(mapping.filename())),
        };
        self.objects
            .presigned_get(identifier, self.limits.url_ttl, &overrides)
            .await
            .map_err(|err| internal(identifier, "生成下载 URL 失败", err))
    }
}

fn internal(identifier: &str, message: &'static str, err: StoreError) -> RelayError {
    error!(identifier = %identifier, error = %err, "{message}");
    RelayError::Internal(err.to_string())
}
