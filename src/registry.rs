//! 标识符注册模块
//!
//! 负责生成文件标识符，并把标识符与原始文件名的映射持久化到元数据存储。

pub mod dynamo;

pub use dynamo::DynamoMetadataStore;

use crate::error::StoreError;
use async_trait::async_trait;
use mockall::automock;
use std::sync::Arc;
use uuid::Uuid;

/// 标识符长度（128 位随机数的十六进制表示）
pub const IDENTIFIER_LEN: usize = 32;

/// 标识符与原始文件名之间的映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapping {
    identifier: Option<String>,
    filename: String,
    version: Option<u64>,
}

impl FileMapping {
    /// 新建一个尚未持久化的映射，标识符由注册器在保存时生成
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            identifier: None,
            filename: filename.into(),
            version: None,
        }
    }

    /// 从存储中读取的已持久化映射
    pub fn stored(identifier: impl Into<String>, filename: impl Into<String>, version: u64) -> Self {
        Self {
            identifier: Some(identifier.into()),
            filename: filename.into(),
            version: Some(version),
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// 当前存储中的版本号，未持久化时为 `None`
    pub fn version(&self) -> Option<u64> {
        self.version
    }
}

/// 元数据存储后端
///
/// `put` 必须是条件写入：
/// - `version` 为 `None` 时，仅在标识符不存在时写入，存储后的版本号为 1
/// - `version` 为 `Some(v)` 时，仅在存储中的版本号等于 `v` 时写入，存储后的版本号为 `v + 1`
///
/// 条件不满足时返回 [`StoreError::Conflict`]。
#[automock]
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// 写入映射，返回写入后的版本号
    async fn put(&self, mapping: &FileMapping) -> Result<u64, StoreError>;

    /// 按标识符读取映射，不存在时返回 `Ok(None)`
    async fn get(&self, identifier: &str) -> Result<Option<FileMapping>, StoreError>;
}

/// 生成新的文件标识符
///
/// 128 位随机 UUID 去掉连字符后的小写十六进制字符串，
/// 可以直接复制粘贴到浏览器地址栏中。
pub fn generate_identifier() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 判断字符串是否符合生成的标识符格式
pub fn is_identifier(value: &str) -> bool {
    value.len() == IDENTIFIER_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// 标识符注册器
#[derive(Clone)]
pub struct IdentifierRegistry {
    store: Arc<dyn MetadataStore>,
}

impl IdentifierRegistry {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// 保存映射
    ///
    /// 映射没有标识符时，在写入前生成新标识符；否则按更新处理。
    ///
    /// # 返回值
    ///
    /// 带有标识符和最新版本号的映射。
    ///
    /// # Errors
    ///
    /// 后端不可用或条件写入失败时返回 [`StoreError`]，不会在此处重试。
    pub async fn save(&self, mut mapping: FileMapping) -> Result<FileMapping, StoreError> {
        if mapping.identifier.as_deref().is_none_or(str::is_empty) {
            mapping.identifier = Some(generate_identifier());
        }

        let version = self.store.put(&mapping).await?;
        mapping.version = Some(version);
        Ok(mapping)
    }

    /// 按标识符读取映射，不存在时返回 `Ok(None)`
    pub async fn load(&self, identifier: &str) -> Result<Option<FileMapping>, StoreError> {
        self.store.get(identifier).await
    }
}
