//! DynamoDB 元数据存储
//!
//! 表以 `identifier` 为哈希键，另有 `filename`（S）和 `version`（N）两个属性。

use super::{FileMapping, MetadataStore};
use crate::error::StoreError;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

const BACKEND: &str = "dynamodb";

const ATTR_IDENTIFIER: &str = "identifier";
const ATTR_FILENAME: &str = "filename";
const ATTR_VERSION: &str = "version";

/// 基于 DynamoDB 的 [`MetadataStore`] 实现
#[derive(Clone)]
pub struct DynamoMetadataStore {
    client: Client,
    table: String,
}

impl DynamoMetadataStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl MetadataStore for DynamoMetadataStore {
    async fn put(&self, mapping: &FileMapping) -> Result<u64, StoreError> {
        let identifier = mapping
            .identifier()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::corrupt("", "mapping has no identifier"))?;
        let next_version = mapping.version().map_or(1, |v| v + 1);

        let request = self
            .client
            .put_item()
            .table_name(&self.table)
            .item(ATTR_IDENTIFIER, AttributeValue::S(identifier.to_owned()))
            .item(ATTR_FILENAME, AttributeValue::S(mapping.filename().to_owned()))
            .item(ATTR_VERSION, AttributeValue::N(next_version.to_string()))
            .expression_attribute_names("#id", ATTR_IDENTIFIER);

        // 新建时要求标识符不存在，更新时要求版本号一致
        let request = match mapping.version() {
            None => request.condition_expression("attribute_not_exists(#id)"),
            Some(current) => request
                .condition_expression("attribute_exists(#id) AND #v = :expected")
                .expression_attribute_names("#v", ATTR_VERSION)
                .expression_attribute_values(":expected", AttributeValue::N(current.to_string())),
        };

        match request.send().await {
            Ok(_) => Ok(next_version),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception())
                {
                    return Err(StoreError::conflict(identifier));
                }
                Err(StoreError::unavailable(
                    BACKEND,
                    DisplayErrorContext(&err).to_string(),
                ))
            }
        }
    }

    async fn get(&self, identifier: &str) -> Result<Option<FileMapping>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(ATTR_IDENTIFIER, AttributeValue::S(identifier.to_owned()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|err| StoreError::unavailable(BACKEND, DisplayErrorContext(&err).to_string()))?;

        output
            .item()
            .map(|item| mapping_from_item(identifier, item))
            .transpose()
    }
}

/// 把 DynamoDB 条目解析为 [`FileMapping`]
fn mapping_from_item(
    identifier: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<FileMapping, StoreError> {
    let filename = item
        .get(ATTR_FILENAME)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| StoreError::corrupt(identifier, "missing string attribute `filename`"))?;

    // 早期写入的条目可能没有版本号
    let version = match item.get(ATTR_VERSION) {
        None => 0,
        Some(value) => value
            .as_n()
            .ok()
            .and_then(|n| n.parse::<u64>().ok())
            .ok_or_else(|| StoreError::corrupt(identifier, "attribute `version` is not a number"))?,
    };

    Ok(FileMapping::stored(identifier, filename.as_str(), version))
}
