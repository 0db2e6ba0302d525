//! 配置模块
//!
//! 从环境变量加载服务配置（启动时会先读取 `.env` 文件），
//! 并据此创建 S3 和 DynamoDB 客户端。

use crate::relay::{DEFAULT_URL_TTL, MAX_FILE_SIZE, MAX_FILENAME_LEN, RelayLimits};
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 未设置 `AWS_REGION` 等标准配置时使用的区域
pub const FALLBACK_REGION: &str = "us-west-2";

/// 配置错误
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// 服务配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub bucket: String,
    pub table: String,
    pub limits: RelayLimits,
    /// S3 兼容服务的端点，例如 MinIO
    pub s3_endpoint: Option<String>,
    pub s3_force_path_style: bool,
    /// DynamoDB 端点，例如 DynamoDB Local
    pub dynamodb_endpoint: Option<String>,
}

impl Config {
    /// 从进程环境变量读取配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// 从给定的变量表读取配置，未设置的项使用默认值
    ///
    /// # 环境变量
    ///
    /// * `RELAY_BIND_ADDR` - 监听地址（默认：0.0.0.0:3000）
    /// * `RELAY_STATIC_DIR` - 静态文件目录（默认：public）
    /// * `RELAY_BUCKET` - 存储桶名称（默认：file-relay-bucket）
    /// * `RELAY_TABLE` - 映射表名称（默认：FileMapping）
    /// * `RELAY_URL_TTL_SECS` - 下载 URL 有效期秒数（默认：86400）
    /// * `RELAY_MAX_FILE_SIZE` - 文件大小上限（默认：10000000）
    /// * `RELAY_MAX_FILENAME_LEN` - 文件名长度上限（默认：1024）
    /// * `S3_ENDPOINT` / `S3_FORCE_PATH_STYLE` - S3 兼容服务端点
    /// * `DYNAMODB_ENDPOINT` - DynamoDB 端点
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let url_ttl_secs: u64 = parse(
            get("RELAY_URL_TTL_SECS"),
            "RELAY_URL_TTL_SECS",
            DEFAULT_URL_TTL.as_secs(),
        )?;
        // S3 预签名 URL 最长有效期为 7 天
        if url_ttl_secs == 0 || url_ttl_secs > 7 * 24 * 60 * 60 {
            return Err(ConfigError {
                key: "RELAY_URL_TTL_SECS",
                value: url_ttl_secs.to_string(),
                reason: "must be between 1 second and 7 days".into(),
            });
        }

        Ok(Self {
            bind_addr: parse(
                get("RELAY_BIND_ADDR"),
                "RELAY_BIND_ADDR",
                SocketAddr::from(([0, 0, 0, 0], 3000)),
            )?,
            static_dir: get("RELAY_STATIC_DIR").unwrap_or("public").into(),
            bucket: get("RELAY_BUCKET").unwrap_or("file-relay-bucket").to_owned(),
            table: get("RELAY_TABLE").unwrap_or("FileMapping").to_owned(),
            limits: RelayLimits {
                max_file_size: parse(
                    get("RELAY_MAX_FILE_SIZE"),
                    "RELAY_MAX_FILE_SIZE",
                    MAX_FILE_SIZE,
                )?,
                max_filename_len: parse(
                    get("RELAY_MAX_FILENAME_LEN"),
                    "RELAY_MAX_FILENAME_LEN",
                    MAX_FILENAME_LEN,
                )?,
                url_ttl: Duration::from_secs(url_ttl_secs),
            },
            s3_endpoint: get("S3_ENDPOINT").map(str::to_owned),
            s3_force_path_style: parse(get("S3_FORCE_PATH_STYLE"), "S3_FORCE_PATH_STYLE", false)?,
            dynamodb_endpoint: get("DYNAMODB_ENDPOINT").map(str::to_owned),
        })
    }

    /// 加载共享的 AWS 配置，区域缺失时使用 [`FALLBACK_REGION`]
    pub async fn load_aws_config(&self) -> SdkConfig {
        let region_provider =
            RegionProviderChain::default_provider().or_else(Region::new(FALLBACK_REGION));
        aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await
    }

    pub fn s3_client(&self, sdk_config: &SdkConfig) -> aws_sdk_s3::Client {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(self.s3_force_path_style);
        if let Some(endpoint) = &self.s3_endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        aws_sdk_s3::Client::from_conf(builder.build())
    }

    pub fn dynamodb_client(&self, sdk_config: &SdkConfig) -> aws_sdk_dynamodb::Client {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);
        if let Some(endpoint) = &self.dynamodb_endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        aws_sdk_dynamodb::Client::from_conf(builder.build())
    }
}

fn parse<T>(raw: Option<&str>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|err: T::Err| ConfigError {
            key,
            value: value.to_owned(),
            reason: err.to_string(),
        }),
    }
}
