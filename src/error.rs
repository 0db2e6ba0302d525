//! 错误类型模块
//!
//! `StoreError` 描述两个后端（元数据存储、对象存储）的失败，
//! `RelayError` 是上传/下载流程对外暴露的错误分类，并负责映射为 HTTP 响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// 后端存储错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 后端无法访问或返回了非预期的错误
    #[error("{backend} unavailable: {message}")]
    Unavailable {
        backend: &'static str,
        message: String,
    },

    /// 条件写入失败（标识符已存在或版本号不匹配）
    #[error("conditional write rejected for {identifier}")]
    Conflict { identifier: String },

    /// 后端返回的记录缺少字段或格式错误
    #[error("corrupt record {identifier}: {reason}")]
    Corrupt { identifier: String, reason: String },
}

impl StoreError {
    pub fn unavailable(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            backend,
            message: message.into(),
        }
    }

    pub fn conflict(identifier: impl Into<String>) -> Self {
        Self::Conflict {
            identifier: identifier.into(),
        }
    }

    pub fn corrupt(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }
}

/// 上传/下载流程的错误分类
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("File must be less than {max} bytes")]
    PayloadTooLarge { max: u64 },

    #[error("File name must be less than {max} characters")]
    InvalidFilename { max: usize },

    /// multipart 请求体格式错误或缺少 `file` 字段
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Could not find a file with that identifier")]
    MappingNotFound { identifier: String },

    /// 映射存在但对象存储中没有对应对象
    #[error("Could not find the file in the underlying storage with that identifier")]
    ObjectNotFound { identifier: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// 对应的 HTTP 状态码
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::PayloadTooLarge { .. }
            | RelayError::InvalidFilename { .. }
            | RelayError::InvalidUpload(_)
            | RelayError::MappingNotFound { .. }
            | RelayError::ObjectNotFound { .. } => StatusCode::BAD_REQUEST,
            RelayError::StorageUnavailable(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // 详细信息只写日志，不返回给客户端
            tracing::error!(error = %self, "请求处理失败");
            return (status, "Internal server error").into_response();
        }
        (status, self.to_string()).into_response()
    }
}
