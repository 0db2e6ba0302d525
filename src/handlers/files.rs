use super::constants::{UPLOAD_FIELD, UPLOAD_SUCCESS_PREFIX};
use crate::AppState;
use crate::error::RelayError;
use crate::relay::{FileRelay, Upload};
use crate::utils::headers::declared_content_length;
use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// 处理文件上传
///
/// 先根据请求声明的 Content-Length 拒绝过大的上传，再读取 multipart 中的 `file` 字段。
///
/// # 返回值
///
/// 包含新标识符的纯文本响应。
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<String, RelayError> {
    let relay = state.relay.as_ref();
    let content_length = declared_content_length(&headers);
    relay.check_content_length(content_length)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(relay, err))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| RelayError::InvalidUpload(format!("`{UPLOAD_FIELD}` field has no filename")))?;
        relay.check_filename(&filename)?;

        let content_type = field.content_type().map(str::to_owned);
        let body = field
            .bytes()
            .await
            .map_err(|err| multipart_error(relay, err))?;

        let identifier = relay
            .upload(Upload {
                filename,
                content_length,
                content_type,
                body,
            })
            .await?;
        return Ok(format!("{UPLOAD_SUCCESS_PREFIX}{identifier}"));
    }

    Err(RelayError::InvalidUpload(format!(
        "missing `{UPLOAD_FIELD}` field"
    )))
}

/// 处理文件下载
///
/// 不代理文件内容，而是 302 重定向到对象存储的限时 URL。
pub async fn download_file(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Response, RelayError> {
    let url = state.relay.download_url(&identifier).await?;
    let location = HeaderValue::try_from(url)
        .map_err(|err| RelayError::Internal(format!("invalid redirect location: {err}")))?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// 请求体超过上限时 multipart 读取会失败，此时按文件过大处理
fn multipart_error(relay: &FileRelay, err: MultipartError) -> RelayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return RelayError::PayloadTooLarge {
            max: relay.limits().max_file_size,
        };
    }
    RelayError::InvalidUpload(err.body_text())
}
