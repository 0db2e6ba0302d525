use http::{HeaderMap, header};

/// 构造携带原始文件名的 Content-Disposition 值
///
/// 值本身用双引号包裹，所以文件名中的双引号需要转义，
/// 其他字符原样保留（浏览器会自行替换当前平台不允许的字符）。
///
/// # 示例
///
/// ```
/// use file_relay::utils::headers::content_disposition;
///
/// assert_eq!(content_disposition("report.pdf"), r#"filename="report.pdf""#);
/// assert_eq!(content_disposition(r#"a"b.txt"#), r#"filename="a\"b.txt""#);
/// ```
pub fn content_disposition(filename: &str) -> String {
    format!("filename=\"{}\"", filename.replace('"', "\\\""))
}

/// 根据文件名猜测 MIME 类型，无法识别时返回 `application/octet-stream`
pub fn guess_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_owned()
}

/// 读取请求声明的 Content-Length，缺失或无法解析时返回 `None`
pub fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
