/// multipart 请求中承载文件内容的字段名
pub const UPLOAD_FIELD: &str = "file";

/// 静态首页
pub const LANDING_PAGE: &str = "/index.html";

/// 上传成功时的响应前缀，后接新生成的标识符
pub const UPLOAD_SUCCESS_PREFIX: &str = "Data has been uploaded with the following identifier: ";

/// 请求体上限相对于文件大小上限的余量，容纳 multipart 边界和字段头
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;
