//! 工具函数模块
//!
//! - HTTP 头部处理工具（Content-Disposition 构造、MIME 类型检测、Content-Length 解析）

pub mod headers;
