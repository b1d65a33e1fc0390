use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// 单个内容渲染或写出失败；记录下来，生成继续进行
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("生成内容 {content} 失败: {cause}")]
pub struct ContentRenderError {
    /// 内容的源文件名
    pub content: String,
    pub cause: String,
}

impl ContentRenderError {
    pub fn new(content: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self {
            content: content.into(),
            cause: cause.to_string(),
        }
    }
}

/// 会中止整个生成过程的错误
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("无法准备输出目录 {path}: {message}")]
    FatalIo { path: PathBuf, message: String },
}
