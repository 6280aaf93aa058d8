use std::path::PathBuf;

use thiserror::Error;

/// 服务初始化错误
///
/// 初始化失败后服务仍然会启动，但是每个请求都会返回该错误，直到进程重启
#[derive(Debug, Error)]
pub enum InitError {
    #[error("reference directory not found: {}", .0.display())]
    MissingReferenceDir(PathBuf),
    #[error("failed to read {}: {err}", path.display())]
    Io { path: PathBuf, err: std::io::Error },
    #[error("failed to decode reference image {}: {err}", path.display())]
    Decode { path: PathBuf, err: image::ImageError },
    #[error("failed to embed reference image {}: {err:#}", path.display())]
    Embed { path: PathBuf, err: anyhow::Error },
    #[error("embedding of {object_id} has dimension {actual}, expected {expected}")]
    Dimension { object_id: String, expected: usize, actual: usize },
    #[error("invalid planet map {}: {err}", path.display())]
    PlanetMap { path: PathBuf, err: anyhow::Error },
    #[error("embedding backend setup failed: {0}")]
    Setup(String),
}

/// 单个识别请求中可能出现的错误
#[derive(Debug, Error)]
pub enum RecognizeError {
    /// 服务初始化失败，保存的是初始化错误信息
    #[error("server initialization failed: {0}")]
    Init(String),
    /// 客户端提交的数据有误
    #[error("invalid image: {0}")]
    InvalidInput(String),
    /// 嵌入向量服务出错或超时
    #[error("embedding backend failed: {0:#}")]
    Backend(anyhow::Error),
}
