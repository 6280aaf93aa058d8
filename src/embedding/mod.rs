mod gemini;
mod histogram;

use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;

pub use gemini::*;
pub use histogram::*;

use crate::config::{Backend, EmbedderOptions};
use crate::error::InitError;
use crate::utils::ImageData;

/// 嵌入向量的用途，部分后端会据此生成不同的向量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedIntent {
    /// 参考图片（被检索的文档）
    Document,
    /// 用户上传的查询图片
    Query,
}

/// 图片嵌入向量提供者
///
/// 同一个实现返回的向量维度必须固定
pub trait Embedder: Send + Sync {
    /// 计算一张图片的嵌入向量
    fn embed<'a>(&'a self, image: &'a ImageData, intent: EmbedIntent)
    -> BoxFuture<'a, Result<Vec<f32>>>;

    /// 后端名称，用于日志
    fn name(&self) -> &str;
}

/// 根据命令行选项构建嵌入向量后端
pub fn create_embedder(opts: &EmbedderOptions) -> Result<Arc<dyn Embedder>, InitError> {
    match opts.backend {
        Backend::Gemini => {
            let api_key = opts
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| InitError::Setup("missing Gemini API key".to_string()))?;
            if let Some(path) = &opts.credentials {
                if !path.is_file() {
                    return Err(InitError::Setup(format!(
                        "credentials file not found: {}",
                        path.display()
                    )));
                }
            }
            let config = GeminiConfig {
                base_url: opts.base_url.clone(),
                model: opts.model.clone(),
                api_key,
                timeout_secs: opts.timeout,
            };
            let embedder =
                GeminiEmbedder::new(config).map_err(|e| InitError::Setup(format!("{e:#}")))?;
            Ok(Arc::new(embedder))
        }
        Backend::Histogram => Ok(Arc::new(HistogramEmbedder::new(opts.histogram_bins))),
    }
}
