use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::*;
use crate::matcher::DEFAULT_THRESHOLD;

#[derive(Parser, Debug, Clone)]
pub struct CatalogOptions {
    /// 参考图片目录，每个子目录对应一个物体，目录名即物体 ID
    #[arg(long, value_name = "DIR", default_value = "reference_images")]
    pub reference_dir: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png,webp")]
    pub suffix: String,
    /// 物体到行星 ID 的映射文件（JSON），不填则使用内置映射
    #[arg(long, value_name = "FILE")]
    pub planet_map: Option<PathBuf>,
    /// 最低匹配相似度，最高相似度必须严格大于该值
    #[arg(long, value_name = "SCORE", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f32,
}

#[derive(Parser, Debug, Clone)]
pub struct EmbedderOptions {
    /// 嵌入向量后端
    #[arg(long, value_enum, default_value_t = Backend::Gemini)]
    pub backend: Backend,
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Google 凭据文件路径
    #[arg(long, value_name = "FILE", env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,
    /// 嵌入模型名称
    #[arg(long, default_value = "gemini-embedding-001")]
    pub model: String,
    /// 嵌入服务地址
    #[arg(long, value_name = "URL", default_value = "https://generativelanguage.googleapis.com")]
    pub base_url: String,
    /// 单次嵌入请求超时时间，单位为秒
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,
    /// 颜色直方图后端每个通道的区间数量
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub histogram_bins: u32,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "stamp-vision", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 启动 HTTP 识别服务
    Server(ServerCommand),
    /// 在本地识别一张图片
    Match(MatchCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Google Gemini 嵌入接口
    Gemini,
    /// 本地颜色直方图，不需要网络
    Histogram,
}
