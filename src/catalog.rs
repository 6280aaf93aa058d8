use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::embedding::{EmbedIntent, Embedder};
use crate::error::InitError;
use crate::utils::ImageData;

/// 一张参考图片的嵌入向量
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    /// 物体 ID，即参考图片所在目录名
    pub object_id: String,
    pub vector: Vec<f32>,
}

/// 参考图片目录
///
/// 加载时只追加，加载完成后只读。同一个物体可以有多条记录
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ReferenceEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录，向量维度必须和已有记录一致
    pub fn push(&mut self, object_id: impl Into<String>, vector: Vec<f32>) -> Result<(), InitError> {
        let object_id = object_id.into();
        if let Some(expected) = self.dimension() {
            if expected != vector.len() {
                return Err(InitError::Dimension { object_id, expected, actual: vector.len() });
            }
        }
        self.entries.push(ReferenceEntry { object_id, vector });
        Ok(())
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 向量维度，目录为空时返回 None
    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|e| e.vector.len())
    }

    /// 不同物体的数量
    pub fn object_count(&self) -> usize {
        let mut ids = self.entries.iter().map(|e| e.object_id.as_str()).collect::<Vec<_>>();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

/// 构建匹配文件后缀的正则，多个后缀用逗号分隔，忽略大小写
pub fn suffix_regex(suffix: &str) -> Result<Regex, regex::Error> {
    let alternatives = suffix.split(',').map(|s| regex::escape(s.trim())).collect::<Vec<_>>();
    Regex::new(&format!("(?i)^({})$", alternatives.join("|")))
}

/// 遍历参考图片目录，为每张图片计算嵌入向量
///
/// 目录结构为 `root/<object_id>/<image>`，任意一张图片失败都会导致加载失败
pub async fn load_catalog(
    root: &Path,
    suffix: &Regex,
    embedder: &dyn Embedder,
) -> Result<Catalog, InitError> {
    if !root.is_dir() {
        return Err(InitError::MissingReferenceDir(root.to_path_buf()));
    }

    let mut catalog = Catalog::new();
    for (object_id, path) in scan_directory(root, suffix)? {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| InitError::Io { path: path.clone(), err })?;
        let image =
            ImageData::decode(bytes).map_err(|err| InitError::Decode { path: path.clone(), err })?;
        let vector = embedder
            .embed(&image, EmbedIntent::Document)
            .await
            .map_err(|err| InitError::Embed { path: path.clone(), err })?;
        debug!("已加载参考图片: {} -> {}", path.display(), object_id);
        catalog.push(object_id, vector)?;
    }

    if catalog.is_empty() {
        warn!("参考图片目录为空: {}", root.display());
    } else {
        info!(
            "已加载 {} 个物体的 {} 张参考图片 (后端: {})",
            catalog.object_count(),
            catalog.len(),
            embedder.name()
        );
    }

    Ok(catalog)
}

/// 列出所有 `(物体 ID, 图片路径)`，按文件名排序
fn scan_directory(root: &Path, suffix: &Regex) -> Result<Vec<(String, PathBuf)>, InitError> {
    let walk_err = |err: walkdir::Error| {
        let path = err.path().unwrap_or(root).to_path_buf();
        let err = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("directory loop detected"));
        InitError::Io { path, err }
    };

    let mut images = vec![];
    for object_dir in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let object_dir = object_dir.map_err(walk_err)?;
        if !object_dir.file_type().is_dir() {
            debug!("跳过非目录项: {}", object_dir.path().display());
            continue;
        }
        let object_id = object_dir.file_name().to_string_lossy().into_owned();

        for entry in WalkDir::new(object_dir.path()).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(walk_err)?;
            let path = entry.into_path();
            let matched = path
                .extension()
                .map(|ext| suffix.is_match(&ext.to_string_lossy()))
                .unwrap_or(false);
            if !matched || !path.is_file() {
                debug!("跳过文件: {}", path.display());
                continue;
            }
            images.push((object_id.clone(), path));
        }
    }
    Ok(images)
}
