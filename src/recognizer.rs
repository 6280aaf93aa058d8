use std::sync::Arc;

use log::{debug, info};

use crate::catalog::{Catalog, load_catalog, suffix_regex};
use crate::config::CatalogOptions;
use crate::embedding::{EmbedIntent, Embedder};
use crate::error::{InitError, RecognizeError};
use crate::matcher::{MatchResult, match_vector};
use crate::planet::PlanetMap;
use crate::utils::ImageData;

/// 一次识别的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    /// 匹配到物体，并且有对应的行星
    Planet { object_id: String, planet_id: String, score: f32 },
    /// 匹配到物体，但是没有对应的行星
    Unmapped { object_id: String, score: f32 },
    /// 没有相似度超过阈值的物体
    NoMatch { score: f32 },
}

/// 图片识别服务
///
/// 启动时加载一次，之后只读，可以在多个请求之间共享
pub struct Recognizer {
    catalog: Catalog,
    planets: PlanetMap,
    embedder: Arc<dyn Embedder>,
    threshold: f32,
}

impl Recognizer {
    pub fn new(
        catalog: Catalog,
        planets: PlanetMap,
        embedder: Arc<dyn Embedder>,
        threshold: f32,
    ) -> Self {
        Self { catalog, planets, embedder, threshold }
    }

    /// 加载参考图片和行星映射，构建识别服务
    pub async fn load(opts: &CatalogOptions, embedder: Arc<dyn Embedder>) -> Result<Self, InitError> {
        let planets = match &opts.planet_map {
            Some(path) => PlanetMap::from_file(path)?,
            None => PlanetMap::default(),
        };
        info!("已加载 {} 条行星映射", planets.len());

        let suffix = suffix_regex(&opts.suffix)
            .map_err(|e| InitError::Setup(format!("invalid suffix list: {e}")))?;
        let catalog = load_catalog(&opts.reference_dir, &suffix, embedder.as_ref()).await?;

        Ok(Self::new(catalog, planets, embedder, opts.threshold))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// 计算查询图片的嵌入向量，并在目录中查找最相似的物体
    pub async fn match_image(&self, image: &ImageData) -> Result<MatchResult, RecognizeError> {
        let query = self
            .embedder
            .embed(image, EmbedIntent::Query)
            .await
            .map_err(RecognizeError::Backend)?;

        if let Some(dim) = self.catalog.dimension() {
            if dim != query.len() {
                return Err(RecognizeError::Backend(anyhow::anyhow!(
                    "query embedding has dimension {}, catalog has {}",
                    query.len(),
                    dim
                )));
            }
        }

        let result = match_vector(&self.catalog, &query, self.threshold);
        debug!("匹配结果: {:?}", result);
        Ok(result)
    }

    /// 识别图片并映射到行星
    pub async fn recognize(&self, image: &ImageData) -> Result<Recognition, RecognizeError> {
        let MatchResult { object_id, score } = self.match_image(image).await?;
        let Some(object_id) = object_id else {
            return Ok(Recognition::NoMatch { score });
        };
        Ok(match self.planets.resolve(&object_id) {
            Some(planet_id) => {
                Recognition::Planet { planet_id: planet_id.to_string(), object_id, score }
            }
            None => Recognition::Unmapped { object_id, score },
        })
    }
}
