use anyhow::{Result, anyhow};
use futures::FutureExt;
use futures::future::{self, BoxFuture};

use super::{EmbedIntent, Embedder};
use crate::utils::ImageData;

/// 超过该尺寸的图片先缩小再统计直方图
const THUMBNAIL_SIZE: u32 = 64;

/// 本地颜色直方图嵌入，不依赖网络，适合开发调试
///
/// 每个颜色通道划分为 `bins` 个区间，向量维度为 `bins³`
pub struct HistogramEmbedder {
    bins: u32,
}

impl HistogramEmbedder {
    pub fn new(bins: u32) -> Self {
        Self { bins: bins.clamp(1, 16) }
    }

    pub fn dimension(&self) -> usize {
        self.bins.pow(3) as usize
    }

    pub fn histogram(&self, image: &ImageData) -> Result<Vec<f32>> {
        let (width, height) = image.size();
        let rgb = if width > THUMBNAIL_SIZE || height > THUMBNAIL_SIZE {
            image.image.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE).to_rgb8()
        } else {
            image.image.to_rgb8()
        };
        let npixels = rgb.width() as usize * rgb.height() as usize;
        if npixels == 0 {
            return Err(anyhow!("image has no pixels"));
        }

        let bins = self.bins as usize;
        let bucket = |v: u8| v as usize * bins / 256;
        let mut hist = vec![0f32; self.dimension()];
        for p in rgb.pixels() {
            let [r, g, b] = p.0;
            hist[bucket(r) * bins * bins + bucket(g) * bins + bucket(b)] += 1.0;
        }
        hist.iter_mut().for_each(|v| *v /= npixels as f32);
        Ok(hist)
    }
}

impl Embedder for HistogramEmbedder {
    fn embed<'a>(
        &'a self,
        image: &'a ImageData,
        _intent: EmbedIntent,
    ) -> BoxFuture<'a, Result<Vec<f32>>> {
        future::ready(self.histogram(image)).boxed()
    }

    fn name(&self) -> &str {
        "histogram"
    }
}
