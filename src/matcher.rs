use crate::catalog::{Catalog, ReferenceEntry};

/// 默认的最低匹配相似度
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// 余弦相似度
///
/// 维度不一致、任意一个向量的模为 0 或含有非有限值时返回 None
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0f64, 0f64, 0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    // 向量中含有 NaN 或无穷大时无法比较
    if !score.is_finite() {
        return None;
    }
    // 浮点误差可能让结果略微超出 [-1, 1]
    Some(score.clamp(-1.0, 1.0) as f32)
}

/// 在目录中找到相似度最高的记录，相似度相同时保留先出现的
pub fn best_match<'a>(catalog: &'a Catalog, query: &[f32]) -> Option<(&'a ReferenceEntry, f32)> {
    let mut best: Option<(&ReferenceEntry, f32)> = None;
    for entry in catalog.entries() {
        let Some(score) = cosine_similarity(query, &entry.vector) else {
            continue;
        };
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((entry, score));
        }
    }
    best
}

/// 一次查询的匹配结果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// 超过阈值时为匹配到的物体 ID
    pub object_id: Option<String>,
    /// 最高相似度，没有可比较的记录时为负无穷
    pub score: f32,
}

/// 匹配查询向量，最高相似度严格大于阈值才算匹配
pub fn match_vector(catalog: &Catalog, query: &[f32], threshold: f32) -> MatchResult {
    match best_match(catalog, query) {
        Some((entry, score)) if score > threshold => {
            MatchResult { object_id: Some(entry.object_id.clone()), score }
        }
        Some((_, score)) => MatchResult { object_id: None, score },
        None => MatchResult { object_id: None, score: f32::NEG_INFINITY },
    }
}
