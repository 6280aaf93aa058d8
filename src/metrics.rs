use std::sync::LazyLock;

use prometheus::*;

static METRIC_RECOGNIZE_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "stamp_recognize_count",
        "count of recognize requests by outcome",
        &["outcome"]
    )
    .unwrap()
});

static METRIC_RECOGNIZE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "stamp_recognize_duration",
        "duration of the per-request recognition in seconds",
        &["size"]
    )
    .unwrap()
});

static METRIC_RECOGNIZE_MAX_SCORE: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "stamp_recognize_max_score",
        "best cosine similarity of the per-request recognition",
        (-4..=20).map(|x| x as f64 * 0.05).collect()
    )
    .unwrap()
});

/// 识别请求的结果分类
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Success,
    NoMatch,
    Unmapped,
    Invalid,
    Error,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NoMatch => "no_match",
            Outcome::Unmapped => "unmapped",
            Outcome::Invalid => "invalid",
            Outcome::Error => "error",
        }
    }
}

pub fn inc_recognize_count(outcome: Outcome) {
    METRIC_RECOGNIZE_COUNT.with_label_values(&[outcome.as_str()]).inc();
}

pub fn inc_recognize_duration(size: (u32, u32), duration: f32) {
    METRIC_RECOGNIZE_DURATION.with_label_values(&[to_fixed_size(size)]).observe(duration as f64);
}

/// 记录最高相似度，没有可比较记录时不记录
pub fn inc_recognize_max_score(score: f32) {
    if score.is_finite() {
        METRIC_RECOGNIZE_MAX_SCORE.observe(score as f64);
    }
}

/// 将图像面积范围调整到几个固定值
fn to_fixed_size((width, height): (u32, u32)) -> &'static str {
    let area = width as u64 * height as u64;
    if area <= 256 * 256 {
        "256"
    } else if area <= 512 * 512 {
        "512"
    } else if area <= 1024 * 1024 {
        "1024"
    } else if area <= 2048 * 2048 {
        "2048"
    } else {
        "2048+"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_size() {
        assert_eq!(to_fixed_size((100, 100)), "256");
        assert_eq!(to_fixed_size((1920, 1080)), "2048");
        assert_eq!(to_fixed_size((100_000, 100_000)), "2048+");
    }
}
