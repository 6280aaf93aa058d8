use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::recognizer::Recognition;

/// 识别请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecognizeRequest {
    /// base64 编码的图片，可以带 `data:image/...;base64,` 前缀
    pub image: Option<String>,
}

/// 识别结果
#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecognizeResponse {
    /// 识别成功
    Success {
        /// 行星 ID
        planet_id: String,
    },
    /// 没有匹配的行星
    NoMatch {
        /// 匹配到物体但没有对应行星时的说明
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl From<Recognition> for RecognizeResponse {
    fn from(value: Recognition) -> Self {
        match value {
            Recognition::Planet { planet_id, .. } => Self::Success { planet_id },
            Recognition::Unmapped { object_id, .. } => Self::NoMatch {
                description: Some(format!("matched object '{object_id}' has no planet mapping")),
            },
            Recognition::NoMatch { .. } => Self::NoMatch { description: None },
        }
    }
}

/// 错误响应
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// 错误详情
    pub detail: String,
}
