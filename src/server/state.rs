use std::sync::Arc;

use log::error;

use crate::error::{InitError, RecognizeError};
use crate::recognizer::Recognizer;

/// 应用状态
pub struct AppState {
    /// 识别服务，初始化失败时保存错误信息
    recognizer: Result<Recognizer, String>,
}

impl AppState {
    /// 创建新的应用状态，初始化失败时服务仍然可以启动
    pub fn new(recognizer: Result<Recognizer, InitError>) -> Arc<Self> {
        let recognizer = recognizer.map_err(|e| {
            error!("FATAL: 服务初始化失败: {e}");
            e.to_string()
        });
        Arc::new(AppState { recognizer })
    }

    /// 获取识别服务，初始化失败时返回初始化错误
    pub fn recognizer(&self) -> Result<&Recognizer, RecognizeError> {
        self.recognizer.as_ref().map_err(|e| RecognizeError::Init(e.clone()))
    }
}
