use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::FutureExt;
use futures::future::BoxFuture;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbedIntent, Embedder};
use crate::utils::ImageData;

/// Gemini 嵌入服务配置
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API 根地址
    pub base_url: String,
    /// 模型名称，不带 `models/` 前缀
    pub model: String,
    pub api_key: String,
    /// 单次请求超时时间，单位为秒
    pub timeout_secs: u64,
}

/// 调用 Gemini `embedContent` 接口的嵌入向量后端
pub struct GeminiEmbedder {
    client: Client,
    config: GeminiConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part<'a> {
    inline_data: InlineData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:embedContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn request(&self, image: &ImageData, intent: EmbedIntent) -> Result<Vec<f32>> {
        let body = EmbedRequest {
            content: Content {
                parts: [Part {
                    inline_data: InlineData {
                        mime_type: image.mime_type(),
                        data: STANDARD.encode(&image.bytes),
                    },
                }],
            },
            task_type: task_type(intent),
        };

        debug!("请求 Gemini 嵌入向量: {} ({:?})", self.config.model, intent);

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("embedding request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("embedding service returned {status}: {text}"));
        }

        let resp: EmbedResponse = resp.json().await.context("invalid embedding response")?;
        if resp.embedding.values.is_empty() {
            return Err(anyhow!("embedding service returned an empty vector"));
        }
        Ok(resp.embedding.values)
    }
}

impl Embedder for GeminiEmbedder {
    fn embed<'a>(
        &'a self,
        image: &'a ImageData,
        intent: EmbedIntent,
    ) -> BoxFuture<'a, Result<Vec<f32>>> {
        self.request(image, intent).boxed()
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

fn task_type(intent: EmbedIntent) -> &'static str {
    match intent {
        EmbedIntent::Document => "RETRIEVAL_DOCUMENT",
        EmbedIntent::Query => "RETRIEVAL_QUERY",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(base_url: &str) -> GeminiEmbedder {
        GeminiEmbedder::new(GeminiConfig {
            base_url: base_url.to_string(),
            model: "gemini-embedding-001".to_string(),
            api_key: "key".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint() {
        let e = embedder("https://generativelanguage.googleapis.com/");
        assert_eq!(
            e.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-embedding-001:embedContent"
        );
    }

    #[test]
    fn test_request_body() {
        let body = EmbedRequest {
            content: Content {
                parts: [Part { inline_data: InlineData { mime_type: "image/png", data: "QUJD".into() } }],
            },
            task_type: task_type(EmbedIntent::Query),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["content"]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["content"]["parts"][0]["inlineData"]["data"], "QUJD");
    }

    #[test]
    fn test_parse_response() {
        let resp: EmbedResponse =
            serde_json::from_str(r#"{"embedding": {"values": [0.5, -0.25, 1.0]}}"#).unwrap();
        assert_eq!(resp.embedding.values, vec![0.5, -0.25, 1.0]);
    }
}
