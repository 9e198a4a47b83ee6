//! Image Generator Port - 配图生成抽象

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use super::ai_provider::AiError;
use crate::domain::assistant::{AiSettings, ImageProvider};

/// 配图请求
#[derive(Debug, Clone, Default)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub size: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, settings: &AiSettings) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            prompt: prompt.into(),
            model: non_empty(&settings.image_model),
            size: non_empty(&settings.image_size),
            base_url: non_empty(&settings.image_base_url),
            api_key: non_empty(&settings.image_api_key),
        }
    }
}

/// 生成结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageOutput {
    /// 原始 base64 数据（不带 data: 前缀）
    Base64 { data: String },
    /// 下载失败时直接返回远程地址
    Url { url: String },
}

#[async_trait]
pub trait ImageGeneratorPort: Send + Sync {
    async fn generate_image(&self, request: ImageRequest) -> Result<ImageOutput, AiError>;
}

#[derive(Clone)]
pub struct ImageGeneratorRegistry {
    gemini: Arc<dyn ImageGeneratorPort>,
    openai_compatible: Arc<dyn ImageGeneratorPort>,
}

impl ImageGeneratorRegistry {
    pub fn new(
        gemini: Arc<dyn ImageGeneratorPort>,
        openai_compatible: Arc<dyn ImageGeneratorPort>,
    ) -> Self {
        Self {
            gemini,
            openai_compatible,
        }
    }

    pub fn get(&self, provider: ImageProvider) -> Arc<dyn ImageGeneratorPort> {
        match provider {
            ImageProvider::Gemini => self.gemini.clone(),
            ImageProvider::OpenaiCompatible => self.openai_compatible.clone(),
        }
    }
}
