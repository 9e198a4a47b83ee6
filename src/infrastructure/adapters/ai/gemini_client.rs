//! Gemini Client - Google Generative Language API
//!
//! POST {base}/v1beta/models/{model}:generateContent?key=...
//! 同一客户端同时实现文本生成与图片生成

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::error_body;
use crate::application::ports::{
    AiError, AiProviderPort, GenerateRequest, ImageGeneratorPort, ImageOutput, ImageRequest,
    ResponseFormat,
};
use crate::domain::assistant::{ChatMessage, ChatRole};

const SERVICE: &str = "Gemini";

/// Gemini 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// 文本模型
    pub model: String,
    /// 图片模型
    pub image_model: String,
    pub timeout_secs: u64,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
            model: "gemini-3-flash-preview".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            timeout_secs: 120,
        }
    }
}

// ========== Wire types ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateContentResponse {
    /// 首个候选的全部文本拼接
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn inline_image(&self) -> Option<String> {
        self.candidates
            .first()?
            .content
            .parts
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| !d.data.is_empty())
            .map(|d| d.data.clone())
    }
}

fn text_content(role: Option<&str>, text: impl Into<String>) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: Some(text.into()),
            inline_data: None,
        }],
    }
}

fn to_content(message: &ChatMessage) -> Content {
    let role = match message.role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    };
    text_content(Some(role), message.text.clone())
}

/// 组装请求体。带 schema 的 JSON 输出交给 responseSchema，否则把提示追加到系统提示词
fn build_body(request: &GenerateRequest) -> GenerateContentBody {
    let mut system = request.system_prompt.clone();
    let mut config = GenerationConfig {
        temperature: request.temperature,
        max_output_tokens: request.max_tokens,
        ..Default::default()
    };

    if let ResponseFormat::Json { schema, hint } = &request.format {
        config.response_mime_type = Some("application/json");
        match schema {
            Some(schema) => config.response_schema = Some(schema.clone()),
            None => {
                if let Some(hint) = hint {
                    system = format!("{system}\n\n{hint}");
                }
            }
        }
    }

    GenerateContentBody {
        system_instruction: (!system.trim().is_empty()).then(|| text_content(None, system)),
        contents: request.turns.iter().map(to_content).collect(),
        generation_config: Some(config),
    }
}

/// Gemini 客户端
pub struct GeminiClient {
    client: Client,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, AiError> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AiError::MissingApiKey(SERVICE))
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn post(&self, model: &str, body: &GenerateContentBody) -> Result<GenerateContentResponse, AiError> {
        let key = self.api_key()?;
        let url = self.generate_url(model);

        tracing::debug!(url = %url, turns = body.contents.len(), "Sending Gemini request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::from_transport(e, SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            return Err(AiError::Service(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl AiProviderPort for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let body = build_body(&request);

        let text = self.post(&model, &body).await?.text();
        tracing::info!(model = %model, chars = text.len(), "Gemini generation completed");
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        let Ok(key) = self.api_key() else {
            return false;
        };
        let url = format!("{}/v1beta/models", self.config.base_url.trim_end_matches('/'));
        match self
            .client
            .get(&url)
            .query(&[("key", key)])
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ImageGeneratorPort for GeminiClient {
    async fn generate_image(&self, request: ImageRequest) -> Result<ImageOutput, AiError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.image_model.clone());
        let body = GenerateContentBody {
            system_instruction: None,
            contents: vec![text_content(None, request.prompt)],
            generation_config: None,
        };

        let data = self
            .post(&model, &body)
            .await?
            .inline_image()
            .ok_or_else(|| {
                AiError::InvalidResponse("No image data found in Gemini response.".to_string())
            })?;

        tracing::info!(model = %model, bytes = data.len(), "Gemini image generated");
        Ok(ImageOutput::Base64 { data })
    }
}
