//! OpenAI 兼容图片生成客户端
//!
//! POST {base}/images/generations，优先 b64_json；只返回 url 时尝试下载转 base64，
//! 下载失败则直接返回 url

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{error_body, is_printable_ascii};
use crate::application::ports::{AiError, ImageGeneratorPort, ImageOutput, ImageRequest};

const SERVICE: &str = "Image";

#[derive(Debug, Clone)]
pub struct OpenAiImageClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub size: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiImageClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            timeout_secs: 180,
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageGenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize, Default)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize, Default)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// 响应中的图片来源
#[derive(Debug, PartialEq, Eq)]
enum ImageSource {
    Inline(String),
    Remote(String),
}

impl ImageGenerationResponse {
    fn source(self) -> Option<ImageSource> {
        let first = self.data.into_iter().next()?;
        match (first.b64_json, first.url) {
            (Some(data), _) if !data.is_empty() => Some(ImageSource::Inline(data)),
            (_, Some(url)) if !url.is_empty() => Some(ImageSource::Remote(url)),
            _ => None,
        }
    }
}

pub struct OpenAiImageClient {
    client: Client,
    config: OpenAiImageClientConfig,
}

impl OpenAiImageClient {
    pub fn new(config: OpenAiImageClientConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn download_base64(&self, url: &str) -> Result<String, AiError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AiError::from_transport(e, SERVICE))?;
        if !response.status().is_success() {
            return Err(AiError::Service(format!("HTTP {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;
        Ok(STANDARD.encode(bytes))
    }
}

#[async_trait]
impl ImageGeneratorPort for OpenAiImageClient {
    async fn generate_image(&self, request: ImageRequest) -> Result<ImageOutput, AiError> {
        let key = request
            .api_key
            .as_deref()
            .or(self.config.api_key.as_deref())
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AiError::MissingApiKey(SERVICE))?;
        if !is_printable_ascii(key) {
            return Err(AiError::InvalidApiKey(SERVICE));
        }

        let base_url = request.base_url.as_deref().unwrap_or(&self.config.base_url);
        let url = format!("{}/images/generations", base_url.trim_end_matches('/'));
        let body = ImageGenerationBody {
            model: request.model.as_deref().unwrap_or(&self.config.model),
            prompt: &request.prompt,
            size: request.size.as_deref().unwrap_or(&self.config.size),
            response_format: "b64_json",
        };

        tracing::debug!(url = %url, model = %body.model, size = %body.size, "Sending image request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::from_transport(e, SERVICE))?;

        if !response.status().is_success() {
            let error_text = error_body(response).await;
            return Err(AiError::Service(format!("Image API Error: {}", error_text)));
        }

        let source = response
            .json::<ImageGenerationResponse>()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?
            .source()
            .ok_or_else(|| {
                AiError::InvalidResponse(
                    "No image data (b64_json or url) found in response.".to_string(),
                )
            })?;

        match source {
            ImageSource::Inline(data) => Ok(ImageOutput::Base64 { data }),
            ImageSource::Remote(url) => match self.download_base64(&url).await {
                Ok(data) => Ok(ImageOutput::Base64 { data }),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to download image, returning URL instead");
                    Ok(ImageOutput::Url { url })
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Option<ImageSource> {
        serde_json::from_value::<ImageGenerationResponse>(value)
            .unwrap()
            .source()
    }

    #[test]
    fn test_source_prefers_inline() {
        assert_eq!(
            parse(json!({"data": [{"b64_json": "AAA", "url": "http://x"}]})),
            Some(ImageSource::Inline("AAA".to_string()))
        );
        assert_eq!(
            parse(json!({"data": [{"url": "http://x/img.png"}]})),
            Some(ImageSource::Remote("http://x/img.png".to_string()))
        );
        assert_eq!(parse(json!({"data": []})), None);
        assert_eq!(parse(json!({})), None);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = OpenAiImageClient::new(OpenAiImageClientConfig::default()).unwrap();
        let err = client
            .generate_image(ImageRequest {
                prompt: "a lighthouse".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey("Image")));
    }
}
