//! DeepSeek Client - OpenAI 兼容的 chat/completions 接口

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{error_body, is_printable_ascii};
use crate::application::ports::{AiError, AiProviderPort, GenerateRequest, ResponseFormat};
use crate::domain::assistant::ChatRole;

const SERVICE: &str = "DeepSeek";

/// DeepSeek 客户端配置
#[derive(Debug, Clone)]
pub struct DeepSeekClientConfig {
    pub base_url: String,
    /// 请求未携带 Key 时使用
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
}

impl Default for DeepSeekClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
            timeout_secs: 120,
            default_temperature: 1.0,
            default_max_tokens: 2048,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize, Default)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

/// DeepSeek 客户端
pub struct DeepSeekClient {
    client: Client,
    config: DeepSeekClientConfig,
}

impl DeepSeekClient {
    pub fn new(config: DeepSeekClientConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 请求级 Key 优先；去除首尾空白后必须为可打印 ASCII
    fn resolve_key(&self, request_key: Option<&str>) -> Result<String, AiError> {
        let key = request_key
            .or(self.config.api_key.as_deref())
            .map(str::trim)
            .unwrap_or_default();
        if key.is_empty() {
            return Err(AiError::MissingApiKey(SERVICE));
        }
        if !is_printable_ascii(key) {
            return Err(AiError::InvalidApiKey(SERVICE));
        }
        Ok(key.to_string())
    }

    fn build_body<'a>(&'a self, request: &'a GenerateRequest, model: &'a str) -> ChatCompletionBody<'a> {
        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        if !request.system_prompt.is_empty() {
            messages.push(WireMessage {
                role: "system",
                content: &request.system_prompt,
            });
        }
        if let ResponseFormat::Json {
            hint: Some(hint), ..
        } = &request.format
        {
            messages.push(WireMessage {
                role: "system",
                content: hint,
            });
        }
        messages.extend(request.turns.iter().map(|t| WireMessage {
            role: match t.role {
                ChatRole::User => "user",
                ChatRole::Model => "assistant",
            },
            content: &t.text,
        }));

        ChatCompletionBody {
            model,
            messages,
            temperature: request.temperature.unwrap_or(self.config.default_temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.default_max_tokens),
            stream: false,
            response_format: request
                .format
                .is_json()
                .then_some(WireResponseFormat { kind: "json_object" }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl AiProviderPort for DeepSeekClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError> {
        let key = self.resolve_key(request.api_key.as_deref())?;
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let body = self.build_body(&request, model);

        tracing::debug!(
            model = %model,
            messages = body.messages.len(),
            json = request.format.is_json(),
            "Sending DeepSeek request"
        );

        let response = self
            .client
            .post(self.url("/chat/completions"))
            .bearer_auth(&key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::from_transport(e, SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            return Err(AiError::Service(format!(
                "DeepSeek API Error: {} - {}",
                status, error_text
            )));
        }

        let content = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?
            .content();

        tracing::info!(model = %model, chars = content.len(), "DeepSeek generation completed");
        Ok(content)
    }

    async fn health_check(&self) -> bool {
        let Ok(key) = self.resolve_key(None) else {
            return false;
        };
        match self
            .client
            .get(self.url("/models"))
            .bearer_auth(key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assistant::ChatMessage;
    use serde_json::json;

    fn client(api_key: Option<&str>) -> DeepSeekClient {
        DeepSeekClient::new(DeepSeekClientConfig {
            api_key: api_key.map(str::to_string),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_key_resolution() {
        let configured = client(Some("  sk-config  "));
        assert_eq!(configured.resolve_key(None).unwrap(), "sk-config");
        assert_eq!(configured.resolve_key(Some("sk-req")).unwrap(), "sk-req");
        assert!(matches!(
            configured.resolve_key(Some("sk-密钥")),
            Err(AiError::InvalidApiKey("DeepSeek"))
        ));

        let missing = client(None);
        assert!(matches!(
            missing.resolve_key(Some("   ")),
            Err(AiError::MissingApiKey("DeepSeek"))
        ));
    }

    #[test]
    fn test_body_defaults_and_json_mode() {
        let deepseek = client(Some("k"));
        let request = GenerateRequest {
            system_prompt: "sys".to_string(),
            turns: vec![
                ChatMessage::user("a"),
                ChatMessage {
                    role: ChatRole::Model,
                    text: "b".to_string(),
                },
            ],
            ..Default::default()
        }
        .json(None, Some("JSON only"));

        let value = serde_json::to_value(deepseek.build_body(&request, "deepseek-chat")).unwrap();
        assert_eq!(value["temperature"], 1.0);
        assert_eq!(value["max_tokens"], 2048);
        assert_eq!(value["stream"], false);
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][1]["content"], "JSON only");
        assert_eq!(value["messages"][3]["role"], "assistant");
    }

    #[test]
    fn test_response_content() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "new_scene"}}]
        }))
        .unwrap();
        assert_eq!(response.content(), "new_scene");

        let empty: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(empty.content(), "");
    }
}
