//! AI Provider Port - 文本生成模型抽象
//!
//! 定义文本生成的抽象接口，Gemini / DeepSeek 的实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::assistant::{AiProvider, AiSettings, ChatMessage, Prompt};

/// AI 调用错误
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0} API Key missing. Please configure it in Settings or environment.")]
    MissingApiKey(&'static str),

    #[error("API Key contains invalid characters. Please check your {0} API key.")]
    InvalidApiKey(&'static str),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    Service(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// 由 reqwest 错误转换（区分超时与连接失败）
    pub fn from_transport(e: reqwest::Error, service: &str) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else if e.is_connect() {
            AiError::Network(format!("Cannot connect to {}: {}", service, e))
        } else {
            AiError::Network(e.to_string())
        }
    }
}

/// 输出格式
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// JSON 输出。不支持 schema 的模型改为把 hint 追加到系统提示词
    Json {
        schema: Option<Value>,
        hint: Option<String>,
    },
}

impl ResponseFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, ResponseFormat::Json { .. })
    }
}

/// 一次生成请求
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub system_prompt: String,
    /// 按时间顺序的对话，最后一条为本次用户输入
    pub turns: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub format: ResponseFormat,
    /// 覆盖适配器默认模型
    pub model: Option<String>,
    /// 覆盖适配器配置的 Key
    pub api_key: Option<String>,
}

impl GenerateRequest {
    /// 单轮请求：system + 一条用户消息
    pub fn from_prompt(prompt: Prompt) -> Self {
        Self {
            system_prompt: prompt.system,
            turns: vec![ChatMessage::user(prompt.user)],
            ..Default::default()
        }
    }

    /// 套用请求级设置（模型名、DeepSeek Key）
    pub fn with_settings(mut self, settings: &AiSettings) -> Self {
        self.model = settings.model.clone().filter(|m| !m.trim().is_empty());
        if settings.provider == AiProvider::Deepseek {
            self.api_key = settings
                .deepseek_api_key
                .clone()
                .filter(|k| !k.trim().is_empty());
        }
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn json(mut self, schema: Option<Value>, hint: Option<&str>) -> Self {
        self.format = ResponseFormat::Json {
            schema,
            hint: hint.map(str::to_string),
        };
        self
    }
}

/// AI Provider Port
///
/// 外部文本生成服务的抽象接口
#[async_trait]
pub trait AiProviderPort: Send + Sync {
    /// 生成文本，返回模型输出的原始字符串
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

/// 按 provider 选择实现
#[derive(Clone)]
pub struct AiProviderRegistry {
    gemini: Arc<dyn AiProviderPort>,
    deepseek: Arc<dyn AiProviderPort>,
}

impl AiProviderRegistry {
    pub fn new(gemini: Arc<dyn AiProviderPort>, deepseek: Arc<dyn AiProviderPort>) -> Self {
        Self { gemini, deepseek }
    }

    /// 所有 provider 使用同一实现（测试用）
    pub fn single(provider: Arc<dyn AiProviderPort>) -> Self {
        Self {
            gemini: provider.clone(),
            deepseek: provider,
        }
    }

    pub fn get(&self, provider: AiProvider) -> Arc<dyn AiProviderPort> {
        match provider {
            AiProvider::Gemini => self.gemini.clone(),
            AiProvider::Deepseek => self.deepseek.clone(),
        }
    }
}
