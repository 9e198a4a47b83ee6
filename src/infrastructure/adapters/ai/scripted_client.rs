//! Scripted AI Client - 离线/测试用的 AI 客户端
//!
//! 按顺序返回预置的回复，队列耗尽后返回固定文本；记录收到的所有请求

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::application::ports::{
    AiError, AiProviderPort, GenerateRequest, ImageGeneratorPort, ImageOutput, ImageRequest,
};

pub struct ScriptedAiClient {
    script: Mutex<VecDeque<Result<String, AiError>>>,
    fallback: String,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedAiClient {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: fallback.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(reply.into()));
        }
    }

    pub fn push_error(&self, error: AiError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
    }

    /// 已收到的文本请求
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn next(&self) -> Result<String, AiError> {
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[async_trait]
impl AiProviderPort for ScriptedAiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError> {
        tracing::debug!(turns = request.turns.len(), "ScriptedAiClient: returning scripted reply");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.next()
    }
}

#[async_trait]
impl ImageGeneratorPort for ScriptedAiClient {
    async fn generate_image(&self, request: ImageRequest) -> Result<ImageOutput, AiError> {
        tracing::debug!(prompt_len = request.prompt.len(), "ScriptedAiClient: returning scripted image");
        self.next().map(|data| ImageOutput::Base64 { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_fallback() {
        let client = ScriptedAiClient::new("fallback");
        client.push_reply("first");
        client.push_error(AiError::Timeout);

        assert_eq!(client.generate(GenerateRequest::default()).await.unwrap(), "first");
        assert!(matches!(
            client.generate(GenerateRequest::default()).await,
            Err(AiError::Timeout)
        ));
        assert_eq!(client.generate(GenerateRequest::default()).await.unwrap(), "fallback");
        assert_eq!(client.requests().len(), 3);
    }
}
