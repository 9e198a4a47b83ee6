//! AI Adapters - 文本/图片生成服务客户端

mod deepseek_client;
mod gemini_client;
mod openai_image_client;
mod scripted_client;

pub use deepseek_client::{DeepSeekClient, DeepSeekClientConfig};
pub use gemini_client::{GeminiClient, GeminiClientConfig};
pub use openai_image_client::{OpenAiImageClient, OpenAiImageClientConfig};
pub use scripted_client::ScriptedAiClient;

/// Key 只能包含可打印 ASCII 字符（HTTP 头限制）
pub(crate) fn is_printable_ascii(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| (' '..='~').contains(&c))
}

/// 读取错误响应体（失败时为空）
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}
