//! AI Command Handlers
//!
//! 除开篇、配图与实体扫描外，AI 调用失败都降级为安全默认值，不向调用方报错

use chrono::Utc;

use crate::application::commands::{
    ChatWithCodex, ContinueStory, DecideAction, ExtractEntities, GenerateCodexEntry,
    GenerateImage, GenerateImagePrompt, GenerateOpening,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AiProviderRegistry, GenerateRequest, ImageGeneratorRegistry, ImageOutput, ImageRequest,
};
use crate::domain::assistant::prompts;
use crate::domain::assistant::{
    decode_continuation, decode_entities, ChatMessage, ContinuationReply, StoryAction,
};
use crate::domain::project::CodexEntry;

/// 对话失败时返回给用户的文本
pub const CHAT_ERROR_REPLY: &str = "I encountered an error accessing the creative matrix.";

const CONTINUATION_TEMPERATURE: f32 = 0.8;
const DECISION_TEMPERATURE: f32 = 0.3;
const DECISION_MAX_TOKENS: u32 = 50;
const OPENING_TEMPERATURE: f32 = 0.9;
const OPENING_MAX_TOKENS: u32 = 4096;
const ENTITY_MAX_TOKENS: u32 = 4096;

const SMART_JSON_HINT: &str =
    "Output JSON strictly. Escape all newlines in strings as \\n. No markdown.";
const ENTITY_JSON_HINT: &str =
    "Output strictly JSON array of objects with keys: name, category, description, tags. No markdown.";

// ============================================================================
// ContinueStory
// ============================================================================

/// 普通续写
#[derive(Clone)]
pub struct ContinueStoryHandler {
    providers: AiProviderRegistry,
}

impl ContinueStoryHandler {
    pub fn new(providers: AiProviderRegistry) -> Self {
        Self { providers }
    }

    pub async fn handle(&self, command: ContinueStory) -> Result<String, ApplicationError> {
        let prompt = prompts::plain_continuation(
            &command.text,
            &command.codex,
            command.instruction(),
            command.language,
            &command.settings,
            command.structure.as_ref(),
        );
        let request = GenerateRequest::from_prompt(prompt)
            .with_settings(&command.settings)
            .with_temperature(CONTINUATION_TEMPERATURE)
            .with_max_tokens(command.settings.length().max_tokens());

        let text = self
            .providers
            .get(command.settings.provider)
            .generate(request)
            .await?;

        tracing::debug!(
            provider = %command.settings.provider,
            output_chars = text.chars().count(),
            "Story continuation generated"
        );
        Ok(text)
    }
}

// ============================================================================
// DecideAction
// ============================================================================

/// 判定下一步是续写、新场景还是新章节
#[derive(Clone)]
pub struct DecideActionHandler {
    providers: AiProviderRegistry,
}

impl DecideActionHandler {
    pub fn new(providers: AiProviderRegistry) -> Self {
        Self { providers }
    }

    /// 显式指定时直接返回；模型输出无法识别或调用失败时返回 continue
    pub async fn handle(&self, command: DecideAction) -> StoryAction {
        if let Some(action) = command.settings.explicit_action {
            return action;
        }

        let prompt = prompts::decide_action(
            &command.text,
            &command.codex,
            command.language,
            &command.settings,
            command.structure.as_ref(),
        );
        let request = GenerateRequest::from_prompt(prompt)
            .with_settings(&command.settings)
            .with_temperature(DECISION_TEMPERATURE)
            .with_max_tokens(DECISION_MAX_TOKENS);

        match self
            .providers
            .get(command.settings.provider)
            .generate(request)
            .await
        {
            Ok(raw) => {
                let word = raw.trim().to_lowercase();
                StoryAction::parse(&word).unwrap_or_else(|| {
                    tracing::debug!(reply = %word, "Unrecognized action decision, using continue");
                    StoryAction::Continue
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Action decision failed, using continue");
                StoryAction::Continue
            }
        }
    }
}

// ============================================================================
// SmartContinue
// ============================================================================

/// 智能续写：判定动作后按 JSON 生成，失败时退回普通续写
#[derive(Clone)]
pub struct SmartContinueHandler {
    providers: AiProviderRegistry,
    decide: DecideActionHandler,
    plain: ContinueStoryHandler,
}

impl SmartContinueHandler {
    pub fn new(providers: AiProviderRegistry) -> Self {
        Self {
            decide: DecideActionHandler::new(providers.clone()),
            plain: ContinueStoryHandler::new(providers.clone()),
            providers,
        }
    }

    pub async fn handle(&self, command: ContinueStory) -> Result<ContinuationReply, ApplicationError> {
        let action = self.decide.handle(DecideAction::from(&command)).await;

        match self.generate(&command, action).await {
            Ok(reply) => {
                tracing::info!(
                    requested = %action,
                    action = %reply.action,
                    content_chars = reply.content.chars().count(),
                    "Smart continuation generated"
                );
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Smart continuation failed, falling back to plain continuation"
                );
                let content = self.plain.handle(command).await?;
                Ok(ContinuationReply::continue_with(content))
            }
        }
    }

    async fn generate(
        &self,
        command: &ContinueStory,
        action: StoryAction,
    ) -> Result<ContinuationReply, ApplicationError> {
        let prompt = prompts::smart_continuation(
            &command.text,
            &command.codex,
            command.instruction(),
            command.language,
            &command.settings,
            command.structure.as_ref(),
            action,
        );
        let request = GenerateRequest::from_prompt(prompt)
            .with_settings(&command.settings)
            .with_temperature(CONTINUATION_TEMPERATURE)
            .with_max_tokens(command.settings.length().max_tokens())
            .json(
                Some(prompts::smart_continuation_schema(command.language)),
                Some(SMART_JSON_HINT),
            );

        let raw = self
            .providers
            .get(command.settings.provider)
            .generate(request)
            .await?;
        if raw.trim().is_empty() {
            return Err(ApplicationError::ExternalServiceError(
                "No response from AI".to_string(),
            ));
        }

        decode_continuation(&raw).map_err(|e| ApplicationError::ExternalServiceError(e.to_string()))
    }
}

// ============================================================================
// ChatWithCodex
// ============================================================================

#[derive(Clone)]
pub struct ChatWithCodexHandler {
    providers: AiProviderRegistry,
}

impl ChatWithCodexHandler {
    pub fn new(providers: AiProviderRegistry) -> Self {
        Self { providers }
    }

    /// 失败时返回固定的致歉文本
    pub async fn handle(&self, command: ChatWithCodex) -> String {
        let system_prompt = prompts::chat_system(
            &command.codex,
            command.language,
            command.active_scene.as_ref(),
        );
        let mut turns = command.history;
        turns.push(ChatMessage::user(command.message));

        let request = GenerateRequest {
            system_prompt,
            turns,
            ..Default::default()
        }
        .with_settings(&command.settings);

        match self
            .providers
            .get(command.settings.provider)
            .generate(request)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "Chat with codex failed");
                CHAT_ERROR_REPLY.to_string()
            }
        }
    }
}

// ============================================================================
// GenerateCodexEntry
// ============================================================================

#[derive(Clone)]
pub struct GenerateCodexEntryHandler {
    providers: AiProviderRegistry,
}

impl GenerateCodexEntryHandler {
    pub fn new(providers: AiProviderRegistry) -> Self {
        Self { providers }
    }

    /// 失败时返回空字符串
    pub async fn handle(&self, command: GenerateCodexEntry) -> String {
        let prompt = prompts::codex_entry(
            &command.name,
            &command.category,
            &command.context,
            command.language,
        );
        let request = GenerateRequest::from_prompt(prompt).with_settings(&command.settings);

        match self
            .providers
            .get(command.settings.provider)
            .generate(request)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(name = %command.name, error = %e, "Codex entry generation failed");
                String::new()
            }
        }
    }
}

// ============================================================================
// ExtractEntities
// ============================================================================

/// Codex 扫描
///
/// 网络错误向上返回；返回内容无法解析时按正则恢复，仍无结果则为空列表
#[derive(Clone)]
pub struct ExtractEntitiesHandler {
    providers: AiProviderRegistry,
}

impl ExtractEntitiesHandler {
    pub fn new(providers: AiProviderRegistry) -> Self {
        Self { providers }
    }

    pub async fn handle(&self, command: ExtractEntities) -> Result<Vec<CodexEntry>, ApplicationError> {
        let prompt =
            prompts::extract_entities(&command.text, &command.existing_names, command.language);
        let request = GenerateRequest::from_prompt(prompt)
            .with_settings(&command.settings)
            .with_max_tokens(ENTITY_MAX_TOKENS)
            .json(Some(prompts::entity_schema()), Some(ENTITY_JSON_HINT));

        let raw = self
            .providers
            .get(command.settings.provider)
            .generate(request)
            .await?;

        let now = Utc::now().timestamp_millis();
        let entries: Vec<CodexEntry> = decode_entities(&raw)
            .into_iter()
            .enumerate()
            .map(|(n, entity)| CodexEntry {
                id: format!("auto_{now}_{n}"),
                name: entity.name,
                category: entity.category,
                description: entity.description,
                tags: entity.tags,
            })
            .collect();

        tracing::info!(found = entries.len(), "Codex scan completed");
        Ok(entries)
    }
}

// ============================================================================
// GenerateOpening
// ============================================================================

#[derive(Clone)]
pub struct GenerateOpeningHandler {
    providers: AiProviderRegistry,
}

impl GenerateOpeningHandler {
    pub fn new(providers: AiProviderRegistry) -> Self {
        Self { providers }
    }

    pub async fn handle(&self, command: GenerateOpening) -> Result<String, ApplicationError> {
        if command.title.trim().is_empty() {
            return Err(ApplicationError::validation("Title is required"));
        }

        let prompt = prompts::novel_opening(
            &command.title,
            &command.author,
            &command.genre,
            &command.subgenre,
            command.language,
        );
        let request = GenerateRequest::from_prompt(prompt)
            .with_settings(&command.settings)
            .with_temperature(OPENING_TEMPERATURE)
            .with_max_tokens(OPENING_MAX_TOKENS);

        let text = self
            .providers
            .get(command.settings.provider)
            .generate(request)
            .await?;

        tracing::info!(title = %command.title, "Novel opening generated");
        Ok(text)
    }
}

// ============================================================================
// Image
// ============================================================================

#[derive(Clone)]
pub struct GenerateImagePromptHandler {
    providers: AiProviderRegistry,
}

impl GenerateImagePromptHandler {
    pub fn new(providers: AiProviderRegistry) -> Self {
        Self { providers }
    }

    pub async fn handle(&self, command: GenerateImagePrompt) -> Result<String, ApplicationError> {
        if command.selected_text.trim().is_empty() {
            return Err(ApplicationError::validation("Selected text is empty"));
        }

        let prompt = prompts::image_description(&command.selected_text);
        let request = GenerateRequest::from_prompt(prompt).with_settings(&command.settings);

        Ok(self
            .providers
            .get(command.settings.provider)
            .generate(request)
            .await?)
    }
}

#[derive(Clone)]
pub struct GenerateImageHandler {
    generators: ImageGeneratorRegistry,
}

impl GenerateImageHandler {
    pub fn new(generators: ImageGeneratorRegistry) -> Self {
        Self { generators }
    }

    pub async fn handle(&self, command: GenerateImage) -> Result<ImageOutput, ApplicationError> {
        if command.prompt.trim().is_empty() {
            return Err(ApplicationError::validation("Image prompt is empty"));
        }

        let provider = command.settings.image_provider.unwrap_or_default();
        let request = ImageRequest::new(command.prompt, &command.settings);
        let output = self.generators.get(provider).generate_image(request).await?;

        let kind = match &output {
            ImageOutput::Base64 { .. } => "base64",
            ImageOutput::Url { .. } => "url",
        };
        tracing::info!(provider = ?provider, kind, "Image generated");
        Ok(output)
    }
}
