//! AI Handlers
//!
//! 续写、动作判定、Codex 对话与扫描、开篇、配图

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{
    ChatWithCodex, ContinueStory, DecideAction, ExtractEntities, GenerateCodexEntry,
    GenerateImage, GenerateImagePrompt, GenerateOpening, ImageOutput,
};
use crate::domain::assistant::{
    ActiveSceneContext, AiSettings, ChatMessage, ContinuationReply, StoryAction,
    StoryStructureContext,
};
use crate::domain::project::{CodexEntry, WritingLanguage};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Continue / SmartContinue / Decide
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueRequest {
    pub text: String,
    #[serde(default)]
    pub codex: Vec<CodexEntry>,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub language: WritingLanguage,
    #[serde(default)]
    pub settings: AiSettings,
    #[serde(default)]
    pub structure: Option<StoryStructureContext>,
}

impl From<ContinueRequest> for ContinueStory {
    fn from(req: ContinueRequest) -> Self {
        Self {
            text: req.text,
            codex: req.codex,
            instruction: req.instruction,
            language: req.language,
            settings: req.settings,
            structure: req.structure,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

pub async fn continue_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContinueRequest>,
) -> Result<Json<ApiResponse<TextResponse>>, ApiError> {
    let text = state.continue_story_handler.handle(req.into()).await?;
    Ok(Json(ApiResponse::success(TextResponse { text })))
}

pub async fn smart_continue(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContinueRequest>,
) -> Result<Json<ApiResponse<ContinuationReply>>, ApiError> {
    let reply = state.smart_continue_handler.handle(req.into()).await?;
    Ok(Json(ApiResponse::success(reply)))
}

#[derive(Debug, Serialize)]
pub struct DecideResponse {
    pub action: StoryAction,
}

/// 判定失败时退回 continue，不报错
pub async fn decide_action(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContinueRequest>,
) -> Result<Json<ApiResponse<DecideResponse>>, ApiError> {
    let command = DecideAction::from(&ContinueStory::from(req));
    let action = state.decide_action_handler.handle(command).await;
    Ok(Json(ApiResponse::success(DecideResponse { action })))
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub message: String,
    #[serde(default)]
    pub codex: Vec<CodexEntry>,
    #[serde(default)]
    pub language: WritingLanguage,
    #[serde(default)]
    pub settings: AiSettings,
    #[serde(default)]
    pub active_scene: Option<ActiveSceneContext>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }
    let reply = state
        .chat_handler
        .handle(ChatWithCodex {
            history: req.history,
            message: req.message,
            codex: req.codex,
            language: req.language,
            settings: req.settings,
            active_scene: req.active_scene,
        })
        .await;
    Ok(Json(ApiResponse::success(ChatResponse { reply })))
}

// ============================================================================
// Codex
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodexEntryRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub language: WritingLanguage,
    #[serde(default)]
    pub settings: AiSettings,
}

#[derive(Debug, Serialize)]
pub struct CodexEntryResponse {
    pub description: String,
}

pub async fn generate_codex_entry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CodexEntryRequest>,
) -> Result<Json<ApiResponse<CodexEntryResponse>>, ApiError> {
    let description = state
        .generate_codex_entry_handler
        .handle(GenerateCodexEntry {
            name: req.name,
            category: req.category,
            context: req.context,
            language: req.language,
            settings: req.settings,
        })
        .await;
    Ok(Json(ApiResponse::success(CodexEntryResponse { description })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCodexRequest {
    pub text: String,
    #[serde(default)]
    pub existing_names: Vec<String>,
    #[serde(default)]
    pub language: WritingLanguage,
    #[serde(default)]
    pub settings: AiSettings,
}

#[derive(Debug, Serialize)]
pub struct ScanCodexResponse {
    pub entries: Vec<CodexEntry>,
}

pub async fn scan_codex(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanCodexRequest>,
) -> Result<Json<ApiResponse<ScanCodexResponse>>, ApiError> {
    let entries = state
        .extract_entities_handler
        .handle(ExtractEntities {
            text: req.text,
            existing_names: req.existing_names,
            language: req.language,
            settings: req.settings,
        })
        .await?;
    Ok(Json(ApiResponse::success(ScanCodexResponse { entries })))
}

// ============================================================================
// Opening / Image
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningRequest {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub subgenre: String,
    #[serde(default)]
    pub language: WritingLanguage,
    #[serde(default)]
    pub settings: AiSettings,
}

pub async fn generate_opening(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpeningRequest>,
) -> Result<Json<ApiResponse<TextResponse>>, ApiError> {
    let text = state
        .generate_opening_handler
        .handle(GenerateOpening {
            title: req.title,
            author: req.author,
            genre: req.genre,
            subgenre: req.subgenre,
            language: req.language,
            settings: req.settings,
        })
        .await?;
    Ok(Json(ApiResponse::success(TextResponse { text })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePromptRequest {
    pub selected_text: String,
    #[serde(default)]
    pub settings: AiSettings,
}

#[derive(Debug, Serialize)]
pub struct ImagePromptResponse {
    pub prompt: String,
}

pub async fn generate_image_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImagePromptRequest>,
) -> Result<Json<ApiResponse<ImagePromptResponse>>, ApiError> {
    let prompt = state
        .generate_image_prompt_handler
        .handle(GenerateImagePrompt {
            selected_text: req.selected_text,
            settings: req.settings,
        })
        .await?;
    Ok(Json(ApiResponse::success(ImagePromptResponse { prompt })))
}

#[derive(Debug, Deserialize)]
pub struct ImageRequestDto {
    pub prompt: String,
    #[serde(default)]
    pub settings: AiSettings,
}

pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImageRequestDto>,
) -> Result<Json<ApiResponse<ImageOutput>>, ApiError> {
    let image = state
        .generate_image_handler
        .handle(GenerateImage {
            prompt: req.prompt,
            settings: req.settings,
        })
        .await?;
    Ok(Json(ApiResponse::success(image)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continue_request_defaults() {
        let req: ContinueRequest = serde_json::from_str(r#"{"text":"Once."}"#).unwrap();
        let command = ContinueStory::from(req);
        assert_eq!(command.text, "Once.");
        assert_eq!(command.instruction(), "Continue the story naturally.");
        assert!(command.structure.is_none());
    }

    #[test]
    fn test_chat_request_camel_case() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","activeScene":{"sceneTitle":"Gate","sceneContent":"Rain."}}"#,
        )
        .unwrap();
        assert!(req.active_scene.is_some());
        assert!(req.history.is_empty());
    }
}
