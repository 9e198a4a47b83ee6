//! Assistant Context - AI 写作助手
//!
//! 设置、节奏判定、提示词与返回解析。不包含任何网络调用。

pub mod decoder;
pub mod pacing;
pub mod prompts;
pub mod settings;

pub use decoder::{
    clean_json_string, decode_continuation, decode_entities, ContinuationReply, DecodeError,
    ExtractedEntity,
};
pub use pacing::{PacingAdvice, PacingAudience, PacingLevel};
pub use prompts::{
    ActiveSceneContext, ChatMessage, ChatRole, Prompt, StoryStructureContext,
};
pub use settings::{
    AiProvider, AiSettings, ContextSize, ContinuationLength, ContinuationMode, ImageProvider,
    StoryAction,
};
