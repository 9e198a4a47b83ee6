//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（AI 提供方、图片生成、画廊仓储、身份、信息流存储）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // AI commands
    ChatWithCodex,
    ContinueStory,
    DecideAction,
    ExtractEntities,
    GenerateCodexEntry,
    GenerateImage,
    GenerateImagePrompt,
    GenerateOpening,
    // Gallery commands
    ChangeFeedFilter,
    CloseFeed,
    ImportNovel,
    LikeNovel,
    LoadMoreFeed,
    OpenFeed,
    PublishNovel,
    // Project commands
    CreateSnapshot,
    DeleteSnapshot,
    RestoreSnapshot,
    // Handlers
    handlers::{
        ChangeFeedFilterHandler, ChatWithCodexHandler, CloseFeedHandler, ContinueStoryHandler,
        CreateSnapshotHandler, DecideActionHandler, DeleteSnapshotHandler, ExtractEntitiesHandler,
        FeedEffectRunner, GenerateCodexEntryHandler, GenerateImageHandler,
        GenerateImagePromptHandler, GenerateOpeningHandler, ImportNovelHandler, LikeNovelHandler,
        LoadMoreFeedHandler, OpenFeedHandler, PublishNovelHandler, RestoreSnapshotHandler,
        SmartContinueHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // AI
    AiError,
    AiProviderPort,
    AiProviderRegistry,
    GenerateRequest,
    ImageGeneratorPort,
    ImageGeneratorRegistry,
    ImageOutput,
    ImageRequest,
    ResponseFormat,
    // Feed store
    FeedEntry,
    FeedStoreError,
    FeedStorePort,
    // Identity
    IdentityError,
    IdentityPort,
    // Repositories
    GalleryRepositoryPort,
    RepositoryError,
};

pub use queries::{
    // Gallery queries
    GetFeed,
    GetGalleryPage,
    ReadGalleryNovel,
    TestGalleryConnection,
    // Project queries
    GetProjectStats,
    ListSnapshots,
    PreviewPacing,
    // Reader queries
    HighlightCodex,
    PaginateText,
    // Handlers
    handlers::{
        GetFeedHandler, GetGalleryPageHandler, GetProjectStatsHandler, HighlightCodexHandler,
        ListSnapshotsHandler, PaginateTextHandler, PreviewPacingHandler, ReadGalleryNovelHandler,
        TestGalleryConnectionHandler,
    },
};
