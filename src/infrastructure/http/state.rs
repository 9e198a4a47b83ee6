//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    ChangeFeedFilterHandler, ChatWithCodexHandler, CloseFeedHandler, ContinueStoryHandler,
    CreateSnapshotHandler, DecideActionHandler, DeleteSnapshotHandler, ExtractEntitiesHandler,
    FeedEffectRunner, GenerateCodexEntryHandler, GenerateImageHandler,
    GenerateImagePromptHandler, GenerateOpeningHandler, ImportNovelHandler, LikeNovelHandler,
    LoadMoreFeedHandler, OpenFeedHandler, PublishNovelHandler, RestoreSnapshotHandler,
    SmartContinueHandler,
    // Query handlers
    GetFeedHandler, GetGalleryPageHandler, GetProjectStatsHandler, HighlightCodexHandler,
    ListSnapshotsHandler, PaginateTextHandler, PreviewPacingHandler, ReadGalleryNovelHandler,
    TestGalleryConnectionHandler,
    // Ports
    AiProviderRegistry, FeedStorePort, GalleryRepositoryPort, IdentityPort,
    ImageGeneratorRegistry,
};
use crate::domain::reader::{BoxModelMeasurer, PageLayout};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// AI 与画廊客户端在启动时构造一次，通过端口注入
pub struct AppState {
    // ========== Ports ==========
    pub gallery_repo: Arc<dyn GalleryRepositoryPort>,
    pub feed_store: Arc<dyn FeedStorePort>,
    pub identity: Arc<dyn IdentityPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== AI Handlers ==========
    pub continue_story_handler: ContinueStoryHandler,
    pub smart_continue_handler: SmartContinueHandler,
    pub decide_action_handler: DecideActionHandler,
    pub chat_handler: ChatWithCodexHandler,
    pub generate_codex_entry_handler: GenerateCodexEntryHandler,
    pub extract_entities_handler: ExtractEntitiesHandler,
    pub generate_opening_handler: GenerateOpeningHandler,
    pub generate_image_prompt_handler: GenerateImagePromptHandler,
    pub generate_image_handler: GenerateImageHandler,

    // ========== Project Handlers ==========
    pub create_snapshot_handler: CreateSnapshotHandler,
    pub restore_snapshot_handler: RestoreSnapshotHandler,
    pub delete_snapshot_handler: DeleteSnapshotHandler,
    pub get_project_stats_handler: GetProjectStatsHandler,
    pub list_snapshots_handler: ListSnapshotsHandler,
    pub preview_pacing_handler: PreviewPacingHandler,

    // ========== Reader Handlers ==========
    pub paginate_text_handler: PaginateTextHandler,
    pub highlight_codex_handler: HighlightCodexHandler,

    // ========== Gallery Handlers ==========
    pub publish_novel_handler: PublishNovelHandler,
    pub like_novel_handler: LikeNovelHandler,
    pub import_novel_handler: ImportNovelHandler,
    pub get_gallery_page_handler: GetGalleryPageHandler,
    pub read_gallery_novel_handler: ReadGalleryNovelHandler,
    pub test_gallery_connection_handler: TestGalleryConnectionHandler,

    // ========== Feed Handlers ==========
    pub open_feed_handler: OpenFeedHandler,
    pub load_more_feed_handler: LoadMoreFeedHandler,
    pub change_feed_filter_handler: ChangeFeedFilterHandler,
    pub close_feed_handler: CloseFeedHandler,
    pub get_feed_handler: GetFeedHandler,
}

impl AppState {
    /// 创建应用状态
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        providers: AiProviderRegistry,
        image_generators: ImageGeneratorRegistry,
        gallery_repo: Arc<dyn GalleryRepositoryPort>,
        feed_store: Arc<dyn FeedStorePort>,
        identity: Arc<dyn IdentityPort>,
        event_publisher: Arc<EventPublisher>,
        page_size: usize,
        page_layout: PageLayout,
    ) -> Self {
        let runner = FeedEffectRunner::new(
            gallery_repo.clone(),
            feed_store.clone(),
            event_publisher.clone(),
        );

        Self {
            // Ports
            gallery_repo: gallery_repo.clone(),
            feed_store: feed_store.clone(),
            identity,
            event_publisher: event_publisher.clone(),

            // AI
            continue_story_handler: ContinueStoryHandler::new(providers.clone()),
            smart_continue_handler: SmartContinueHandler::new(providers.clone()),
            decide_action_handler: DecideActionHandler::new(providers.clone()),
            chat_handler: ChatWithCodexHandler::new(providers.clone()),
            generate_codex_entry_handler: GenerateCodexEntryHandler::new(providers.clone()),
            extract_entities_handler: ExtractEntitiesHandler::new(providers.clone()),
            generate_opening_handler: GenerateOpeningHandler::new(providers.clone()),
            generate_image_prompt_handler: GenerateImagePromptHandler::new(providers),
            generate_image_handler: GenerateImageHandler::new(image_generators),

            // Project
            create_snapshot_handler: CreateSnapshotHandler::new(),
            restore_snapshot_handler: RestoreSnapshotHandler::new(),
            delete_snapshot_handler: DeleteSnapshotHandler::new(),
            get_project_stats_handler: GetProjectStatsHandler::new(),
            list_snapshots_handler: ListSnapshotsHandler::new(),
            preview_pacing_handler: PreviewPacingHandler::new(),

            // Reader
            paginate_text_handler: PaginateTextHandler::new(
                Arc::new(BoxModelMeasurer::default()),
                page_layout,
            ),
            highlight_codex_handler: HighlightCodexHandler::new(),

            // Gallery
            publish_novel_handler: PublishNovelHandler::new(
                gallery_repo.clone(),
                event_publisher.clone(),
            ),
            like_novel_handler: LikeNovelHandler::new(
                gallery_repo.clone(),
                runner.clone(),
                event_publisher.clone(),
            ),
            import_novel_handler: ImportNovelHandler::new(
                gallery_repo.clone(),
                feed_store.clone(),
                event_publisher.clone(),
            ),
            get_gallery_page_handler: GetGalleryPageHandler::new(gallery_repo.clone(), page_size),
            read_gallery_novel_handler: ReadGalleryNovelHandler::new(gallery_repo.clone()),
            test_gallery_connection_handler: TestGalleryConnectionHandler::new(gallery_repo),

            // Feed
            open_feed_handler: OpenFeedHandler::new(feed_store.clone(), runner.clone(), page_size),
            load_more_feed_handler: LoadMoreFeedHandler::new(runner.clone()),
            change_feed_filter_handler: ChangeFeedFilterHandler::new(runner),
            close_feed_handler: CloseFeedHandler::new(feed_store.clone(), event_publisher),
            get_feed_handler: GetFeedHandler::new(feed_store),
        }
    }
}
