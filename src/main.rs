//! NovelFlow - 小说创作工作室后端
//!
//! - Domain: project/, assistant/, reader/, gallery/
//! - Application: commands, queries, ports
//! - Infrastructure: http, adapters, persistence, identity, memory, events

use std::sync::Arc;
use std::time::Duration;

use novelflow::application::{
    AiProviderPort, AiProviderRegistry, CloseFeedHandler, GalleryRepositoryPort,
    ImageGeneratorPort, ImageGeneratorRegistry,
};
use novelflow::config::{load_config, print_config, AppConfig, GalleryBackend};
use novelflow::infrastructure::adapters::{
    DeepSeekClient, DeepSeekClientConfig, GeminiClient, GeminiClientConfig, OpenAiImageClient,
    OpenAiImageClientConfig, ScriptedAiClient,
};
use novelflow::infrastructure::events::EventPublisher;
use novelflow::infrastructure::http::{AppState, HttpServer};
use novelflow::infrastructure::identity::FileIdentityStore;
use novelflow::infrastructure::memory::InMemoryFeedStore;
use novelflow::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteGalleryRepository,
};
use novelflow::infrastructure::persistence::supabase::{SupabaseConfig, SupabaseGalleryRepository};

/// 脚本化客户端在没有预置回复时返回的文本
const SCRIPTED_REPLY: &str = "The story continues.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("NovelFlow - studio backend v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    // AI 客户端（启动时构造一次，经端口注入）
    let (providers, image_generators) = build_ai_clients(&config)?;

    // 画廊仓储
    let gallery_repo = build_gallery_repo(&config).await?;

    // 本地身份
    let identity = FileIdentityStore::open(&config.identity.path)
        .map_err(|e| anyhow::anyhow!("Failed to open identity file: {}", e))?
        .arc();

    let event_publisher = EventPublisher::new().arc();
    let feed_store = InMemoryFeedStore::new().arc();

    // 后台清理空闲信息流
    let cleaner = CloseFeedHandler::new(feed_store.clone(), event_publisher.clone());
    let idle_secs = config.gallery.feed_idle_secs;
    let interval_secs = config.gallery.cleanup_interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            cleaner.close_expired(idle_secs);
        }
    });

    let state = AppState::new(
        providers,
        image_generators,
        gallery_repo,
        feed_store,
        identity,
        event_publisher,
        config.gallery.page_size,
        config.reader.layout(),
    );

    let server = HttpServer::new(&config.server, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},novelflow={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_ai_clients(
    config: &AppConfig,
) -> anyhow::Result<(AiProviderRegistry, ImageGeneratorRegistry)> {
    if config.ai.scripted {
        tracing::warn!("Using scripted AI client, no model will be called");
        let scripted = ScriptedAiClient::new(SCRIPTED_REPLY).arc();
        return Ok((
            AiProviderRegistry::single(scripted.clone()),
            ImageGeneratorRegistry::new(scripted.clone(), scripted),
        ));
    }

    let gemini = Arc::new(GeminiClient::new(GeminiClientConfig {
        base_url: config.ai.gemini_base_url.clone(),
        api_key: config.ai.gemini_api_key.clone(),
        model: config.ai.gemini_model.clone(),
        image_model: config.image.gemini_model.clone(),
        timeout_secs: config.ai.timeout_secs,
    })?);

    let deepseek: Arc<dyn AiProviderPort> = Arc::new(DeepSeekClient::new(DeepSeekClientConfig {
        base_url: config.ai.deepseek_base_url.clone(),
        api_key: config.ai.deepseek_api_key.clone(),
        model: config.ai.deepseek_model.clone(),
        timeout_secs: config.ai.timeout_secs,
        ..DeepSeekClientConfig::default()
    })?);

    let openai_image: Arc<dyn ImageGeneratorPort> =
        Arc::new(OpenAiImageClient::new(OpenAiImageClientConfig {
            base_url: config.image.openai_base_url.clone(),
            api_key: config.image.openai_api_key.clone(),
            model: config.image.openai_model.clone(),
            size: config.image.size.clone(),
            timeout_secs: config.image.timeout_secs,
        })?);

    Ok((
        AiProviderRegistry::new(gemini.clone(), deepseek),
        ImageGeneratorRegistry::new(gemini, openai_image),
    ))
}

async fn build_gallery_repo(config: &AppConfig) -> anyhow::Result<Arc<dyn GalleryRepositoryPort>> {
    match config.gallery.backend {
        GalleryBackend::Supabase => {
            let supabase = SupabaseConfig::new(
                config.gallery.supabase_url.clone(),
                config.gallery.supabase_anon_key.clone(),
            );
            Ok(Arc::new(SupabaseGalleryRepository::new(supabase)?))
        }
        GalleryBackend::Sqlite => {
            if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let db_config = DatabaseConfig {
                database_url: config.database.database_url(),
                max_connections: config.database.max_connections,
            };
            let pool = create_pool(&db_config).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(SqliteGalleryRepository::new(pool)))
        }
    }
}
