//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, GalleryBackend};
use crate::domain::gallery::MAX_PAGE_SIZE;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "NOVELFLOW";

/// 加载应用配置
///
/// # 环境变量示例
/// - `NOVELFLOW_SERVER__PORT=8080`
/// - `NOVELFLOW_AI__GEMINI_API_KEY=...`
/// - `NOVELFLOW_GALLERY__BACKEND=supabase`
/// - `NOVELFLOW_GALLERY__SUPABASE_URL=https://xyz.supabase.co`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// `config_path` 为 None 时搜索工作目录下的默认文件
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("ai.timeout_secs", 120)?
        .set_default("ai.scripted", false)?
        .set_default("gallery.backend", "sqlite")?
        .set_default("gallery.page_size", 12)?
        .set_default("gallery.feed_idle_secs", 1800)?
        .set_default("gallery.cleanup_interval_secs", 60)?
        .set_default("database.path", "data/novelflow.db")?
        .set_default("database.max_connections", 5)?
        .set_default("identity.path", "data/owner_id")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），层级分隔符为双下划线
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    match config.gallery.backend {
        GalleryBackend::Sqlite => {
            if config.database.path.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Database path cannot be empty".to_string(),
                ));
            }
        }
        GalleryBackend::Supabase => {
            if config.gallery.supabase_url.trim().is_empty()
                || config.gallery.supabase_anon_key.trim().is_empty()
            {
                return Err(ConfigError::ValidationError(
                    "Supabase backend requires supabase_url and supabase_anon_key".to_string(),
                ));
            }
        }
    }

    if config.gallery.page_size == 0 || config.gallery.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "Gallery page size must be in 1..={}",
            MAX_PAGE_SIZE
        )));
    }

    if config.gallery.cleanup_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Feed cleanup interval cannot be 0".to_string(),
        ));
    }

    let reader = &config.reader;
    if reader.page_height.is_nan() || reader.page_height <= 0.0 {
        return Err(ConfigError::ValidationError(
            "Reader page height must be positive".to_string(),
        ));
    }
    if reader.fill_ratio.is_nan() || reader.fill_ratio <= 0.0 || reader.fill_ratio > 1.0 {
        return Err(ConfigError::ValidationError(
            "Reader fill ratio must be in (0, 1]".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（Key 只显示是否配置）
pub fn print_config(config: &AppConfig) {
    let configured = |key: &Option<String>| {
        if key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            "configured"
        } else {
            "per-request"
        }
    };

    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.ai.scripted {
        tracing::info!("AI: scripted client");
    } else {
        tracing::info!(
            "Gemini: {} (key {})",
            config.ai.gemini_model,
            configured(&config.ai.gemini_api_key)
        );
        tracing::info!(
            "DeepSeek: {} (key {})",
            config.ai.deepseek_model,
            configured(&config.ai.deepseek_api_key)
        );
    }
    tracing::info!("Image: {} / {}", config.image.gemini_model, config.image.openai_model);
    match config.gallery.backend {
        GalleryBackend::Sqlite => tracing::info!("Gallery: sqlite ({})", config.database.path),
        GalleryBackend::Supabase => {
            tracing::info!("Gallery: supabase ({})", config.gallery.supabase_url)
        }
    }
    tracing::info!("Gallery Page Size: {}", config.gallery.page_size);
    tracing::info!("Feed Idle Timeout: {}s", config.gallery.feed_idle_secs);
    tracing::info!("Identity File: {:?}", config.identity.path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
