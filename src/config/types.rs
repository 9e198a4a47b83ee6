//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::gallery::DEFAULT_PAGE_SIZE;
use crate::domain::reader::pagination::{
    DEFAULT_FILL_RATIO, DEFAULT_PADDING_PX, DEFAULT_PAGE_HEIGHT_PX, DEFAULT_PAGE_WIDTH_PX,
};
use crate::domain::reader::PageLayout;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// 文本模型
    #[serde(default)]
    pub ai: AiConfig,

    /// 配图模型
    #[serde(default)]
    pub image: ImageConfig,

    /// 社区画廊后端
    #[serde(default)]
    pub gallery: GalleryConfig,

    /// 本地 SQLite 画廊
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 本地所有者标识
    #[serde(default)]
    pub identity: IdentityConfig,

    /// 阅读分页默认版式
    #[serde(default)]
    pub reader: ReaderConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// AI 文本模型配置
///
/// Key 可以不配置，由请求中的 AI 设置携带
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default)]
    pub deepseek_api_key: Option<String>,

    #[serde(default = "default_deepseek_base_url")]
    pub deepseek_base_url: String,

    #[serde(default = "default_deepseek_model")]
    pub deepseek_model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,

    /// 使用脚本化客户端代替真实模型（离线演示、联调）
    #[serde(default)]
    pub scripted: bool,
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_deepseek_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}

fn default_ai_timeout() -> u64 {
    120
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: default_gemini_base_url(),
            gemini_model: default_gemini_model(),
            deepseek_api_key: None,
            deepseek_base_url: default_deepseek_base_url(),
            deepseek_model: default_deepseek_model(),
            timeout_secs: default_ai_timeout(),
            scripted: false,
        }
    }
}

/// 配图配置
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Gemini 图片模型
    #[serde(default = "default_gemini_image_model")]
    pub gemini_model: String,

    /// OpenAI 兼容接口
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_image_model")]
    pub openai_model: String,

    #[serde(default = "default_image_size")]
    pub size: String,

    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
}

fn default_gemini_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_image_timeout() -> u64 {
    180
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            gemini_model: default_gemini_image_model(),
            openai_base_url: default_openai_base_url(),
            openai_api_key: None,
            openai_model: default_openai_image_model(),
            size: default_image_size(),
            timeout_secs: default_image_timeout(),
        }
    }
}

/// 画廊后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryBackend {
    #[default]
    Sqlite,
    Supabase,
}

/// 画廊配置
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryConfig {
    #[serde(default)]
    pub backend: GalleryBackend,

    #[serde(default)]
    pub supabase_url: String,

    #[serde(default)]
    pub supabase_anon_key: String,

    /// 每页条数
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// 信息流空闲多久后关闭（秒）
    #[serde(default = "default_feed_idle")]
    pub feed_idle_secs: u64,

    /// 过期信息流清理间隔（秒）
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_feed_idle() -> u64 {
    1800
}

fn default_cleanup_interval() -> u64 {
    60
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            backend: GalleryBackend::default(),
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            page_size: default_page_size(),
            feed_idle_secs: default_feed_idle(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/novelflow.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 身份配置
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// 所有者 id 文件
    #[serde(default = "default_identity_path")]
    pub path: PathBuf,
}

fn default_identity_path() -> PathBuf {
    PathBuf::from("data/owner_id")
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            path: default_identity_path(),
        }
    }
}

/// 阅读分页配置（像素）
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    #[serde(default = "default_page_height")]
    pub page_height: f64,

    /// 单页最多填充的比例
    #[serde(default = "default_fill_ratio")]
    pub fill_ratio: f64,

    #[serde(default = "default_page_width")]
    pub page_width: f64,

    #[serde(default = "default_padding")]
    pub padding: f64,
}

fn default_page_height() -> f64 {
    DEFAULT_PAGE_HEIGHT_PX
}

fn default_fill_ratio() -> f64 {
    DEFAULT_FILL_RATIO
}

fn default_page_width() -> f64 {
    DEFAULT_PAGE_WIDTH_PX
}

fn default_padding() -> f64 {
    DEFAULT_PADDING_PX
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            page_height: default_page_height(),
            fill_ratio: default_fill_ratio(),
            page_width: default_page_width(),
            padding: default_padding(),
        }
    }
}

impl ReaderConfig {
    pub fn layout(&self) -> PageLayout {
        PageLayout {
            page_height: self.page_height,
            fill_ratio: self.fill_ratio,
            page_width: self.page_width,
            padding: self.padding,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
