//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod ai_provider;
mod feed_store;
mod identity;
mod image_generator;
mod repositories;

pub use ai_provider::{AiError, AiProviderPort, AiProviderRegistry, GenerateRequest, ResponseFormat};
pub use feed_store::{FeedEntry, FeedStoreError, FeedStorePort};
pub use identity::{IdentityError, IdentityPort};
pub use image_generator::{ImageGeneratorPort, ImageGeneratorRegistry, ImageOutput, ImageRequest};
pub use repositories::{GalleryRepositoryPort, RepositoryError};
