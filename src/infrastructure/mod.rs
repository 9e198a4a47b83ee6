//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;
pub mod http;
pub mod identity;
pub mod memory;
pub mod persistence;

pub use events::EventPublisher;
pub use identity::FileIdentityStore;
pub use memory::InMemoryFeedStore;
pub use persistence::{SqliteGalleryRepository, SupabaseGalleryRepository};
