//! Persistence Layer - 画廊持久化
//!
//! 本地 SQLite 与托管 Supabase 两种实现

pub mod sqlite;
pub mod supabase;

pub use self::sqlite::SqliteGalleryRepository;
pub use self::supabase::SupabaseGalleryRepository;
