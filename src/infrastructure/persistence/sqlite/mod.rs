//! SQLite Persistence - 本地画廊存储

mod database;
mod gallery_repo;

pub use database::*;
pub use gallery_repo::*;
