//! Supabase Persistence - 托管画廊（PostgREST over HTTP）

mod gallery_repo;

pub use gallery_repo::{SupabaseConfig, SupabaseGalleryRepository};
