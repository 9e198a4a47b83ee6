//! HTTP Layer - JSON API + WebSocket
//!
//! 所有业务错误以 HTTP 200 + `{errno, error, data}` 信封返回

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{build_router, HttpServer};
pub use state::AppState;
