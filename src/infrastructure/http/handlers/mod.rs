//! HTTP Handlers
//!
//! 每个处理器只做 DTO 与命令/查询之间的转换，业务逻辑在应用层

mod ai;
mod feed;
mod gallery;
mod identity;
mod ping;
mod project;
mod reader;
mod websocket;

pub use ai::*;
pub use feed::*;
pub use gallery::*;
pub use identity::*;
pub use ping::*;
pub use project::*;
pub use reader::*;
pub use websocket::*;
