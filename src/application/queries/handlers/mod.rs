//! Query Handlers 实现

mod gallery_handlers;
mod project_handlers;
mod reader_handlers;

pub use gallery_handlers::*;
pub use project_handlers::*;
pub use reader_handlers::*;
