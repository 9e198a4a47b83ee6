//! Command Handlers

mod ai_handlers;
mod feed_handlers;
mod gallery_handlers;
mod project_handlers;

#[cfg(test)]
pub(crate) mod test_support;

pub use ai_handlers::*;
pub use feed_handlers::*;
pub use gallery_handlers::*;
pub use project_handlers::*;
