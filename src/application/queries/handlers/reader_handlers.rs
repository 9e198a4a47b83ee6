//! Reader Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::queries::{HighlightCodex, PaginateResponse, PaginateText};
use crate::domain::reader::{paginate, CodexHighlighter, HighlightSpan, PageLayout, TextMeasurer};

/// PaginateText Handler
pub struct PaginateTextHandler {
    measurer: Arc<dyn TextMeasurer>,
    default_layout: PageLayout,
}

impl PaginateTextHandler {
    pub fn new(measurer: Arc<dyn TextMeasurer>, default_layout: PageLayout) -> Self {
        Self {
            measurer,
            default_layout,
        }
    }

    pub fn handle(&self, query: PaginateText) -> Result<PaginateResponse, ApplicationError> {
        let layout = query.layout.unwrap_or(self.default_layout);
        if layout.page_height.is_nan() || layout.page_height <= 0.0 {
            return Err(ApplicationError::validation("pageHeight must be positive"));
        }
        if !(0.0..=1.0).contains(&layout.fill_ratio) || layout.fill_ratio == 0.0 {
            return Err(ApplicationError::validation("fillRatio must be in (0, 1]"));
        }

        let pages = paginate(&query.text, &layout, self.measurer.as_ref());
        tracing::debug!(chars = query.text.len(), pages = pages.len(), "Text paginated");

        Ok(PaginateResponse {
            page_count: pages.len(),
            pages,
        })
    }
}

/// HighlightCodex Handler
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightCodexHandler;

impl HighlightCodexHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, query: HighlightCodex) -> Vec<HighlightSpan> {
        CodexHighlighter::new(&query.codex).spans(&query.text)
    }
}
