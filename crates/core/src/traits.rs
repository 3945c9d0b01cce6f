use crate::error::Result;
use crate::format::DocumentFormat;
use crate::models::{BoundingBox, HighlightColor};
use std::path::Path;

/// A text block exactly as a reader reports it, before trimming or filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    pub text: String,
    pub page: Option<u32>,
    pub bbox: Option<BoundingBox>,
}

pub trait DocumentReader {
    fn format(&self) -> DocumentFormat;

    /// Blocks in native reading order. Paginated readers report 0-based page indices.
    fn read_blocks(&self, path: &Path) -> Result<Vec<RawBlock>>;
}

pub trait SentenceSplitter {
    fn split(&self, text: &str) -> Vec<String>;
}

pub trait DocumentAnnotator {
    fn page_count(&self) -> usize;

    fn draw_rect(
        &mut self,
        page: usize,
        bbox: &BoundingBox,
        color: HighlightColor,
        opacity: f32,
    ) -> Result<()>;

    fn save(&mut self, output: &Path) -> Result<()>;
}
