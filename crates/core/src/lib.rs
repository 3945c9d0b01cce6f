pub mod annotate;
pub mod chunking;
pub mod error;
pub mod extractor;
pub mod format;
pub mod highlight;
pub mod models;
mod pdf;
pub mod pipeline;
pub mod segments;
pub mod sentences;
pub mod traits;

pub use annotate::{
    annotate, parse_requests, plan_highlight, AnnotationReport, PdfAnnotator, SkipReason,
    HIGHLIGHT_OPACITY,
};
pub use chunking::{word_count, Chunks, SentenceChunker};
pub use error::{Result, SegmentError};
pub use extractor::{decode_pdf_string, BlockExtractor, DocxBlockReader, PdfBlockReader};
pub use format::DocumentFormat;
pub use highlight::classify;
pub use models::{
    Block, BoundingBox, Highlight, HighlightColor, HighlightRequest, HighlightThresholds,
    Payload, Segment, SegmentationOptions, DEFAULT_SEGMENT_TOKENS,
};
pub use pipeline::{annotate_pdf, extract_segments};
pub use segments::{summarize, SegmentBuilder};
pub use sentences::RuleBasedSplitter;
pub use traits::{DocumentAnnotator, DocumentReader, RawBlock, SentenceSplitter};
