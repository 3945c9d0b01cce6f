use crate::annotate::{annotate, parse_requests, AnnotationReport, PdfAnnotator};
use crate::error::{Result, SegmentError};
use crate::extractor::BlockExtractor;
use crate::format::DocumentFormat;
use crate::models::{HighlightThresholds, Payload, SegmentationOptions};
use crate::segments::{summarize, SegmentBuilder};
use crate::sentences::RuleBasedSplitter;
use std::fs;
use std::path::Path;
use tracing::info;

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(SegmentError::NotFound(path.to_path_buf()))
    }
}

/// Extraction pipeline: blocks, sentence chunks, numbered segments.
pub fn extract_segments(path: &Path, options: SegmentationOptions) -> Result<Payload> {
    ensure_exists(path)?;
    let format = DocumentFormat::from_path(path)?;

    let splitter = RuleBasedSplitter::new()?;
    let builder = SegmentBuilder::new(&splitter, options)?;
    let extractor = BlockExtractor::with_default_readers()?;

    let blocks = extractor.extract(path, format)?;
    let segments = builder.build(&blocks);
    let payload = summarize(segments, &path.to_string_lossy());

    info!(
        path = %path.display(),
        segments = payload.num_segments,
        total_tokens = payload.total_tokens,
        "segmented document"
    );

    Ok(payload)
}

/// Annotation pipeline: scored segments from `segments_path` become highlights
/// painted onto a copy of `source` written to `output`.
pub fn annotate_pdf(
    source: &Path,
    segments_path: &Path,
    output: &Path,
    thresholds: &HighlightThresholds,
) -> Result<AnnotationReport> {
    ensure_exists(source)?;
    if DocumentFormat::from_path(source).ok() != Some(DocumentFormat::Pdf) {
        return Err(SegmentError::UnsupportedFormat(
            "only PDF annotation is supported".to_string(),
        ));
    }

    ensure_exists(segments_path)?;
    let requests = parse_requests(&fs::read_to_string(segments_path)?)?;

    let mut annotator = PdfAnnotator::open(source)?;
    annotate(&mut annotator, &requests, thresholds, output)
}
