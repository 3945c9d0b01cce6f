use crate::error::{Result, SegmentError};
use crate::models::{
    BoundingBox, Highlight, HighlightColor, HighlightRequest, HighlightThresholds,
};
use crate::pdf::MediaBox;
use crate::traits::DocumentAnnotator;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

pub const HIGHLIGHT_OPACITY: f32 = 0.25;

/// Why a request produced no highlight. Never surfaced as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    BelowThreshold,
    MissingPage,
    MissingBbox,
    PageOutOfRange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::BelowThreshold => "below every threshold",
            SkipReason::MissingPage => "missing page",
            SkipReason::MissingBbox => "missing or malformed bbox",
            SkipReason::PageOutOfRange => "page out of range",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationReport {
    pub applied: usize,
    pub skipped: usize,
    pub by_color: HashMap<HighlightColor, usize>,
    pub by_skip_reason: HashMap<SkipReason, usize>,
}

impl HighlightRequest {
    /// Lenient read of one externally scored record. Fields that are absent or
    /// of the wrong shape come back as `None`.
    pub fn from_value(value: &Value) -> Self {
        let page = value.get("page").and_then(|page| {
            page.as_i64().or_else(|| {
                page.as_f64()
                    .filter(|number| number.fract() == 0.0 && number.abs() < i64::MAX as f64)
                    .map(|number| number as i64)
            })
        });

        let bbox = value
            .get("bbox")
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<f64>>>())
            .and_then(|values| BoundingBox::from_slice(&values));

        let confidence = value.get("confidence").and_then(|confidence| match confidence {
            Value::String(text) => text.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        });

        Self {
            page,
            bbox,
            confidence,
        }
    }
}

/// Parses the scored-segments document. The top level must be a JSON array;
/// individual records are never rejected here.
pub fn parse_requests(json: &str) -> Result<Vec<HighlightRequest>> {
    let value: Value = serde_json::from_str(json).map_err(|error| {
        SegmentError::MalformedInput(format!("segments JSON is invalid: {error}"))
    })?;

    match value {
        Value::Array(items) => Ok(items.iter().map(HighlightRequest::from_value).collect()),
        _ => Err(SegmentError::MalformedInput(
            "segments JSON must be an array".to_string(),
        )),
    }
}

/// Decides whether a request becomes a highlight on a document of `page_count`
/// pages. A missing confidence counts as 0.
pub fn plan_highlight(
    request: &HighlightRequest,
    thresholds: &HighlightThresholds,
    page_count: usize,
) -> std::result::Result<Highlight, SkipReason> {
    let confidence = request.confidence.unwrap_or(0.0);
    let color = thresholds
        .classify(confidence)
        .ok_or(SkipReason::BelowThreshold)?;
    let page = request.page.ok_or(SkipReason::MissingPage)?;
    let bbox = request.bbox.ok_or(SkipReason::MissingBbox)?;

    let page = usize::try_from(page)
        .ok()
        .filter(|page| *page < page_count)
        .ok_or(SkipReason::PageOutOfRange)?;

    Ok(Highlight { page, bbox, color })
}

/// Draws every qualifying request, then saves exactly once. Nothing is written
/// if drawing fails.
pub fn annotate<A: DocumentAnnotator + ?Sized>(
    annotator: &mut A,
    requests: &[HighlightRequest],
    thresholds: &HighlightThresholds,
    output: &Path,
) -> Result<AnnotationReport> {
    let page_count = annotator.page_count();
    let mut report = AnnotationReport::default();

    for (index, request) in requests.iter().enumerate() {
        match plan_highlight(request, thresholds, page_count) {
            Ok(highlight) => {
                annotator.draw_rect(
                    highlight.page,
                    &highlight.bbox,
                    highlight.color,
                    HIGHLIGHT_OPACITY,
                )?;
                report.applied += 1;
                *report.by_color.entry(highlight.color).or_default() += 1;
            }
            Err(reason) => {
                debug!(index, %reason, "skipped highlight request");
                report.skipped += 1;
                *report.by_skip_reason.entry(reason).or_default() += 1;
            }
        }
    }

    annotator.save(output)?;

    info!(
        output = %output.display(),
        applied = report.applied,
        skipped = report.skipped,
        red = report.by_color.get(&HighlightColor::Red).copied().unwrap_or(0),
        yellow = report.by_color.get(&HighlightColor::Yellow).copied().unwrap_or(0),
        blue = report.by_color.get(&HighlightColor::Blue).copied().unwrap_or(0),
        "annotated document"
    );

    Ok(report)
}

/// Writes highlights as `Square` annotations with a matching appearance stream.
pub struct PdfAnnotator {
    document: Document,
    pages: Vec<ObjectId>,
}

impl PdfAnnotator {
    pub fn open(path: &Path) -> Result<Self> {
        let document = Document::load(path)?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: Document) -> Self {
        let pages = document.get_pages().into_values().collect();
        Self { document, pages }
    }

    fn appearance_stream(width: f64, height: f64, rgb: [f32; 3], opacity: f32) -> Result<Stream> {
        let color = || rgb.iter().map(|channel| Object::Real(*channel)).collect::<Vec<_>>();
        let content = Content {
            operations: vec![
                Operation::new("gs", vec![Object::Name(b"GS0".to_vec())]),
                Operation::new("rg", color()),
                Operation::new("RG", color()),
                Operation::new(
                    "re",
                    vec![
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(width as f32),
                        Object::Real(height as f32),
                    ],
                ),
                Operation::new("B", vec![]),
            ],
        };

        let dictionary = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Resources" => dictionary! {
                "ExtGState" => dictionary! {
                    "GS0" => dictionary! {
                        "Type" => "ExtGState",
                        "CA" => Object::Real(opacity),
                        "ca" => Object::Real(opacity),
                    },
                },
            },
        };

        Ok(Stream::new(dictionary, content.encode()?))
    }

    fn attach_annotation(&mut self, page_id: ObjectId, annotation_id: ObjectId) -> Result<()> {
        let existing = self
            .document
            .get_dictionary(page_id)?
            .get(b"Annots")
            .ok()
            .cloned();

        let annots = match existing {
            Some(Object::Reference(array_id)) => {
                self.document
                    .get_object_mut(array_id)?
                    .as_array_mut()?
                    .push(Object::Reference(annotation_id));
                return Ok(());
            }
            Some(Object::Array(mut items)) => {
                items.push(Object::Reference(annotation_id));
                items
            }
            _ => vec![Object::Reference(annotation_id)],
        };

        self.document
            .get_object_mut(page_id)?
            .as_dict_mut()?
            .set("Annots", Object::Array(annots));
        Ok(())
    }
}

impl DocumentAnnotator for PdfAnnotator {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn draw_rect(
        &mut self,
        page: usize,
        bbox: &BoundingBox,
        color: HighlightColor,
        opacity: f32,
    ) -> Result<()> {
        let page_id = *self.pages.get(page).ok_or_else(|| {
            SegmentError::InvalidArgument(format!(
                "page {page} is outside a {} page document",
                self.pages.len()
            ))
        })?;

        let rect = MediaBox::of_page(&self.document, page_id).to_user_rect(bbox);
        let rgb = color.rgb();
        let appearance =
            Self::appearance_stream(rect[2] - rect[0], rect[3] - rect[1], rgb, opacity)?;
        let appearance_id = self.document.add_object(appearance);

        let rgb_array = || rgb.iter().map(|channel| Object::Real(*channel)).collect::<Vec<_>>();
        let annotation_id = self.document.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Square",
            "Rect" => rect.iter().map(|value| Object::Real(*value as f32)).collect::<Vec<_>>(),
            "C" => rgb_array(),
            "IC" => rgb_array(),
            "CA" => Object::Real(opacity),
            "F" => 4,
            "Border" => vec![0.into(), 0.into(), 1.into()],
            "P" => page_id,
            "AP" => dictionary! { "N" => appearance_id },
        });

        self.attach_annotation(page_id, annotation_id)?;
        debug!(page, ?color, "drew highlight");
        Ok(())
    }

    fn save(&mut self, output: &Path) -> Result<()> {
        let mut buffer = Vec::new();
        self.document.save_to(&mut buffer)?;
        std::fs::write(output, buffer)?;
        Ok(())
    }
}
