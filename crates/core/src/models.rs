use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `(x0, y0, x1, y1)` in top-left-origin page space.
///
/// Serializes as a plain four-element JSON array.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox(pub [f64; 4]);

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self([x0, y0, x1, y1])
    }

    pub fn x0(&self) -> f64 {
        self.0[0]
    }

    pub fn y0(&self) -> f64 {
        self.0[1]
    }

    pub fn x1(&self) -> f64 {
        self.0[2]
    }

    pub fn y1(&self) -> f64 {
        self.0[3]
    }

    /// Grows this box so it also covers `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.x0().min(other.x0()),
            self.y0().min(other.y0()),
            self.x1().max(other.x1()),
            self.y1().max(other.y1()),
        )
    }

    /// Accepts exactly four finite numbers, anything else is rejected.
    pub fn from_slice(values: &[f64]) -> Option<BoundingBox> {
        match values {
            [x0, y0, x1, y1] if values.iter().all(|value| value.is_finite()) => {
                Some(BoundingBox::new(*x0, *y0, *x1, *y1))
            }
            _ => None,
        }
    }
}

/// One unit of extracted text. `text` is always trimmed and non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub text: String,
    pub page: Option<u32>,
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub id: String,
    pub text: String,
    pub tokens: usize,
    pub page: Option<u32>,
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    pub source: String,
    pub num_segments: usize,
    pub total_tokens: usize,
    pub segments: Vec<Segment>,
}

/// Annotation input for one segment. Every field is optional because the
/// records arrive from an external scorer; defects are resolved by the annotator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightRequest {
    pub page: Option<i64>,
    pub bbox: Option<BoundingBox>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Red,
    Yellow,
    Blue,
}

impl HighlightColor {
    pub fn rgb(self) -> [f32; 3] {
        match self {
            HighlightColor::Red => [1.0, 0.24, 0.24],
            HighlightColor::Yellow => [0.98, 0.86, 0.31],
            HighlightColor::Blue => [0.2, 0.6, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub page: usize,
    pub bbox: BoundingBox,
    pub color: HighlightColor,
}

#[derive(Debug, Clone)]
pub struct SegmentationOptions {
    pub max_tokens: usize,
    pub id_prefix: String,
}

pub const DEFAULT_SEGMENT_TOKENS: usize = 80;

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_SEGMENT_TOKENS,
            id_prefix: "seg-".to_string(),
        }
    }
}

/// Lower bounds of the three highlight bands, compared red first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightThresholds {
    pub blue: f64,
    pub yellow: f64,
    pub red: f64,
}

impl Default for HighlightThresholds {
    fn default() -> Self {
        Self {
            blue: 0.6,
            yellow: 0.7,
            red: 0.8,
        }
    }
}
