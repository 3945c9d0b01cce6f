use crate::models::{HighlightColor, HighlightThresholds};

/// Maps a confidence to a highlight band. Bounds are inclusive and tested red,
/// then yellow, then blue; the first satisfied band wins even if the thresholds
/// are not ordered `blue <= yellow <= red`.
pub fn classify(confidence: f64, blue: f64, yellow: f64, red: f64) -> Option<HighlightColor> {
    if confidence >= red {
        Some(HighlightColor::Red)
    } else if confidence >= yellow {
        Some(HighlightColor::Yellow)
    } else if confidence >= blue {
        Some(HighlightColor::Blue)
    } else {
        None
    }
}

impl HighlightThresholds {
    pub fn classify(&self, confidence: f64) -> Option<HighlightColor> {
        classify(confidence, self.blue, self.yellow, self.red)
    }
}
