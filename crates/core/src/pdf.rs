//! Page geometry and object helpers shared by the PDF reader and annotator.
//!
//! Block and highlight boxes use a top-left origin with y growing downward,
//! measured from the page's `MediaBox` corner. PDF user space has its origin at
//! the bottom left, so every box crosses this module on its way in or out.

use crate::models::BoundingBox;
use lopdf::{Document, Object, ObjectId};

const US_LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];
const MAX_PARENT_HOPS: usize = 32;

pub(crate) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

pub(crate) fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MediaBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl MediaBox {
    fn from_values(values: [f64; 4]) -> Self {
        Self {
            left: values[0].min(values[2]),
            bottom: values[1].min(values[3]),
            right: values[0].max(values[2]),
            top: values[1].max(values[3]),
        }
    }

    /// Looks up the page's `MediaBox`, following `Parent` links for inherited
    /// values. Falls back to US Letter when none is declared.
    pub fn of_page(document: &Document, page_id: ObjectId) -> Self {
        let mut current = Some(page_id);

        for _ in 0..MAX_PARENT_HOPS {
            let Some(id) = current else {
                break;
            };
            let Ok(dictionary) = document.get_dictionary(id) else {
                break;
            };

            let declared = dictionary
                .get(b"MediaBox")
                .ok()
                .and_then(|object| resolve(document, object))
                .and_then(|object| object.as_array().ok())
                .and_then(|items| {
                    let values: Vec<f64> = items.iter().filter_map(number).collect();
                    <[f64; 4]>::try_from(values).ok()
                });

            if let Some(values) = declared {
                return Self::from_values(values);
            }

            current = dictionary
                .get(b"Parent")
                .ok()
                .and_then(|parent| parent.as_reference().ok());
        }

        Self::from_values(US_LETTER)
    }

    /// Converts a user-space point into top-left page coordinates.
    pub fn to_top_left(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.left, self.top - y)
    }

    /// Converts a top-left box into a normalized user-space `Rect`
    /// `[llx, lly, urx, ury]`.
    pub fn to_user_rect(&self, bbox: &BoundingBox) -> [f64; 4] {
        let (x0, x1) = (bbox.x0().min(bbox.x1()), bbox.x0().max(bbox.x1()));
        let (y0, y1) = (bbox.y0().min(bbox.y1()), bbox.y0().max(bbox.y1()));
        [
            self.left + x0,
            self.top - y1,
            self.left + x1,
            self.top - y0,
        ]
    }
}
