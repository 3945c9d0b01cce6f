use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("missing capability: {0}")]
    MissingCapability(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("docx parse error: {0}")]
    DocxParse(String),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lopdf::Error> for SegmentError {
    fn from(error: lopdf::Error) -> Self {
        SegmentError::PdfParse(error.to_string())
    }
}

impl From<zip::result::ZipError> for SegmentError {
    fn from(error: zip::result::ZipError) -> Self {
        SegmentError::DocxParse(error.to_string())
    }
}

pub type Result<T, E = SegmentError> = std::result::Result<T, E>;
