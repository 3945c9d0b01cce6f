use crate::error::{Result, SegmentError};
use crate::format::DocumentFormat;
use crate::models::{Block, BoundingBox};
use crate::pdf::{number, MediaBox};
use crate::traits::{DocumentReader, RawBlock};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use regex::{Captures, Regex};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Dispatches a document to the reader registered for its format and turns the
/// raw blocks into trimmed, non-empty [`Block`]s.
pub struct BlockExtractor {
    readers: Vec<Box<dyn DocumentReader>>,
}

impl BlockExtractor {
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// PDF and DOCX readers. Legacy `.doc` stays unregistered.
    pub fn with_default_readers() -> Result<Self> {
        let mut extractor = Self::new();
        extractor.register(Box::new(PdfBlockReader));
        extractor.register(Box::new(DocxBlockReader::new()?));
        Ok(extractor)
    }

    pub fn register(&mut self, reader: Box<dyn DocumentReader>) {
        self.readers.push(reader);
    }

    pub fn extract(&self, path: &Path, format: DocumentFormat) -> Result<Vec<Block>> {
        let reader = self
            .readers
            .iter()
            .find(|reader| reader.format() == format)
            .ok_or_else(|| {
                SegmentError::MissingCapability(format!("no reader available for .{format} files"))
            })?;

        let raw_blocks = reader.read_blocks(path)?;
        let raw_count = raw_blocks.len();
        let blocks = normalize_blocks(raw_blocks, format);

        info!(
            path = %path.display(),
            %format,
            blocks = blocks.len(),
            dropped = raw_count - blocks.len(),
            "extracted blocks"
        );

        Ok(blocks)
    }
}

impl Default for BlockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_blocks(raw_blocks: Vec<RawBlock>, format: DocumentFormat) -> Vec<Block> {
    let paginated = format.is_paginated();
    let mut blocks: Vec<Block> = raw_blocks
        .into_iter()
        .filter_map(|raw| {
            let text = raw.text.trim();
            if text.is_empty() {
                return None;
            }

            Some(Block {
                text: text.to_string(),
                page: raw.page.filter(|_| paginated),
                bbox: raw.bbox.filter(|_| paginated),
            })
        })
        .collect();

    if paginated {
        // stable: reading order within a page is preserved
        blocks.sort_by_key(|block| block.page);
    }

    blocks
}

/// Reads PDF text objects (`BT … ET`) as blocks, one per text object, with a
/// box estimated from glyph positions and font size.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfBlockReader;

impl DocumentReader for PdfBlockReader {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn read_blocks(&self, path: &Path) -> Result<Vec<RawBlock>> {
        let document = Document::load(path)?;

        let mut blocks = Vec::new();
        for (page_index, (_page_no, page_id)) in document.get_pages().into_iter().enumerate() {
            let page_blocks = read_page_blocks(&document, page_id, page_index as u32)?;
            debug!(page = page_index, blocks = page_blocks.len(), "read pdf page");
            blocks.extend(page_blocks);
        }

        Ok(blocks)
    }
}

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
// average glyph advance and vertical extent as a fraction of the font size
const GLYPH_WIDTH: f64 = 0.5;
const ASCENT: f64 = 0.8;
const DESCENT: f64 = -0.2;
// TJ adjustments (thousandths of an em) wider than this read as a word gap
const WORD_GAP: f64 = -200.0;
/// Horizontal `Td` gap, in ems past the estimated pen position, read as a word break.
const MIN_WORD_SPACE: f64 = 0.5;

/// `first` applied, then `second`.
fn multiply(first: &Matrix, second: &Matrix) -> Matrix {
    [
        first[0] * second[0] + first[1] * second[2],
        first[0] * second[1] + first[1] * second[3],
        first[2] * second[0] + first[3] * second[2],
        first[2] * second[1] + first[3] * second[3],
        first[4] * second[0] + first[5] * second[2] + second[4],
        first[4] * second[1] + first[5] * second[3] + second[5],
    ]
}

fn translate(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn apply(matrix: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (
        matrix[0] * x + matrix[2] * y + matrix[4],
        matrix[1] * x + matrix[3] * y + matrix[5],
    )
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    <[f64; 6]>::try_from(values).ok()
}

struct TextObject {
    text: String,
    bbox: Option<BoundingBox>,
}

struct PageWalker {
    media: MediaBox,
    ctm: Matrix,
    saved: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
    current: Option<TextObject>,
    blocks: Vec<(String, Option<BoundingBox>)>,
}

impl PageWalker {
    fn new(media: MediaBox) -> Self {
        Self {
            media,
            ctm: IDENTITY,
            saved: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 12.0,
            leading: 0.0,
            current: None,
            blocks: Vec::new(),
        }
    }

    fn operate(&mut self, operator: &str, operands: &[Object]) {
        let arg = |index: usize| operands.get(index).and_then(number).unwrap_or(0.0);

        match operator {
            "q" => self.saved.push(self.ctm),
            "Q" => self.ctm = self.saved.pop().unwrap_or(IDENTITY),
            "cm" => {
                if let Some(matrix) = matrix_operands(operands) {
                    self.ctm = multiply(&matrix, &self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
                self.current = Some(TextObject {
                    text: String::new(),
                    bbox: None,
                });
            }
            "ET" => self.finish_text_object(),
            "Tf" => self.font_size = arg(1),
            "TL" => self.leading = arg(0),
            "Td" => self.move_line(arg(0), arg(1)),
            "TD" => {
                self.leading = -arg(1);
                self.move_line(arg(0), arg(1));
            }
            "Tm" => {
                if let Some(matrix) = matrix_operands(operands) {
                    self.line_matrix = matrix;
                    self.text_matrix = matrix;
                    self.push_separator('\n');
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                let adjustment = number(other).unwrap_or(0.0);
                                if adjustment < WORD_GAP {
                                    self.push_separator(' ');
                                }
                                let shift = -adjustment / 1000.0 * self.font_size;
                                self.text_matrix =
                                    multiply(&translate(shift, 0.0), &self.text_matrix);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        let next = multiply(&translate(tx, ty), &self.line_matrix);
        let separator = if ty != 0.0 {
            Some('\n')
        } else {
            // same-line moves narrower than a word space are kerning inside a word
            let gap = next[4] - self.text_matrix[4];
            let scale = self.line_matrix[0].abs().max(f64::EPSILON);
            (gap > MIN_WORD_SPACE * self.font_size * scale).then_some(' ')
        };
        self.line_matrix = next;
        self.text_matrix = next;
        if let Some(separator) = separator {
            self.push_separator(separator);
        }
    }

    fn next_line(&mut self) {
        self.line_matrix = multiply(&translate(0.0, -self.leading), &self.line_matrix);
        self.text_matrix = self.line_matrix;
        self.push_separator('\n');
    }

    fn push_separator(&mut self, separator: char) {
        if let Some(object) = self.current.as_mut() {
            if !object.text.is_empty() && !object.text.ends_with(char::is_whitespace) {
                object.text.push(separator);
            }
        }
    }

    fn show(&mut self, bytes: &[u8]) {
        let decoded = decode_pdf_string(bytes);
        let glyphs = decoded.chars().count() as f64;
        let width = glyphs * GLYPH_WIDTH * self.font_size;

        let device = multiply(&self.text_matrix, &self.ctm);
        let corners = [
            apply(&device, 0.0, DESCENT * self.font_size),
            apply(&device, width, DESCENT * self.font_size),
            apply(&device, 0.0, ASCENT * self.font_size),
            apply(&device, width, ASCENT * self.font_size),
        ];
        let mut run = None::<BoundingBox>;
        for (x, y) in corners {
            let (x, y) = self.media.to_top_left(x, y);
            let point = BoundingBox::new(x, y, x, y);
            run = Some(run.map_or(point, |bbox| bbox.union(&point)));
        }

        self.text_matrix = multiply(&translate(width, 0.0), &self.text_matrix);

        let Some(object) = self.current.as_mut() else {
            return;
        };
        object.text.push_str(&decoded);
        if !decoded.trim().is_empty() {
            object.bbox = match (object.bbox, run) {
                (Some(existing), Some(run)) => Some(existing.union(&run)),
                (existing, run) => existing.or(run),
            };
        }
    }

    fn finish_text_object(&mut self) {
        if let Some(object) = self.current.take() {
            self.blocks.push((object.text, object.bbox));
        }
    }
}

fn read_page_blocks(
    document: &Document,
    page_id: ObjectId,
    page_index: u32,
) -> Result<Vec<RawBlock>> {
    let content = Content::decode(&document.get_page_content(page_id)?)?;
    let mut walker = PageWalker::new(MediaBox::of_page(document, page_id));

    for operation in &content.operations {
        walker.operate(&operation.operator, &operation.operands);
    }
    // unterminated text object at end of stream
    walker.finish_text_object();

    Ok(walker
        .blocks
        .into_iter()
        .map(|(text, bbox)| RawBlock {
            text,
            page: Some(page_index),
            bbox,
        })
        .collect())
}

/// Decodes a PDF string operand. UTF-16BE with a byte-order mark (or with the
/// zero high bytes typical of two-byte CID text) is decoded as UTF-16; anything
/// else is read as WinAnsi.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        return decode_utf16be(rest);
    }

    let looks_like_cid = bytes.len() >= 2
        && bytes.len() % 2 == 0
        && bytes.chunks(2).all(|pair| pair[0] == 0 && pair[1] != 0);
    if looks_like_cid {
        return decode_utf16be(bytes);
    }

    bytes.iter().map(|byte| win_ansi_char(*byte)).collect()
}

fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn win_ansi_char(byte: u8) -> char {
    match byte {
        0x80 => '€',
        0x85 => '…',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x99 => '™',
        0xA0 => ' ',
        other => other as char,
    }
}

/// Reads OOXML word-processor files: one block per top-level `<w:p>` body
/// paragraph of `word/document.xml`, in document order. Table cells, text boxes
/// and `mc:Fallback` duplicates are not body paragraphs and are skipped.
pub struct DocxBlockReader {
    tag: Regex,
    entity: Regex,
}

const DOCUMENT_PART: &str = "word/document.xml";

/// Subtrees whose paragraphs and runs never reach a top-level paragraph's text.
const SKIPPED_SUBTREES: [&str; 4] = ["w:tbl", "w:txbxContent", "mc:Fallback", "w:pPr"];

impl DocxBlockReader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tag: Regex::new(r"<(/)?([A-Za-z][\w.:-]*)[^>]*?(/)?>")?,
            entity: Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);")?,
        })
    }

    /// Paragraph texts of a `document.xml` body, empty paragraphs included.
    pub fn paragraphs_from_xml(&self, xml: &str) -> Vec<String> {
        let mut paragraphs = Vec::new();
        let mut current: Option<String> = None;
        let mut paragraph_depth = 0usize;
        let mut skip_depth = 0usize;
        let mut in_text = false;
        let mut cursor = 0;

        for tag in self.tag.captures_iter(xml) {
            let Some(whole) = tag.get(0) else { continue };
            if in_text && skip_depth == 0 {
                if let Some(text) = current.as_mut() {
                    text.push_str(&self.unescape(&xml[cursor..whole.start()]));
                }
            }
            cursor = whole.end();

            let closing = tag.get(1).is_some();
            let self_closing = tag.get(3).is_some();
            let name = &tag[2];

            if skip_depth > 0 {
                if closing {
                    skip_depth -= 1;
                } else if !self_closing {
                    skip_depth += 1;
                }
                continue;
            }
            if SKIPPED_SUBTREES.contains(&name) {
                if !closing && !self_closing {
                    skip_depth = 1;
                }
                continue;
            }

            match (name, closing, self_closing) {
                ("w:p", false, true) => {
                    if current.is_none() {
                        paragraphs.push(String::new());
                    }
                }
                ("w:p", false, false) => {
                    paragraph_depth += 1;
                    current.get_or_insert_with(String::new);
                }
                ("w:p", true, _) => {
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                    if paragraph_depth == 0 {
                        paragraphs.extend(current.take());
                    }
                }
                ("w:t", false, false) => in_text = true,
                ("w:t", true, _) => in_text = false,
                ("w:tab", false, true) => {
                    if let Some(text) = current.as_mut() {
                        text.push('\t');
                    }
                }
                ("w:br" | "w:cr", false, true) => {
                    if let Some(text) = current.as_mut() {
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }

        paragraphs
    }

    fn unescape(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |entity: &Captures<'_>| {
                let name = &entity[1];
                let decoded = match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => {
                        let code = match name.strip_prefix("#x") {
                            Some(hex) => u32::from_str_radix(hex, 16).ok(),
                            None => name[1..].parse::<u32>().ok(),
                        };
                        code.and_then(char::from_u32)
                    }
                };
                decoded.map_or_else(|| entity[0].to_string(), String::from)
            })
            .into_owned()
    }
}

impl DocumentReader for DocxBlockReader {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn read_blocks(&self, path: &Path) -> Result<Vec<RawBlock>> {
        let mut archive = zip::ZipArchive::new(File::open(path)?)?;
        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|error| SegmentError::DocxParse(format!("{DOCUMENT_PART}: {error}")))?
            .read_to_string(&mut xml)?;

        Ok(self
            .paragraphs_from_xml(&xml)
            .into_iter()
            .map(|text| RawBlock {
                text,
                page: None,
                bbox: None,
            })
            .collect())
    }
}
