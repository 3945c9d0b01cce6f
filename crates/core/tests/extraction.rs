mod fixtures;

use doc_segmenter_core::{extract_segments, SegmentError, SegmentationOptions};
use fixtures::{write_docx, write_pdf, TextRun, FONT_SIZE, PAGE_HEIGHT};
use std::fs;
use tempfile::tempdir;

fn options(max_tokens: usize) -> SegmentationOptions {
    SegmentationOptions {
        max_tokens,
        ..SegmentationOptions::default()
    }
}

#[test]
fn pdf_block_is_chunked_into_segments_sharing_its_box() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("single.pdf");
    write_pdf(
        &path,
        &[vec![TextRun {
            text: "Alpha beta gamma. Delta epsilon.",
            x: 72,
            y: 700,
        }]],
    );

    let payload = extract_segments(&path, options(3)).unwrap();

    assert_eq!(payload.num_segments, 2);
    assert_eq!(payload.total_tokens, 5);
    assert_eq!(payload.source, path.to_string_lossy());

    let first = &payload.segments[0];
    let second = &payload.segments[1];
    assert_eq!(first.id, "seg-1");
    assert_eq!(first.text, "Alpha beta gamma.");
    assert_eq!(first.tokens, 3);
    assert_eq!(second.id, "seg-2");
    assert_eq!(second.text, "Delta epsilon.");
    assert_eq!(second.tokens, 2);

    assert_eq!(first.page, Some(0));
    assert_eq!(second.page, Some(0));
    let bbox = first.bbox.expect("pdf blocks carry a bbox");
    assert_eq!(second.bbox, Some(bbox));

    // top-left origin: the baseline sits below the top of the glyph box
    assert!((bbox.x0() - 72.0).abs() < 1e-6);
    let glyph_top = PAGE_HEIGHT as f64 - (700.0 + 0.8 * FONT_SIZE as f64);
    assert!((bbox.y0() - glyph_top).abs() < 1e-6);
    assert!(bbox.x1() > bbox.x0());
    assert!(bbox.y1() > bbox.y0());
}

#[test]
fn pdf_pages_are_read_in_order_and_blank_blocks_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pages.pdf");
    write_pdf(
        &path,
        &[
            vec![
                TextRun {
                    text: "First page heading.",
                    x: 72,
                    y: 780,
                },
                TextRun {
                    text: "   ",
                    x: 72,
                    y: 760,
                },
                TextRun {
                    text: "First page body text.",
                    x: 72,
                    y: 740,
                },
            ],
            vec![TextRun {
                text: "Second page.",
                x: 72,
                y: 780,
            }],
        ],
    );

    let payload = extract_segments(&path, options(80)).unwrap();

    let summary: Vec<(&str, &str, Option<u32>)> = payload
        .segments
        .iter()
        .map(|segment| (segment.id.as_str(), segment.text.as_str(), segment.page))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("seg-1", "First page heading.", Some(0)),
            ("seg-2", "First page body text.", Some(0)),
            ("seg-3", "Second page.", Some(1)),
        ]
    );
}

#[test]
fn docx_paragraphs_become_segments_without_spatial_metadata() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memo.docx");
    write_docx(
        &path,
        &["The first paragraph is here.", "", "And a second one &amp; more."],
    );

    let payload = extract_segments(&path, options(80)).unwrap();

    assert_eq!(payload.num_segments, 2);
    assert_eq!(payload.segments[0].text, "The first paragraph is here.");
    assert_eq!(payload.segments[1].text, "And a second one & more.");
    assert!(payload
        .segments
        .iter()
        .all(|segment| segment.page.is_none() && segment.bbox.is_none()));

    let json = serde_json::to_value(&payload).unwrap();
    assert!(json["segments"][0]["page"].is_null());
    assert!(json["segments"][0]["bbox"].is_null());
}

#[test]
fn oversized_sentence_survives_as_one_segment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("long.docx");
    write_docx(
        &path,
        &["Short one. This single sentence runs well past the tiny budget. End."],
    );

    let payload = extract_segments(&path, options(4)).unwrap();

    let texts: Vec<&str> = payload.segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Short one.",
            "This single sentence runs well past the tiny budget.",
            "End."
        ]
    );
    assert_eq!(payload.segments[1].tokens, 9);
    assert_eq!(
        payload.total_tokens,
        payload.segments.iter().map(|s| s.tokens).sum::<usize>()
    );
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let error = extract_segments(&dir.path().join("absent.pdf"), options(80)).unwrap_err();
    assert!(matches!(error, SegmentError::NotFound(_)));
}

#[test]
fn unknown_extension_is_rejected_before_reading() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "Plain text.").unwrap();

    let error = extract_segments(&path, options(80)).unwrap_err();
    assert!(matches!(error, SegmentError::UnsupportedFormat(_)));
}

#[test]
fn legacy_word_files_have_no_reader() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("old.doc");
    fs::write(&path, [0xD0, 0xCF, 0x11, 0xE0]).unwrap();

    let error = extract_segments(&path, options(80)).unwrap_err();
    assert!(matches!(error, SegmentError::MissingCapability(_)));
}

#[test]
fn zero_budget_is_an_invalid_argument() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memo.docx");
    write_docx(&path, &["Hello."]);

    let error = extract_segments(&path, options(0)).unwrap_err();
    assert!(matches!(error, SegmentError::InvalidArgument(_)));
}
