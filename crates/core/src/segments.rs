use crate::chunking::{word_count, SentenceChunker};
use crate::error::{Result, SegmentError};
use crate::models::{Block, Payload, Segment, SegmentationOptions};
use crate::traits::SentenceSplitter;
use tracing::debug;

pub struct SegmentBuilder<'a, S: SentenceSplitter + ?Sized> {
    chunker: SentenceChunker<'a, S>,
    options: SegmentationOptions,
}

impl<'a, S: SentenceSplitter + ?Sized> SegmentBuilder<'a, S> {
    pub fn new(splitter: &'a S, options: SegmentationOptions) -> Result<Self> {
        if options.max_tokens == 0 {
            return Err(SegmentError::InvalidArgument(
                "segment token budget must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            chunker: SentenceChunker::new(splitter),
            options,
        })
    }

    /// Flattens every block's chunks into one list. Ids use a single 1-based
    /// counter for the whole document.
    pub fn build(&self, blocks: &[Block]) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut next_id = 1usize;

        for block in blocks {
            let before = segments.len();
            for chunk in self.chunker.chunk(&block.text, self.options.max_tokens) {
                if chunk.is_empty() {
                    continue;
                }

                segments.push(Segment {
                    id: format!("{}{}", self.options.id_prefix, next_id),
                    tokens: word_count(&chunk),
                    text: chunk,
                    page: block.page,
                    bbox: block.bbox,
                });
                next_id += 1;
            }
            debug!(page = ?block.page, chunks = segments.len() - before, "block segmented");
        }

        segments
    }
}

pub fn summarize(segments: Vec<Segment>, source: &str) -> Payload {
    Payload {
        source: source.to_string(),
        num_segments: segments.len(),
        total_tokens: segments.iter().map(|segment| segment.tokens).sum(),
        segments,
    }
}
