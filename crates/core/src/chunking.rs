use crate::traits::SentenceSplitter;
use std::vec;

/// Whitespace-delimited word count, the length proxy used for every budget.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Greedy sentence bucketing under a token budget.
///
/// Sentences are never split. A sentence that alone exceeds the budget is
/// emitted as its own oversized chunk rather than cut or dropped.
pub struct SentenceChunker<'a, S: SentenceSplitter + ?Sized> {
    splitter: &'a S,
}

impl<'a, S: SentenceSplitter + ?Sized> SentenceChunker<'a, S> {
    pub fn new(splitter: &'a S) -> Self {
        Self { splitter }
    }

    pub fn chunk(&self, text: &str, max_tokens: usize) -> Chunks {
        Chunks {
            sentences: self.splitter.split(text).into_iter(),
            bucket: Vec::new(),
            running_tokens: 0,
            max_tokens,
        }
    }
}

/// Lazily yields the chunks of one text.
pub struct Chunks {
    sentences: vec::IntoIter<String>,
    bucket: Vec<String>,
    running_tokens: usize,
    max_tokens: usize,
}

impl Chunks {
    fn flush(&mut self) -> String {
        let chunk = self.bucket.join(" ").trim().to_string();
        self.bucket.clear();
        self.running_tokens = 0;
        chunk
    }
}

impl Iterator for Chunks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(sentence) = self.sentences.next() {
            let sentence_tokens = word_count(&sentence);
            let flushed = if self.running_tokens + sentence_tokens > self.max_tokens
                && !self.bucket.is_empty()
            {
                Some(self.flush())
            } else {
                None
            };

            // forced overflow: the sentence joins the (possibly fresh) bucket regardless of size
            self.bucket.push(sentence);
            self.running_tokens += sentence_tokens;

            if flushed.is_some() {
                return flushed;
            }
        }

        if self.bucket.is_empty() {
            None
        } else {
            Some(self.flush())
        }
    }
}
