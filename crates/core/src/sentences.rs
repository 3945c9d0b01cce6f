//! Rule-based sentence boundary detection.
//!
//! A boundary is terminal punctuation (`.`, `!`, `?`, optionally followed by
//! closing quotes or brackets) followed by whitespace, unless the next word
//! starts lowercase or the word before a lone `.` is a known abbreviation or a
//! single-letter initial. Sentences are returned as trimmed slices of the input,
//! so their words are exactly the input's words in order.

use crate::error::Result;
use crate::traits::SentenceSplitter;
use regex::Regex;

const ABBREVIATIONS: [&str; 18] = [
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "e.g", "i.e", "fig", "no", "cf",
    "al", "inc", "ltd", "approx",
];

pub struct RuleBasedSplitter {
    boundary: Regex,
}

impl RuleBasedSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            boundary: Regex::new(r#"([.!?]+["'\u{201D}\u{2019})\]]*)\s+"#)?,
        })
    }

    /// `last` is where the current sentence began, `punct_start..` the terminal
    /// punctuation, and `next` the first byte after the following whitespace.
    fn is_boundary(
        &self,
        text: &str,
        last: usize,
        punct_start: usize,
        punct: &str,
        next: usize,
    ) -> bool {
        let next_starts_lowercase = text[next..]
            .chars()
            .next()
            .is_some_and(|ch| ch.is_lowercase());
        if next_starts_lowercase {
            return false;
        }

        if punct != "." {
            return true;
        }

        let previous_word = text[last..punct_start]
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .trim_start_matches(|ch: char| !ch.is_alphanumeric())
            .to_lowercase();

        let is_initial = previous_word.chars().count() == 1
            && previous_word.chars().all(|ch| ch.is_alphabetic());

        !(is_initial || ABBREVIATIONS.contains(&previous_word.as_str()))
    }
}

impl SentenceSplitter for RuleBasedSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut last = 0;

        for capture in self.boundary.captures_iter(text) {
            let (Some(whole), Some(punct)) = (capture.get(0), capture.get(1)) else {
                continue;
            };

            if !self.is_boundary(text, last, punct.start(), punct.as_str(), whole.end()) {
                continue;
            }

            let sentence = text[last..punct.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            last = whole.end();
        }

        let tail = text[last..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }

        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        RuleBasedSplitter::new().unwrap().split(text)
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        assert_eq!(
            split("Alpha beta gamma. Delta epsilon! Is it zeta? Eta"),
            vec!["Alpha beta gamma.", "Delta epsilon!", "Is it zeta?", "Eta"]
        );
    }

    #[test]
    fn keeps_abbreviations_and_initials_inside_sentence() {
        assert_eq!(
            split("Dr. Smith met J. R. Doe at noon. They spoke e.g. About tea."),
            vec!["Dr. Smith met J. R. Doe at noon.", "They spoke e.g. About tea."]
        );
    }

    #[test]
    fn lowercase_continuation_is_not_a_boundary() {
        assert_eq!(
            split("See section 4. and then stop. Next one."),
            vec!["See section 4. and then stop.", "Next one."]
        );
    }

    #[test]
    fn closing_quotes_stay_with_their_sentence() {
        assert_eq!(
            split("He said \"Stop.\" Then he left."),
            vec!["He said \"Stop.\"", "Then he left."]
        );
    }

    #[test]
    fn decimals_and_line_breaks_inside_sentence_are_kept() {
        assert_eq!(
            split("Pressure rose to 3.5 bar\nover the run. Done."),
            vec!["Pressure rose to 3.5 bar\nover the run.", "Done."]
        );
    }

    #[test]
    fn blank_text_has_no_sentences() {
        assert!(split("").is_empty());
        assert!(split("   \n\t").is_empty());
    }
}
