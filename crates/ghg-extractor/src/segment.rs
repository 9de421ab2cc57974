//! Sentence segmentation
//!
//! Splits after `.`, `!`, or `?` when followed by whitespace. The
//! punctuation stays with the sentence it ends. Abbreviations such as
//! "Ltd." also end a sentence here; no disambiguation is attempted.

use once_cell::sync::Lazy;
use regex::Regex;

static BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// Lazy iterator over the sentences of a text, in source order
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match BOUNDARY.find_at(self.text, self.pos) {
            Some(m) => {
                // Boundary punctuation is a single ASCII byte
                let sentence = &self.text[self.pos..m.start() + 1];
                self.pos = m.end();
                Some(sentence)
            }
            None => {
                self.done = true;
                let rest = &self.text[self.pos..];
                if rest.is_empty() {
                    None
                } else {
                    Some(rest)
                }
            }
        }
    }
}

/// Split text into sentence-like units
pub fn segment(text: &str) -> Segments<'_> {
    Segments {
        text,
        pos: 0,
        done: false,
    }
}
