use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static DIGIT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid digit regex"));

/// Splits text into word-like units. Filtering and normalization happen in [`Tokens`].
pub trait WordSegmenter: Send + Sync {
    fn segments<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a>;
}

/// Unicode (UAX #29) word boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeWordSegmenter;

impl WordSegmenter for UnicodeWordSegmenter {
    fn segments<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        Box::new(text.unicode_words())
    }
}

/// Splits on whitespace only. Useful where segmentation must not depend on Unicode tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceSegmenter;

impl WordSegmenter for WhitespaceSegmenter {
    fn segments<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        Box::new(text.split_whitespace())
    }
}

/// Lazy sequence of unique, lower-cased, digit-free words longer than one character.
pub struct Tokens<'a> {
    segments: Box<dyn Iterator<Item = &'a str> + 'a>,
    seen: HashSet<String>,
}

impl<'a> Tokens<'a> {
    pub fn new(segmenter: &dyn WordSegmenter, text: &'a str) -> Self {
        Self {
            segments: segmenter.segments(text),
            seen: HashSet::new(),
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for segment in self.segments.by_ref() {
            if segment.chars().count() <= 1 || DIGIT_REGEX.is_match(segment) {
                continue;
            }
            let word = segment.to_lowercase();
            if self.seen.insert(word.clone()) {
                return Some(word);
            }
        }
        None
    }
}

pub fn tokenize<'a>(segmenter: &dyn WordSegmenter, text: &'a str) -> Tokens<'a> {
    Tokens::new(segmenter, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        tokenize(&UnicodeWordSegmenter, text).collect()
    }

    #[test]
    fn drops_short_digit_and_repeated_words() {
        assert_eq!(words("Hello World2 hi hi"), vec!["hello", "hi"]);
    }

    #[test]
    fn dedup_is_case_insensitive_and_keeps_first_position() {
        assert_eq!(
            words("Invoice due\nINVOICE attached, invoice paid"),
            vec!["invoice", "due", "attached", "paid"]
        );
    }

    #[test]
    fn digits_outside_ascii_are_rejected() {
        assert_eq!(words("order ٣٤ order٣ shipped"), vec!["order", "shipped"]);
    }

    #[test]
    fn address_lines_split_into_words() {
        let text = "alice@example.com\nexample.com\nAlice Smith\nQuarterly report";
        assert_eq!(
            words(text),
            vec!["alice", "example.com", "smith", "quarterly", "report"]
        );
    }

    #[test]
    fn whitespace_segmenter_keeps_punctuation() {
        let tokens: Vec<String> = tokenize(&WhitespaceSegmenter, "re: Re: hello, a").collect();
        assert_eq!(tokens, vec!["re:", "hello,"]);
    }

    #[test]
    fn dedup_is_local_to_a_call() {
        assert_eq!(words("hello there"), vec!["hello", "there"]);
        assert_eq!(words("hello again"), vec!["hello", "again"]);
    }
}
