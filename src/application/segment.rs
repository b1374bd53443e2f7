//! Splits content strings into plain-text and math segments.
//!
//! A linear scan over the input. At each `$` the scanner first tries a block
//! formula (`$$`, at least one character, nearest `$$`), then an inline one
//! (`$`, one or more characters without `$`, `$`). Anything that matches
//! neither stays plain text, so an unterminated delimiter never produces a
//! formula.

use std::fmt;

use serde::Serialize;

use super::math::MathDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment<'a> {
    Plain { text: &'a str },
    /// `source` keeps its delimiters.
    Math { source: &'a str, display: MathDisplay },
}

impl<'a> Segment<'a> {
    /// The exact slice of the input this segment covers.
    pub fn source(&self) -> &'a str {
        match self {
            Segment::Plain { text } => text,
            Segment::Math { source, .. } => source,
        }
    }
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Plain { text } => write!(f, "plain  {text:?}"),
            Segment::Math { source, display } => write!(f, "{:<6} {source:?}", display.as_str()),
        }
    }
}

/// Segment `content` into a list. Empty input yields no segments.
pub fn segment(content: &str) -> Vec<Segment<'_>> {
    Scanner::new(content).collect()
}

/// Iterator over the segments of one string.
pub struct Scanner<'a> {
    input: &'a str,
    cursor: usize,
    pending: Option<Segment<'a>>,
    // Once a search for a closer fails, it fails for every later opener too.
    block_exhausted: bool,
    inline_exhausted: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            cursor: 0,
            pending: None,
            block_exhausted: false,
            inline_exhausted: false,
        }
    }

    /// Find the next formula at or after `from`, as `(start, end, display)`.
    fn next_formula(&mut self, from: usize) -> Option<(usize, usize, MathDisplay)> {
        let mut position = from;
        while let Some(offset) = self.input[position..].find('$') {
            let start = position + offset;
            if let Some(end) = self.block_at(start) {
                return Some((start, end, MathDisplay::Block));
            }
            if let Some(end) = self.inline_at(start) {
                return Some((start, end, MathDisplay::Inline));
            }
            // `$` is one byte wide.
            position = start + 1;
        }
        None
    }

    fn block_at(&mut self, start: usize) -> Option<usize> {
        if self.block_exhausted || !self.input[start..].starts_with("$$") {
            return None;
        }
        let body = start + 2;
        let first = self.input[body..].chars().next()?;
        let search_from = body + first.len_utf8();
        match self.input[search_from..].find("$$") {
            Some(offset) => Some(search_from + offset + 2),
            None => {
                self.block_exhausted = true;
                None
            }
        }
    }

    fn inline_at(&mut self, start: usize) -> Option<usize> {
        if self.inline_exhausted {
            return None;
        }
        let body = start + 1;
        match self.input[body..].chars().next() {
            Some('$') | None => return None,
            Some(_) => {}
        }
        match self.input[body..].find('$') {
            Some(offset) => Some(body + offset + 1),
            None => {
                self.inline_exhausted = true;
                None
            }
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }
        if self.cursor >= self.input.len() {
            return None;
        }

        let from = self.cursor;
        match self.next_formula(from) {
            Some((start, end, display)) => {
                self.cursor = end;
                let math = Segment::Math {
                    source: &self.input[start..end],
                    display,
                };
                if start > from {
                    self.pending = Some(math);
                    Some(Segment::Plain {
                        text: &self.input[from..start],
                    })
                } else {
                    Some(math)
                }
            }
            None => {
                self.cursor = self.input.len();
                Some(Segment::Plain {
                    text: &self.input[from..],
                })
            }
        }
    }
}
