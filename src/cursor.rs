//! Line cursor over section-based text documents.
//!
//! The cursor owns the cleaned line sequence of a document: surrounding
//! whitespace is trimmed, `//` comments are cut off and blank lines are
//! dropped. Reads move forward one line at a time and the last read can be
//! undone exactly once with [`DocumentCursor::rewind`].

use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A three component vector, stored the same way as the other float tuples.
pub type Vec3 = [f32; 3];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line}: {message}")]
    Format { line: usize, message: String },
    #[error("Unexpected end of input while reading {0}")]
    UnexpectedEndOfInput(&'static str),
    #[error("Unexpected [SECTION]: {0}")]
    UnknownSection(String),
    #[error("Unknown {record} parameter: {key}")]
    UnknownField { record: &'static str, key: String },
    #[error("Unknown {record} type: {kind}")]
    UnknownKind { record: &'static str, kind: String },
    #[error("Rewind called without a read to undo")]
    RewindMisuse,
}

#[derive(Debug, Clone)]
struct Line {
    number: usize,
    text: String,
}

#[derive(Debug, Clone)]
pub struct DocumentCursor {
    lines: Vec<Line>,
    position: usize,
    last: Option<usize>,
}

/// Returns true for `[name]` style headers.
pub fn is_section_header(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('[') && line.ends_with(']')
}

impl DocumentCursor {
    pub fn new(content: &str) -> Self {
        let lines = content
            .lines()
            .enumerate()
            .filter_map(|(i, raw)| {
                let text = match comment_start(raw) {
                    Some(idx) => &raw[..idx],
                    None => raw,
                };
                let text = text.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(Line { number: i + 1, text: text.to_string() })
                }
            })
            .collect();

        Self {
            lines,
            position: 0,
            last: None,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(&content))
    }

    /// Moves back to the start of the document and reads the first line.
    pub fn read_first_line(&mut self) -> Option<String> {
        self.position = 0;
        self.last = None;
        self.read_next_line()
    }

    /// Reads the next line, or `None` once the input is exhausted.
    pub fn read_next_line(&mut self) -> Option<String> {
        let line = self.lines.get(self.position)?;
        self.last = Some(self.position);
        self.position += 1;
        Some(line.text.clone())
    }

    /// Like [`read_next_line`](Self::read_next_line) but running out of input is an error.
    pub fn expect_line(&mut self, what: &'static str) -> Result<String, ParseError> {
        self.read_next_line()
            .ok_or(ParseError::UnexpectedEndOfInput(what))
    }

    /// Undoes the last read. Only one step of history is kept.
    pub fn rewind(&mut self) -> Result<(), ParseError> {
        match self.last.take() {
            Some(previous) => {
                self.position = previous;
                Ok(())
            }
            None => Err(ParseError::RewindMisuse),
        }
    }

    pub fn next_line_is_a_section(&self) -> bool {
        self.lines
            .get(self.position)
            .map_or(false, |line| is_section_header(&line.text))
    }

    pub fn eof(&self) -> bool {
        self.position >= self.lines.len()
    }

    /// True when the current record has no more lines to give.
    pub fn at_record_end(&self) -> bool {
        self.eof() || self.next_line_is_a_section()
    }

    /// Source line number of the most recently read line.
    pub fn line_number(&self) -> usize {
        let index = self.position.saturating_sub(1);
        self.lines.get(index).map_or(0, |line| line.number)
    }

    pub fn format_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Format {
            line: self.line_number(),
            message: message.into(),
        }
    }

    /// Parses a token taken from the most recently read line.
    pub fn parse_token<T: FromStr>(&self, token: &str) -> Result<T, ParseError> {
        token
            .parse::<T>()
            .map_err(|_| self.format_error(format!("invalid number {:?}", token)))
    }

    pub fn read_int(&mut self) -> Result<i32, ParseError> {
        let line = self.expect_line("integer")?;
        self.parse_token(&line)
    }

    pub fn read_float(&mut self) -> Result<f32, ParseError> {
        let line = self.expect_line("float")?;
        self.parse_token(&line)
    }

    /// Reads three floats, either from one line or from three consecutive lines.
    pub fn read_vector3(&mut self) -> Result<Vec3, ParseError> {
        let line = self.expect_line("vector")?;
        let tokens = split_vector(&line);

        match tokens.len() {
            3 => Ok([
                self.parse_token(tokens[0])?,
                self.parse_token(tokens[1])?,
                self.parse_token(tokens[2])?,
            ]),
            1 => {
                let x = self.parse_token(tokens[0])?;
                let y = self.read_float()?;
                let z = self.read_float()?;
                Ok([x, y, z])
            }
            n => Err(self.format_error(format!("expected 3 vector components, found {}", n))),
        }
    }

    /// Splits the next line on whitespace, requiring exactly `expected` tokens.
    pub fn read_string_array(&mut self, expected: usize) -> Result<Vec<String>, ParseError> {
        let tokens = self.read_string_array_any()?;
        if tokens.len() != expected {
            return Err(self.format_error(format!(
                "expected {} values, found {}",
                expected,
                tokens.len()
            )));
        }
        Ok(tokens)
    }

    /// Splits the next line on whitespace, keeping however many tokens it has.
    pub fn read_string_array_any(&mut self) -> Result<Vec<String>, ParseError> {
        let line = self.expect_line("values")?;
        Ok(line.split_whitespace().map(str::to_string).collect())
    }

    /// Reads a `key value` line.
    pub fn read_key_value(&mut self) -> Result<(String, String), ParseError> {
        let mut pair = self.read_string_array(2)?;
        let value = pair.pop().unwrap_or_default();
        let key = pair.pop().unwrap_or_default();
        Ok((key, value))
    }
}

/// Where a `//` comment starts: at the line start, after whitespace, or right
/// after a numeric value (`180// top speed`). A `//` inside a token such as
/// `cars//eagle` is part of the value.
fn comment_start(line: &str) -> Option<usize> {
    line.match_indices("//").map(|(idx, _)| idx).find(|&idx| {
        let before = &line[..idx];
        match before.chars().last() {
            None => true,
            Some(c) if c.is_whitespace() => true,
            Some(_) => {
                let token = before.split_whitespace().last().unwrap_or("");
                token.parse::<f64>().is_ok()
            }
        }
    })
}

pub(crate) fn split_vector(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleans_comments_and_blank_lines() {
        let mut doc = DocumentCursor::new("  [stats]  \n\n// note\n250// top speed\n");
        assert_eq!(doc.read_first_line().as_deref(), Some("[stats]"));
        assert_eq!(doc.read_int().unwrap(), 250);
        assert!(doc.eof());
        assert_eq!(doc.read_next_line(), None);
    }

    #[test]
    fn test_comment_markers() {
        let mut doc = DocumentCursor::new(
            "// header\nvfx smoke // trailing\nimage cars//eagle/skid\n4.5// time 0 -60\n",
        );
        assert_eq!(doc.read_first_line().as_deref(), Some("vfx smoke"));
        assert_eq!(doc.read_next_line().as_deref(), Some("image cars//eagle/skid"));
        assert_eq!(doc.read_float().unwrap(), 4.5);
        assert!(doc.eof());
    }

    #[test]
    fn test_section_lookahead() {
        let mut doc = DocumentCursor::new("bar\n[foo]\n");
        assert!(!doc.next_line_is_a_section());
        doc.read_first_line();
        assert!(doc.next_line_is_a_section());
        assert!(doc.at_record_end());
        doc.read_next_line();
        assert!(!doc.next_line_is_a_section());
        assert!(doc.eof());
    }

    #[test]
    fn test_rewind_is_single_step() {
        let mut doc = DocumentCursor::new("a\nb\n");
        doc.read_first_line();
        assert_eq!(doc.read_next_line().as_deref(), Some("b"));
        doc.rewind().unwrap();
        assert!(matches!(doc.rewind(), Err(ParseError::RewindMisuse)));
        assert_eq!(doc.read_next_line().as_deref(), Some("b"));
    }

    #[test]
    fn test_rewind_without_read_fails() {
        let mut doc = DocumentCursor::new("a\n");
        assert!(matches!(doc.rewind(), Err(ParseError::RewindMisuse)));
    }

    #[test]
    fn test_typed_reads() {
        let mut doc = DocumentCursor::new("1.5 2 -3\n4\n5\n6\nengine v8\n");
        assert_eq!(doc.read_vector3().unwrap(), [1.5, 2.0, -3.0]);
        assert_eq!(doc.read_vector3().unwrap(), [4.0, 5.0, 6.0]);
        assert_eq!(doc.read_key_value().unwrap(), ("engine".to_string(), "v8".to_string()));
    }

    #[test]
    fn test_string_array_count_mismatch() {
        let mut doc = DocumentCursor::new("paint a b\n");
        assert!(matches!(doc.read_string_array(2), Err(ParseError::Format { line: 1, .. })));

        let mut doc = DocumentCursor::new("paint a b\n");
        assert_eq!(doc.read_string_array_any().unwrap().len(), 3);
    }

    #[test]
    fn test_bad_number_reports_line() {
        let mut doc = DocumentCursor::new("\n\nfast\n");
        match doc.read_int() {
            Err(ParseError::Format { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reading_past_end() {
        let mut doc = DocumentCursor::new("");
        assert!(matches!(doc.read_float(), Err(ParseError::UnexpectedEndOfInput(_))));
    }
}
