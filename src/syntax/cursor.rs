//! The Cursor is a character scanner over an in-memory source buffer.
//!
//! It knows how to skip whitespace and line comments, match literals
//! with or without a word boundary, and roll back to a saved mark.
//! Diagnostics are recorded here as well, since only the cursor can
//! turn a buffer offset into a line and column.
use std::fmt;

/// Returned by `peek` and `next` once the buffer is exhausted.
pub const EOF: char = '\0';

/// A single error report, 1-based line and column.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Characters which may continue an identifier. A keyword matched with
/// `match_word` must not be directly followed by one of these.
pub fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub struct Cursor {
    data: Vec<char>,
    pos: usize,
    line_comment: Option<&'static str>,
    diagnostics: Vec<Diagnostic>,
}

impl Cursor {
    /// Creates a cursor at the start of `source`. When `line_comment` is
    /// given, everything from that marker to the end of the line is
    /// skipped along with whitespace.
    pub fn new(source: &str, line_comment: Option<&'static str>) -> Self {
        Cursor {
            data: source.chars().collect(),
            pos: 0,
            line_comment,
            diagnostics: Vec::new(),
        }
    }

    #[inline]
    pub fn mark(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn rollback(&mut self, mark: usize) {
        self.pos = mark;
    }

    pub fn peek(&self) -> char {
        self.data.get(self.pos).copied().unwrap_or(EOF)
    }

    /// Returns the current character and advances, even past the end.
    pub fn next(&mut self) -> char {
        let c = self.peek();
        self.pos += 1;
        c
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Skips whitespace and line comments.
    pub fn skip_trivia(&mut self) {
        loop {
            if self.peek().is_whitespace() {
                self.pos += 1;
            } else if self.at_line_comment() {
                while !self.eof() && self.peek() != '\n' {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Advances past the next newline, or to the end of the buffer.
    pub fn skip_line(&mut self) {
        while !self.eof() {
            if self.next() == '\n' {
                break;
            }
        }
    }

    pub fn at_line_comment(&self) -> bool {
        self.line_comment.map_or(false, |marker| self.at(marker))
    }

    /// True if `literal` starts exactly at the current position.
    fn at(&self, literal: &str) -> bool {
        let mut i = self.pos;
        for c in literal.chars() {
            if self.data.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Skips trivia and then consumes `literal` if it is next.
    /// On failure the cursor is left exactly where it was.
    pub fn match_str(&mut self, literal: &str) -> bool {
        self.match_with(literal, true)
    }

    pub fn match_with(&mut self, literal: &str, skip_trivia: bool) -> bool {
        let start = self.pos;
        if skip_trivia {
            self.skip_trivia();
        }
        if self.at(literal) {
            self.pos += literal.chars().count();
            true
        } else {
            self.pos = start;
            false
        }
    }

    /// Like `match_str`, but `literal` must not be a prefix of a longer
    /// identifier, so `R0` never matches the start of `R0S`.
    pub fn match_word(&mut self, literal: &str) -> bool {
        let start = self.pos;
        if !self.match_str(literal) {
            return false;
        }
        if is_identifier_part(self.peek()) {
            self.pos = start;
            return false;
        }
        true
    }

    /// Matches `literal` or records a diagnostic. Does not roll back.
    pub fn expect(&mut self, literal: &str, message: Option<&str>) -> bool {
        if self.match_str(literal) {
            return true;
        }
        match message {
            Some(message) => self.error(message),
            None => self.error(&format!("Expected '{}'", literal)),
        }
        false
    }

    /// 1-based line of `pos`.
    pub fn line(&self, pos: usize) -> usize {
        let end = pos.min(self.data.len());
        1 + self.data[..end].iter().filter(|&&c| c == '\n').count()
    }

    /// 1-based column of `pos`.
    pub fn column(&self, pos: usize) -> usize {
        let end = pos.min(self.data.len());
        let line_start = self.data[..end]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |newline| newline + 1);
        end - line_start + 1
    }

    /// Records a diagnostic at the current position.
    pub fn error(&mut self, message: &str) {
        self.error_at(message, self.pos);
    }

    pub fn error_at(&mut self, message: &str, at: usize) {
        let diagnostic = Diagnostic {
            line: self.line(at),
            column: self.column(at),
            message: message.to_owned(),
        };
        debug!("diagnostic {} near `{}`", diagnostic, self);
        self.diagnostics.push(diagnostic);
    }

    pub fn errors(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Shows up to 20 characters either side of the position, for debug logs.
impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let end = self.pos.min(self.data.len());
        let before: String = self.data[end.saturating_sub(20)..end].iter().collect();
        let after: String = self
            .data
            .iter()
            .skip(self.pos)
            .take(20)
            .collect();
        write!(f, "{} | {}", before.escape_debug(), after.escape_debug())?;
        if self.eof() {
            write!(f, " [EOF]")?;
        }
        Ok(())
    }
}
