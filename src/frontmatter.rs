//! Frontmatter lexer and parser.
//!
//! A source document may begin with a `---`-delimited key/value header:
//!
//! ```text
//! ---
//! title: Hello
//! date: Mon, 01 Jan 2024 00:00:00 UTC
//! ---
//! body text...
//! ```
//!
//! The lexer is a cursor over immutable text producing a finite,
//! order-preserving token sequence; lexing the same text always yields the
//! same tokens. Token boundaries are decided by lookahead rather than
//! newline-splitting: a run ends when the next character is a newline, or
//! (inside the header) the `:` separator, because key and value share a
//! line.
//!
//! Every emitted token covers a contiguous, non-overlapping span of the
//! input; concatenating the spans plus the suppressed whitespace
//! reproduces the header block exactly.

use crate::error::BuildError;
use std::collections::HashMap;

// ============================================================================
// Tokens
// ============================================================================

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// The `---` delimiter line.
    Bar,
    /// A bare text run (a header key, or any non-header line content).
    Text,
    /// The value part of a `key: value` header line.
    KeyVal,
    /// A line break.
    Newline,
    /// End of input.
    Eof,
}

/// A token with its source position (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub col: usize,
}

/// Lexer mode. BODY is reached only after the second `---`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Start,
    Header,
    Body,
}

// ============================================================================
// Lexer
// ============================================================================

/// Cursor-based lexer over immutable source text.
pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            col: 1,
            mode: Mode::Start,
        }
    }

    /// Current byte offset into the source text.
    pub const fn offset(&self) -> usize {
        self.pos
    }

    fn current(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn token(&self, kind: TokenKind, value: impl Into<String>) -> Token {
        Token {
            kind,
            value: value.into(),
            line: self.line,
            col: self.col,
        }
    }

    /// Produce the next token.
    ///
    /// Whitespace-only text runs are suppressed; scanning continues instead
    /// of emitting them.
    pub fn next_token(&mut self) -> Token {
        loop {
            let Some(c) = self.current() else {
                return self.token(TokenKind::Eof, "");
            };

            if c == '\n' {
                let tok = self.token(TokenKind::Newline, "\n");
                self.advance();
                return tok;
            }

            // A `---` line at column 1 is the delimiter; the first sighting
            // enters HEADER, the second enters BODY.
            if self.col == 1 && self.is_bar_line() {
                let tok = self.token(TokenKind::Bar, "---");
                self.pos += 3;
                self.col += 3;
                self.mode = match self.mode {
                    Mode::Start => Mode::Header,
                    _ => Mode::Body,
                };
                return tok;
            }

            if self.mode == Mode::Header && c == ':' {
                return self.lex_value();
            }

            let start = self.pos;
            let (line, col) = (self.line, self.col);
            while let Some(c) = self.current() {
                if c == '\n' || (self.mode == Mode::Header && c == ':') {
                    break;
                }
                self.advance();
            }

            let span = &self.text[start..self.pos];
            if span.trim().is_empty() {
                continue;
            }
            return Token {
                kind: TokenKind::Text,
                value: span.to_owned(),
                line,
                col,
            };
        }
    }

    /// Lex the value part of a header line: skip the `:` and a single
    /// leading space, then take everything up to the line end.
    fn lex_value(&mut self) -> Token {
        self.advance(); // ':'
        if self.current() == Some(' ') {
            self.advance();
        }

        let start = self.pos;
        let (line, col) = (self.line, self.col);
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.advance();
        }

        Token {
            kind: TokenKind::KeyVal,
            value: self.text[start..self.pos].to_owned(),
            line,
            col,
        }
    }

    fn is_bar_line(&self) -> bool {
        self.text[self.pos..].starts_with("---")
            && matches!(self.text.as_bytes().get(self.pos + 3), None | Some(b'\n'))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let tok = self.next_token();
        (tok.kind != TokenKind::Eof).then_some(tok)
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Parsed frontmatter: header key/value pairs plus the byte offset where
/// the document body begins.
#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    entries: HashMap<String, String>,
    pub body_offset: usize,
}

impl Frontmatter {
    /// Look up a header value. Keys are case-sensitive.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Header value, or `""` when absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Body text of the document this frontmatter was parsed from.
    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        &text[self.body_offset..]
    }

    #[cfg(test)]
    fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            body_offset: 0,
        }
    }
}

/// Parse the leading frontmatter block of `text`.
///
/// `file` is used only for error positions. Fails if the document does not
/// start with a `---` line, if a header line lacks the `:` separator, or
/// if end-of-input is reached while still inside the header.
pub fn parse_frontmatter(text: &str, file: &str) -> Result<Frontmatter, BuildError> {
    let mut lexer = Lexer::new(text);

    let first = lexer.next_token();
    if first.kind != TokenKind::Bar {
        return Err(BuildError::parse(
            file,
            first.line,
            first.col,
            "document must start with `---`",
        ));
    }

    let mut entries = HashMap::new();
    loop {
        let tok = lexer.next_token();
        match tok.kind {
            TokenKind::Newline => {}
            TokenKind::Bar => break,
            TokenKind::Eof => {
                return Err(BuildError::parse(
                    file,
                    tok.line,
                    tok.col,
                    "unexpected end of input inside frontmatter header",
                ));
            }
            TokenKind::Text => {
                let value = lexer.next_token();
                if value.kind != TokenKind::KeyVal {
                    return Err(BuildError::parse(
                        file,
                        tok.line,
                        tok.col,
                        format!("header line `{}` is missing the `:` separator", tok.value),
                    ));
                }
                entries.insert(tok.value, value.value);
            }
            TokenKind::KeyVal => {
                return Err(BuildError::parse(
                    file,
                    tok.line,
                    tok.col,
                    "header value without a key",
                ));
            }
        }
    }

    // The body starts strictly after the closing `---` and its newline.
    let mut body_offset = lexer.offset();
    if text.as_bytes().get(body_offset) == Some(&b'\n') {
        body_offset += 1;
    }

    Ok(Frontmatter {
        entries,
        body_offset,
    })
}

// ============================================================================
// Tests
// ============================================================================
