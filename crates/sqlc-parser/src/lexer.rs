//! SQL lexer.
//!
//! Splits query text into [`Token`]s with line and column positions.
//! Quoted runs are scanned with memchr.

use memchr::memchr;
use sqlc_ast::Span;

use crate::token::{Token, TokenKind};

/// Byte-level tokenizer over one query file.
pub struct Lexer<'a> {
    src: &'a [u8],
    /// Next unread byte.
    pos: usize,
    line: u32,
    col: u32,
}

fn offset(pos: usize) -> u32 {
    u32::try_from(pos).unwrap_or(u32::MAX)
}

const fn is_ident_byte(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$' || ch >= 0x80
}

impl<'a> Lexer<'a> {
    /// Start at the first byte of `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the entire input into a Vec of tokens ending with `Eof`.
    #[must_use]
    pub fn tokenize(source: &'a str) -> Vec<Token> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Lex one token. Returns `Eof` forever once input runs out.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.pos;
        let start_line = self.line;
        let start_col = self.col;

        let Some(ch) = self.peek() else {
            return Token {
                kind: TokenKind::Eof,
                span: Span::new(offset(start), offset(start)),
                line: start_line,
                col: start_col,
            };
        };

        let kind = match ch {
            b'\'' => self.lex_string(),
            b'"' => self.lex_quoted_id(),

            b'0'..=b'9' => self.lex_number(),
            b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_identifier(),
            c if c >= 0x80 => self.lex_identifier(),

            b'$' => self.lex_dollar_param(),
            b'?' => self.single(TokenKind::Question),

            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'*' => self.single(TokenKind::Star),
            b'/' => self.single(TokenKind::Slash),
            b'%' => self.single(TokenKind::Percent),
            b'=' => self.single(TokenKind::Eq),
            b',' => self.single(TokenKind::Comma),
            b';' => self.single(TokenKind::Semicolon),
            b'(' => self.single(TokenKind::LeftParen),
            b')' => self.single(TokenKind::RightParen),
            b'[' => self.single(TokenKind::LeftBracket),
            b']' => self.single(TokenKind::RightBracket),
            b'.' => self.single(TokenKind::Dot),

            b'<' => self.lex_lt(),
            b'>' => self.lex_gt(),
            b'!' => self.lex_bang(),
            b'|' => self.lex_pipe(),
            b':' => self.lex_colon(),

            _ => {
                self.advance_char();
                let s = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
                TokenKind::Error(format!("unexpected character: {s}"))
            }
        };

        Token {
            kind,
            span: Span::new(offset(start), offset(self.pos)),
            line: start_line,
            col: start_col,
        }
    }

    // Cursor

    fn advance(&mut self) {
        let ch = self.src[self.pos];
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if ch & 0xC0 != 0x80 {
            // Continuation bytes of a multi-byte character share its column.
            self.col += 1;
        }
    }

    /// Advance past one whole UTF-8 character.
    fn advance_char(&mut self) {
        self.advance();
        while self.peek().is_some_and(|b| b & 0xC0 == 0x80) {
            self.advance();
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn text(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    /// Skip blanks and both comment styles. Block comments nest.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                self.advance();
            }

            match (self.peek(), self.peek_at(1)) {
                (Some(b'-'), Some(b'-')) => {
                    let rest = &self.src[self.pos..];
                    let len = memchr(b'\n', rest).unwrap_or(rest.len());
                    self.advance_by(len);
                }
                (Some(b'/'), Some(b'*')) => {
                    self.advance_by(2);
                    let mut depth = 1u32;
                    while self.pos < self.src.len() && depth > 0 {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'/'), Some(b'*')) => {
                                self.advance_by(2);
                                depth += 1;
                            }
                            (Some(b'*'), Some(b'/')) => {
                                self.advance_by(2);
                                depth -= 1;
                            }
                            _ => self.advance(),
                        }
                    }
                }
                _ => break,
            }
        }
    }

    // Literals

    /// Scan a quoted run ending at `quote`, with doubled quotes as escapes.
    /// Returns `None` when the input ends first.
    fn scan_quoted(&mut self, quote: u8) -> Option<String> {
        self.advance(); // opening quote
        let mut value = String::new();
        let src = self.src;
        loop {
            let remaining = &src[self.pos..];
            let Some(len) = memchr(quote, remaining) else {
                self.advance_by(remaining.len());
                return None;
            };
            value.push_str(&String::from_utf8_lossy(&remaining[..len]));
            self.advance_by(len + 1);
            if self.peek() == Some(quote) {
                value.push(char::from(quote));
                self.advance();
            } else {
                return Some(value);
            }
        }
    }

    /// Lex a single-quoted string literal.
    fn lex_string(&mut self) -> TokenKind {
        let start = self.pos;
        match self.scan_quoted(b'\'') {
            Some(value) => TokenKind::String(value),
            None => TokenKind::Error(format!(
                "unterminated quoted string starting at byte {start}"
            )),
        }
    }

    /// Lex a double-quoted identifier. Case is preserved.
    fn lex_quoted_id(&mut self) -> TokenKind {
        let start = self.pos;
        match self.scan_quoted(b'"') {
            Some(value) if value.is_empty() => {
                TokenKind::Error("zero-length delimited identifier".to_owned())
            }
            Some(value) => TokenKind::QuotedId(value),
            None => TokenKind::Error(format!(
                "unterminated quoted identifier starting at byte {start}"
            )),
        }
    }

    /// Lex a number: integer or float.
    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut is_float = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Fractional part. `1..` is not a float; `t.1` never reaches here.
        if self.peek() == Some(b'.') && self.peek_at(1) != Some(b'.') {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent
        if matches!(self.peek(), Some(b'e' | b'E'))
            && (self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                || (matches!(self.peek_at(1), Some(b'+' | b'-'))
                    && self.peek_at(2).is_some_and(|c| c.is_ascii_digit())))
        {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.text(start);
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') {
            return TokenKind::Error(format!("trailing junk after numeric literal: {text}"));
        }
        if is_float {
            return TokenKind::Float(text);
        }
        // Integers too wide for i64 stay exact in source form.
        text.parse::<i64>()
            .map_or(TokenKind::Float(text), TokenKind::Integer)
    }

    /// Lex an identifier or keyword. Unquoted identifiers fold to lower case.
    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.advance();
        }
        let text = self.text(start);
        TokenKind::lookup_keyword(&text).unwrap_or_else(|| TokenKind::Id(text.to_ascii_lowercase()))
    }

    /// Lex `$N`.
    fn lex_dollar_param(&mut self) -> TokenKind {
        self.advance(); // skip $
        let num_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == num_start {
            return TokenKind::Error("expected parameter number after '$'".to_owned());
        }
        match self.text(num_start).parse::<u32>() {
            Ok(0) | Err(_) => TokenKind::Error("invalid parameter number".to_owned()),
            Ok(n) => TokenKind::Param(n),
        }
    }

    // Operators

    /// Lex `<`, `<=`, or `<>`.
    fn lex_lt(&mut self) -> TokenKind {
        self.advance();
        match self.peek() {
            Some(b'=') => self.single(TokenKind::Le),
            Some(b'>') => self.single(TokenKind::Ne),
            _ => TokenKind::Lt,
        }
    }

    /// Lex `>` or `>=`.
    fn lex_gt(&mut self) -> TokenKind {
        self.advance();
        if self.peek() == Some(b'=') {
            self.single(TokenKind::Ge)
        } else {
            TokenKind::Gt
        }
    }

    /// Lex `!=`.
    fn lex_bang(&mut self) -> TokenKind {
        self.advance();
        if self.peek() == Some(b'=') {
            self.single(TokenKind::Ne)
        } else {
            TokenKind::Error("unexpected '!', did you mean '!='?".to_owned())
        }
    }

    /// Lex `||`.
    fn lex_pipe(&mut self) -> TokenKind {
        self.advance();
        if self.peek() == Some(b'|') {
            self.single(TokenKind::Concat)
        } else {
            TokenKind::Error("unexpected '|', did you mean '||'?".to_owned())
        }
    }

    /// Lex `::`.
    fn lex_colon(&mut self) -> TokenKind {
        self.advance();
        if self.peek() == Some(b':') {
            self.single(TokenKind::DoubleColon)
        } else {
            TokenKind::Error("unexpected ':'".to_owned())
        }
    }
}
