use std::{iter::Peekable, str::Chars};

use thiserror::Error;

use crate::token::{Pos, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// Scans the provided source, producing a token vector terminated by a
/// single [`TokenKind::Eof`].
pub fn lex(src: &str) -> Result<Vec<Token>, Error> {
    Lexer::new(src).run()
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{pos}: {kind}")]
pub struct Error {
    pub kind: ErrorKind,
    pub pos: Pos,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("expected `=` to follow `:`")]
    LoneColon,
}

struct Lexer<'src> {
    iter: Peekable<Chars<'src>>,
    /// Position of the next unconsumed character.
    pos: Pos,
    /// Position where the current token started.
    start: Pos,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn new(src: &str) -> Lexer<'_> {
        Lexer {
            iter: src.chars().peekable(),
            pos: Pos::start(),
            start: Pos::start(),
            tokens: Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, Error> {
        loop {
            self.skip_whitespace();
            self.start = self.pos;
            match self.advance() {
                // A NUL only marks the end of input when the iterator is
                // actually exhausted; an embedded NUL byte falls through to
                // `scan` and is rejected there.
                '\0' if self.iter.peek().is_none() => {
                    self.produce(TokenKind::Eof);
                    return Ok(self.tokens);
                }
                // `//` comments run to the end of the line and emit nothing.
                '/' if self.peek() == '/' => self.skip_line(),
                c => {
                    let kind = self.scan(c)?;
                    self.produce(kind);
                }
            }
        }
    }

    /// Scans the token starting with `c`, which has already been consumed.
    fn scan(&mut self, c: char) -> Result<TokenKind, Error> {
        use TokenKind::*;

        let kind = match c {
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '=' => match self.peek() {
                '=' => self.advance_with(Eq),
                _ => Assign,
            },
            '<' => Less,
            '>' => Greater,
            ':' => match self.peek() {
                '=' => self.advance_with(ColonEq),
                _ => return Err(self.error(ErrorKind::LoneColon)),
            },
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number(c),
            c if c.is_ascii_alphabetic() => self.word(c),
            c => return Err(self.error(ErrorKind::UnexpectedChar(c))),
        };
        Ok(kind)
    }

    /// Scans a string literal; the opening quote has been consumed. Bytes are
    /// taken verbatim up to the closing quote (there are no escape
    /// sequences). Running out of input first is an error at the opening
    /// quote.
    fn string(&mut self) -> Result<TokenKind, Error> {
        let mut value = String::new();
        loop {
            match self.advance() {
                '\0' => return Err(self.error(ErrorKind::UnterminatedString)),
                '"' => return Ok(TokenKind::Str(value.into_boxed_str())),
                c => value.push(c),
            }
        }
    }

    /// Scans the maximal run of digits, keeping the text as-is.
    fn number(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while self.peek().is_ascii_digit() {
            text.push(self.advance());
        }
        TokenKind::Int(text.into_boxed_str())
    }

    /// Scans the maximal letter-then-alphanumeric run; such a run is either
    /// a keyword or an identifier.
    fn word(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while self.peek().is_ascii_alphanumeric() {
            text.push(self.advance());
        }
        match KEYWORDS.get(&text) {
            Some(keyword) => keyword.clone(),
            None => TokenKind::Ident(text.into_boxed_str()),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_ascii_whitespace() {
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while !matches!(self.peek(), '\n' | '\0') {
            self.advance();
        }
    }

    /// Returns the next character and advances, tracking line and column.
    fn advance(&mut self) -> char {
        let Some(c) = self.iter.next() else {
            return '\0';
        };
        self.pos.offset += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.col = 0;
        } else {
            self.pos.col += u32::try_from(c.len_utf8()).unwrap();
        }
        c
    }

    /// Advances and returns the provided value.
    fn advance_with(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Returns the next character without advancing.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Produces a token spanning from the current token start.
    fn produce(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.start));
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error {
            kind,
            pos: self.start,
        }
    }
}
