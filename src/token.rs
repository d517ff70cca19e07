use std::fmt;

/// A source position.
///
/// `line` is 1-based. `col` counts the bytes consumed since the last newline,
/// so the first byte of a line sits at column 0. `offset` is the absolute
/// byte offset into the input.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
    pub offset: usize,
}

impl Pos {
    pub fn start() -> Pos {
        Pos {
            line: 1,
            col: 0,
            offset: 0,
        }
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{}, @{})", self.line, self.col, self.offset)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Token {
        Token { kind, pos }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

// Literal and identifier kinds carry their text. Integer literals stay
// opaque until the code generator writes them into an immediate operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Exit,
    Let,
    If,
    For,
    Print,

    Int(Box<str>),
    Str(Box<str>),
    Ident(Box<str>),

    Plus,
    Minus,
    Star,
    Slash,
    /// `=`
    Assign,
    /// `==`
    Eq,
    Less,
    Greater,
    /// `:=`, the short declaration spelling.
    ColonEq,

    LParen,
    RParen,
    LBrace,
    RBrace,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;

        match self {
            Exit => f.write_str("keyword `exit`"),
            Let => f.write_str("keyword `let`"),
            If => f.write_str("keyword `if`"),
            For => f.write_str("keyword `for`"),
            Print => f.write_str("keyword `print`"),
            Int(text) => write!(f, "integer literal `{text}`"),
            Str(_) => f.write_str("string literal"),
            Ident(name) => write!(f, "identifier `{name}`"),
            Plus => f.write_str("`+`"),
            Minus => f.write_str("`-`"),
            Star => f.write_str("`*`"),
            Slash => f.write_str("`/`"),
            Assign => f.write_str("`=`"),
            Eq => f.write_str("`==`"),
            Less => f.write_str("`<`"),
            Greater => f.write_str("`>`"),
            ColonEq => f.write_str("`:=`"),
            LParen => f.write_str("`(`"),
            RParen => f.write_str("`)`"),
            LBrace => f.write_str("`{`"),
            RBrace => f.write_str("`}`"),
            Eof => f.write_str("end of input"),
        }
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "exit" => TokenKind::Exit,
    "let" => TokenKind::Let,
    "if" => TokenKind::If,
    "for" => TokenKind::For,
    "print" => TokenKind::Print,
};
