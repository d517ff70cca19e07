use thiserror::Error;

use crate::{
    ast::{BinaryOp, Block, CmpOp, Expr, ExprKind, Stmt, StmtKind, Test},
    token::{Pos, Token, TokenKind},
};

/// Parses statements until the token sequence is exhausted. The first
/// malformed statement aborts parsing with a positioned error; there is no
/// recovery.
pub fn parse(tokens: Vec<Token>) -> Result<Block, Error> {
    Parser::new(tokens).parse_program()
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{pos}: {kind}")]
pub struct Error {
    pub kind: ErrorKind,
    pub pos: Pos,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("expected {expected}, found {found}")]
    Unexpected {
        expected: &'static str,
        found: TokenKind,
    },
    #[error("expected an expression, found {0}")]
    ExpectedExpr(TokenKind),
    #[error("{0} cannot start a statement")]
    UnknownStatement(TokenKind),
    #[error("a block must contain at least one statement")]
    EmptyBlock,
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Parser {
        debug_assert!(tokens.last().is_some_and(Token::is_eof));
        Parser { tokens, cursor: 0 }
    }

    fn parse_program(&mut self) -> Result<Block, Error> {
        let mut stmts = Vec::new();
        while !self.peek().is_eof() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Block { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        let Token { kind, pos } = self.peek().clone();
        let kind = match kind {
            TokenKind::Exit => {
                self.advance();
                // A bare `exit` exits with status zero.
                let value = if self.starts_expr() {
                    self.parse_expr(0)?
                } else {
                    Expr {
                        kind: ExprKind::Int("0".into()),
                        pos,
                    }
                };
                StmtKind::Exit(value)
            }
            TokenKind::Let => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Assign, "`=`")?;
                let init = self.parse_expr(0)?;
                StmtKind::Let { name, init }
            }
            TokenKind::Ident(name) => {
                self.advance();
                match self.peek().kind {
                    // `x := expr` declares, same as `let x = expr`.
                    TokenKind::ColonEq => {
                        self.advance();
                        let init = self.parse_expr(0)?;
                        StmtKind::Let { name, init }
                    }
                    TokenKind::Assign => {
                        self.advance();
                        let value = self.parse_expr(0)?;
                        StmtKind::Assign { name, value }
                    }
                    _ => return Err(self.unexpected("`=` or `:=`")),
                }
            }
            TokenKind::LBrace => StmtKind::Scope(self.parse_block()?),
            TokenKind::If => {
                self.advance();
                let test = self.parse_test()?;
                let body = self.parse_block()?;
                StmtKind::If { test, body }
            }
            TokenKind::For => {
                self.advance();
                let test = self.parse_test()?;
                let body = self.parse_block()?;
                StmtKind::For { test, body }
            }
            TokenKind::Print => {
                self.advance();
                StmtKind::Print(self.parse_expr(0)?)
            }
            other => {
                return Err(Error {
                    kind: ErrorKind::UnknownStatement(other),
                    pos,
                })
            }
        };
        Ok(Stmt { kind, pos })
    }

    /// Parses `{ stmt+ }`.
    fn parse_block(&mut self) -> Result<Block, Error> {
        let open = self.expect(&TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace | TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        if stmts.is_empty() {
            return Err(Error {
                kind: ErrorKind::EmptyBlock,
                pos: open.pos,
            });
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Block { stmts })
    }

    /// Parses a test: an expression optionally followed by one comparison.
    /// Without a comparison the expression is tested against zero.
    fn parse_test(&mut self) -> Result<Test, Error> {
        let lhs = self.parse_expr(0)?;
        let op = match self.peek().kind {
            TokenKind::Less => CmpOp::Less,
            TokenKind::Greater => CmpOp::Greater,
            TokenKind::Eq => CmpOp::Eq,
            _ => {
                let rhs = Expr {
                    kind: ExprKind::Int("0".into()),
                    pos: lhs.pos,
                };
                return Ok(Test {
                    op: CmpOp::Greater,
                    lhs,
                    rhs,
                });
            }
        };
        self.advance();
        let rhs = self.parse_expr(0)?;
        Ok(Test { op, lhs, rhs })
    }

    /// Precedence climbing.
    ///
    /// The recursion floor is bumped by one for every matched operator, not
    /// to the operator's own level, so runs of equal-precedence operators
    /// entered below their level nest to the right (`8 / 4 / 2` groups as
    /// `8 / (4 / 2)`). Emitted code depends on this grouping; keep it.
    fn parse_expr(&mut self, min_prec: u8) -> Result<Expr, Error> {
        let mut lhs = self.parse_term()?;
        loop {
            let Some((prec, op)) = binary_op(&self.peek().kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(min_prec + 1)?;
            lhs = Expr {
                pos: lhs.pos,
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    /// Parses an atom: a literal, an identifier or a parenthesized
    /// sub-expression.
    fn parse_term(&mut self) -> Result<Expr, Error> {
        let Token { kind, pos } = self.advance();
        let kind = match kind {
            TokenKind::Int(text) => ExprKind::Int(text),
            TokenKind::Str(text) => ExprKind::Str(text),
            TokenKind::Ident(name) => ExprKind::Id(name),
            TokenKind::LParen => {
                let inner = self.parse_expr(0)?;
                self.expect(&TokenKind::RParen, "`)`")?;
                return Ok(inner);
            }
            other => {
                return Err(Error {
                    kind: ErrorKind::ExpectedExpr(other),
                    pos,
                })
            }
        };
        Ok(Expr { kind, pos })
    }

    /// Whether the current token can start an expression.
    fn starts_expr(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Int(_) | TokenKind::Str(_) | TokenKind::Ident(_) | TokenKind::LParen
        )
    }

    /// Returns the current token. Past the end this keeps returning the
    /// trailing `Eof`.
    fn peek(&self) -> &Token {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    /// Advances if the current token matches the provided one. If not,
    /// reports an error using `expected` as the description.
    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<Token, Error> {
        if self.peek().kind == *kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self) -> Result<Box<str>, Error> {
        match self.peek().kind {
            TokenKind::Ident(_) => {
                let Token {
                    kind: TokenKind::Ident(name),
                    ..
                } = self.advance()
                else {
                    unreachable!();
                };
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn unexpected(&self, expected: &'static str) -> Error {
        let current = self.peek();
        Error {
            kind: ErrorKind::Unexpected {
                expected,
                found: current.kind.clone(),
            },
            pos: current.pos,
        }
    }
}

fn binary_op(kind: &TokenKind) -> Option<(u8, BinaryOp)> {
    let entry = match kind {
        TokenKind::Plus => (0, BinaryOp::Add),
        TokenKind::Minus => (0, BinaryOp::Sub),
        TokenKind::Star => (1, BinaryOp::Mul),
        TokenKind::Slash => (1, BinaryOp::Div),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer, util::fmt::print_program_string};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn parse_source(src: &str) -> Result<Block, Error> {
        parse(lexer::lex(src).expect("lexing should succeed"))
    }

    /// Folds a parsed arithmetic tree into its value, mirroring how the
    /// emitted stack code evaluates it.
    fn eval(expr: &Expr) -> i64 {
        match &expr.kind {
            ExprKind::Int(text) => text.parse().unwrap(),
            ExprKind::Binary { op, lhs, rhs } => {
                let (lhs, rhs) = (eval(lhs), eval(rhs));
                match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => lhs / rhs,
                }
            }
            other => panic!("not an arithmetic node: {other:?}"),
        }
    }

    fn eval_source(src: &str) -> i64 {
        let program = parse_source(&format!("exit {src}")).unwrap();
        let [Stmt {
            kind: StmtKind::Exit(expr),
            ..
        }] = &program.stmts[..]
        else {
            panic!("expected a single exit statement");
        };
        eval(expr)
    }

    #[test]
    fn arithmetic_evaluates_conventionally() {
        let cases = [
            ("6 / 3", 2),
            ("2 + 3 * 3 + 2", 13),
            ("3 * 3 + 2 + 2", 13),
            ("2 + 2 + 3 * 3", 13),
            ("1 + 2 + 6 / 3 - 1", 4),
            ("(1 + 4) * 8 / 2 - 3", 17),
            // Integer division truncates.
            ("1 + 4 * 8 / (2 + 3)", 7),
        ];
        for (src, expected) in cases {
            assert_eq!(eval_source(src), expected, "for `{src}`");
        }
    }

    #[test]
    fn equal_precedence_runs_nest_to_the_right() {
        // Left-associative grouping would give (8 / 4) / 2 == 1.
        assert_eq!(eval_source("8 / 4 / 2"), 4);
        let program = parse_source("exit 8 / 4 / 2").unwrap();
        assert_eq!(
            print_program_string(&program).trim(),
            indoc! {"
                exit
                  binary Div
                    int 8
                    binary Div
                      int 4
                      int 2
            "}
            .trim()
        );
    }

    #[test]
    fn exit_without_argument_defaults_to_zero() {
        let program = parse_source("exit").unwrap();
        let [Stmt {
            kind: StmtKind::Exit(value),
            ..
        }] = &program.stmts[..]
        else {
            panic!("expected a single exit statement");
        };
        assert_eq!(value.kind, ExprKind::Int("0".into()));
    }

    #[test]
    fn exit_with_argument_keeps_it() {
        assert_eq!(eval_source("1"), 1);
    }

    #[test]
    fn dangling_operator_is_a_positioned_error() {
        let err = parse_source("let x = 2 +").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedExpr(TokenKind::Eof));
        assert_eq!((err.pos.line, err.pos.col), (1, 11));
    }

    #[test]
    fn unmatched_paren_is_a_positioned_error() {
        let err = parse_source("let x = 2 + (2").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::Unexpected {
                expected: "`)`",
                found: TokenKind::Eof,
            }
        );
        assert_eq!((err.pos.line, err.pos.col), (1, 14));
    }

    #[test]
    fn colon_eq_declares_like_let() {
        let colon_eq = parse_source("x := 1 + 2").unwrap();
        let spelled_out = parse_source("let x = 1 + 2").unwrap();
        assert_eq!(
            print_program_string(&colon_eq),
            print_program_string(&spelled_out)
        );
    }

    #[test]
    fn assignment_needs_a_declared_looking_target() {
        let err = parse_source("x + 1").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::Unexpected {
                expected: "`=` or `:=`",
                found: TokenKind::Plus,
            }
        );
    }

    #[test]
    fn bare_test_compares_against_zero() {
        let program = parse_source("if x { exit }").unwrap();
        let [Stmt {
            kind: StmtKind::If { test, .. },
            ..
        }] = &program.stmts[..]
        else {
            panic!("expected a single if statement");
        };
        assert_eq!(test.op, CmpOp::Greater);
        assert_eq!(test.rhs.kind, ExprKind::Int("0".into()));
    }

    #[test]
    fn empty_block_is_an_error() {
        let err = parse_source("if x > 0 { }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyBlock);
    }

    #[test]
    fn missing_closing_brace_is_an_error() {
        let err = parse_source("for x > 0 { x = x - 1").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::Unexpected {
                expected: "`}`",
                found: TokenKind::Eof,
            }
        );
    }

    #[test]
    fn unknown_statement_is_a_positioned_error() {
        let err = parse_source("exit 0 ) exit 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownStatement(TokenKind::RParen));
        assert_eq!((err.pos.line, err.pos.col), (1, 7));
    }

    #[test]
    fn statements_nest() {
        let program = parse_source(indoc! {r#"
            let x = 5
            for x > 0 {
                x = x - 1
                if x == 2 {
                    print "almost"
                }
            }
            exit x
        "#})
        .unwrap();
        assert_eq!(
            print_program_string(&program).trim(),
            indoc! {r#"
                let x
                  int 5
                for Greater
                  id x
                  int 0
                  body
                    assign x
                      binary Sub
                        id x
                        int 1
                    if Eq
                      id x
                      int 2
                      body
                        print
                          str "almost"
                exit
                  id x
            "#}
            .trim()
        );
    }
}
