// program ::= stmt*
// stmt ::= 'exit' [expr]
//        | 'let' ID '=' expr
//        | ID ':=' expr
//        | ID '=' expr
//        | '{' stmt+ '}'
//        | 'if' test '{' stmt+ '}'
//        | 'for' test '{' stmt+ '}'
//        | 'print' expr
// test ::= expr [('<' | '>' | '==') expr]
// expr ::= expr ('+' | '-') expr
//        | expr ('*' | '/') expr
//        | '(' expr ')'
//        | ID
//        | integer
//        | string

use crate::token::Pos;

/// An ordered statement sequence; insertion order is execution order.
///
/// The body of a scope, `if` or `for` holds at least one statement. The
/// top-level program may be empty.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Pos,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StmtKind {
    Let {
        name: Box<str>,
        init: Expr,
    },
    Assign {
        name: Box<str>,
        value: Expr,
    },
    Scope(Block),
    If {
        test: Test,
        body: Block,
    },
    For {
        test: Test,
        body: Block,
    },
    Exit(Expr),
    Print(Expr),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Pos,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ExprKind {
    Int(Box<str>),
    Str(Box<str>),
    Id(Box<str>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// The condition of an `if` or `for`.
///
/// A bare expression parses into the `lhs > 0` form, so every test carries
/// both operands.
#[derive(Debug, PartialEq, Eq)]
pub struct Test {
    pub op: CmpOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Less,
    Greater,
    Eq,
}
