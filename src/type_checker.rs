use std::fmt;

use thiserror::Error;

use crate::{
    ast::{Block, Expr, ExprKind, Stmt, StmtKind, Test},
    scope::ScopeStack,
    token::Pos,
};

/// Walks the program once, inferring a type for every declared variable and
/// rejecting mismatches. Code generation must not run unless this succeeds.
pub fn check(program: &Block) -> Result<(), Error> {
    Checker::default().check_block_stmts(program)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ty {
    Int,
    Str,
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => f.write_str("integer"),
            Ty::Str => f.write_str("string"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{pos}: {kind}")]
pub struct Error {
    pub kind: ErrorKind,
    pub pos: Pos,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("variable `{0}` is not in scope")]
    NotInScope(Box<str>),
    #[error("variable `{0}` is already declared")]
    Redeclared(Box<str>),
    #[error("mismatched operand types, {lhs} and {rhs}")]
    OperandMismatch { lhs: Ty, rhs: Ty },
    #[error("cannot assign a {found} value to `{name}`, which holds a {expected}")]
    AssignMismatch {
        name: Box<str>,
        expected: Ty,
        found: Ty,
    },
}

#[derive(Default)]
struct Checker {
    scopes: ScopeStack<Ty>,
}

impl Checker {
    fn check_block_stmts(&mut self, block: &Block) -> Result<(), Error> {
        for stmt in &block.stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match &stmt.kind {
            StmtKind::Let { name, init } => {
                let ty = self.infer(init)?;
                self.scopes.declare(name, ty).map_err(|()| Error {
                    kind: ErrorKind::Redeclared(name.clone()),
                    pos: stmt.pos,
                })
            }
            StmtKind::Assign { name, value } => {
                let Some(&expected) = self.scopes.lookup(name) else {
                    return Err(Error {
                        kind: ErrorKind::NotInScope(name.clone()),
                        pos: stmt.pos,
                    });
                };
                let found = self.infer(value)?;
                if found != expected {
                    return Err(Error {
                        kind: ErrorKind::AssignMismatch {
                            name: name.clone(),
                            expected,
                            found,
                        },
                        pos: stmt.pos,
                    });
                }
                Ok(())
            }
            StmtKind::Scope(body) => self.check_scope(body),
            StmtKind::If { test, body } | StmtKind::For { test, body } => {
                self.check_test(test)?;
                self.check_scope(body)
            }
            // Exit and print operands are validated but not restricted to a
            // type; the generated code takes whatever value the expression
            // leaves on the stack.
            StmtKind::Exit(value) | StmtKind::Print(value) => self.infer(value).map(|_| ()),
        }
    }

    /// Checks a block body. Declarations made inside are no longer visible
    /// once the block ends.
    fn check_scope(&mut self, body: &Block) -> Result<(), Error> {
        self.scopes.enter();
        let result = self.check_block_stmts(body);
        self.scopes.exit();
        result
    }

    /// The test's two operands are validated independently; comparing an
    /// integer against a string is not itself rejected here.
    fn check_test(&mut self, test: &Test) -> Result<(), Error> {
        self.infer(&test.lhs)?;
        self.infer(&test.rhs)?;
        Ok(())
    }

    fn infer(&self, expr: &Expr) -> Result<Ty, Error> {
        match &expr.kind {
            ExprKind::Int(_) => Ok(Ty::Int),
            ExprKind::Str(_) => Ok(Ty::Str),
            ExprKind::Id(name) => self.scopes.lookup(name).copied().ok_or_else(|| Error {
                kind: ErrorKind::NotInScope(name.clone()),
                pos: expr.pos,
            }),
            ExprKind::Binary { lhs, rhs, .. } => {
                let (lhs, rhs) = (self.infer(lhs)?, self.infer(rhs)?);
                if lhs != rhs {
                    return Err(Error {
                        kind: ErrorKind::OperandMismatch { lhs, rhs },
                        pos: expr.pos,
                    });
                }
                Ok(lhs)
            }
        }
    }
}
