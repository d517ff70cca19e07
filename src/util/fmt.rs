//! Indented tree rendering of parsed programs, for debug dumps and tests.

use std::io::Write;

use crate::ast::{Block, Expr, ExprKind, Stmt, StmtKind, Test};

const INDENT_WIDTH: usize = 2;

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

pub fn print_program_string(program: &Block) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(w: &mut impl Write, program: &Block) -> std::io::Result<()> {
    for stmt in &program.stmts {
        print_stmt(w, 0, stmt)?;
    }
    Ok(())
}

fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    sp(w, i)?;
    match &stmt.kind {
        StmtKind::Let { name, init } => {
            writeln!(w, "let {name}")?;
            print_expr(w, i + 1, init)?;
        }
        StmtKind::Assign { name, value } => {
            writeln!(w, "assign {name}")?;
            print_expr(w, i + 1, value)?;
        }
        StmtKind::Scope(body) => {
            writeln!(w, "scope")?;
            for stmt in &body.stmts {
                print_stmt(w, i + 1, stmt)?;
            }
        }
        StmtKind::If { test, body } => {
            writeln!(w, "if {:?}", test.op)?;
            print_test_operands(w, i + 1, test)?;
            print_body(w, i + 1, body)?;
        }
        StmtKind::For { test, body } => {
            writeln!(w, "for {:?}", test.op)?;
            print_test_operands(w, i + 1, test)?;
            print_body(w, i + 1, body)?;
        }
        StmtKind::Exit(value) => {
            writeln!(w, "exit")?;
            print_expr(w, i + 1, value)?;
        }
        StmtKind::Print(value) => {
            writeln!(w, "print")?;
            print_expr(w, i + 1, value)?;
        }
    }
    Ok(())
}

fn print_test_operands(w: &mut impl Write, i: usize, test: &Test) -> std::io::Result<()> {
    print_expr(w, i, &test.lhs)?;
    print_expr(w, i, &test.rhs)
}

fn print_body(w: &mut impl Write, i: usize, body: &Block) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "body")?;
    for stmt in &body.stmts {
        print_stmt(w, i + 1, stmt)?;
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    match &expr.kind {
        ExprKind::Int(text) => writeln!(w, "int {text}")?,
        ExprKind::Str(text) => writeln!(w, "str {text:?}")?,
        ExprKind::Id(name) => writeln!(w, "id {name}")?,
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?}")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
    }
    Ok(())
}
