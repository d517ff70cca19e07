use std::{fmt::Write, format_args as f, marker::PhantomData};

use crate::{
    ast::{BinaryOp, Block, CmpOp, Expr, ExprKind, Stmt, StmtKind, Test},
    codegen::{env::Env, Error},
    scope::ScopeStack,
};

const DEFAULT_CODE_CAPACITY: usize = 4 * 1024; // 4 KiB

/// Lowers a checked program into NASM x86-64 source.
///
/// The evaluation model is a stack machine: every expression leaves exactly
/// one value on top of the hardware stack, and every statement that consumes
/// a value pops it. A declared variable's slot *is* the value its
/// initializer pushed; `stack_size` counts pushed slots so identifier loads
/// can be resolved to `[rsp + 8 * distance]` operands.
pub struct Generator<E> {
    code: String,
    vars: ScopeStack<usize>,
    stack_size: usize,
    labels: usize,
    strings: Vec<(String, Box<str>)>,
    _env: PhantomData<E>,
}

impl<E> Default for Generator<E> {
    fn default() -> Self {
        Generator {
            code: String::with_capacity(DEFAULT_CODE_CAPACITY),
            vars: ScopeStack::new(),
            stack_size: 0,
            labels: 0,
            strings: Vec::new(),
            _env: PhantomData,
        }
    }
}

impl<E: Env> Generator<E> {
    pub fn new() -> Generator<E> {
        Generator::default()
    }

    pub fn generate(mut self, program: &Block) -> Result<String, Error> {
        self.raw(f!("global {}", E::ENTRY_POINT));
        self.raw("section .text");
        self.raw(f!("{}:", E::ENTRY_POINT));
        for stmt in &program.stmts {
            self.stmt(stmt)?;
        }
        debug_assert_eq!(self.vars.depth(), 0, "unbalanced scope nesting");
        // The program terminates even without an explicit `exit`.
        self.ins(f!("mov rax, {}", E::SYS_EXIT));
        self.ins("mov rdi, 0");
        self.ins("syscall");
        self.data();
        Ok(self.code)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match &stmt.kind {
            StmtKind::Let { name, init } => {
                self.expr(init)?;
                // The initializer's slot becomes the variable.
                self.vars
                    .declare(name, self.stack_size)
                    .map_err(|()| Error::Redeclared(name.clone()))
            }
            StmtKind::Assign { name, value } => {
                self.slot(name)?;
                self.expr(value)?;
                self.pop("rax");
                let offset = self.slot(name)?;
                self.ins(f!("mov qword [rsp + {offset}], rax"));
                Ok(())
            }
            StmtKind::Scope(body) => self.scope(body),
            StmtKind::If { test, body } => {
                let end = self.fresh("lbl");
                self.test(test)?;
                self.ins(f!("{} {end}", inverse_jump(test.op)));
                self.scope(body)?;
                self.label(&end);
                Ok(())
            }
            StmtKind::For { test, body } => {
                let start = self.fresh("lbl");
                let end = self.fresh("lbl");
                // Skip the loop entirely if the test fails up front; after
                // each pass, re-test at the bottom and jump back while it
                // still holds.
                self.test(test)?;
                self.ins(f!("{} {end}", inverse_jump(test.op)));
                self.label(&start);
                self.scope(body)?;
                self.test(test)?;
                self.ins(f!("{} {start}", direct_jump(test.op)));
                self.label(&end);
                Ok(())
            }
            StmtKind::Exit(value) => {
                self.expr(value)?;
                self.pop("rdi");
                self.ins(f!("mov rax, {}", E::SYS_EXIT));
                self.ins("syscall");
                Ok(())
            }
            StmtKind::Print(value) => {
                self.expr(value)?;
                self.print();
                Ok(())
            }
        }
    }

    /// Emits a block body, reclaiming its declarations' stack slots on exit
    /// so the stack returns to its pre-block depth.
    fn scope(&mut self, body: &Block) -> Result<(), Error> {
        self.vars.enter();
        for stmt in &body.stmts {
            self.stmt(stmt)?;
        }
        let dropped = self.vars.exit();
        if dropped > 0 {
            self.ins(f!("add rsp, {}", dropped * 8));
            self.stack_size -= dropped;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), Error> {
        match &expr.kind {
            ExprKind::Int(text) => {
                self.ins(f!("mov rax, {text}"));
                self.push("rax");
            }
            ExprKind::Str(text) => {
                let label = self.fresh("str");
                self.ins(f!("lea rax, [rel {label}]"));
                self.push("rax");
                self.strings.push((label, text.clone()));
            }
            ExprKind::Id(name) => {
                let offset = self.slot(name)?;
                self.push(f!("qword [rsp + {offset}]"));
            }
            ExprKind::Binary { op, lhs, rhs } => {
                // Right operand first, so the left ends up on top.
                self.expr(rhs)?;
                self.expr(lhs)?;
                self.pop("rax");
                self.pop("rbx");
                match op {
                    BinaryOp::Add => self.ins("add rax, rbx"),
                    BinaryOp::Sub => self.ins("sub rax, rbx"),
                    BinaryOp::Mul => self.ins("imul rax, rbx"),
                    BinaryOp::Div => {
                        // Zero-extend the dividend into rdx:rax.
                        self.ins("xor rdx, rdx");
                        self.ins("div rbx");
                    }
                }
                self.push("rax");
            }
        }
        Ok(())
    }

    /// Evaluates both operands of a test and leaves the comparison's flags
    /// set, with both values popped.
    fn test(&mut self, test: &Test) -> Result<(), Error> {
        self.expr(&test.lhs)?;
        self.expr(&test.rhs)?;
        self.pop("rbx");
        self.pop("rax");
        self.ins("cmp rax, rbx");
        Ok(())
    }

    /// Emits the length scan and write for a `print`, consuming the string
    /// address on top of the stack.
    fn print(&mut self) {
        let scan = self.fresh("lbl");
        let done = self.fresh("lbl");
        self.pop("rsi");
        self.ins("xor rdx, rdx");
        self.label(&scan);
        self.ins("cmp byte [rsi + rdx], 0");
        self.ins(f!("je {done}"));
        self.ins("inc rdx");
        self.ins(f!("jmp {scan}"));
        self.label(&done);
        self.ins(f!("mov rax, {}", E::SYS_WRITE));
        self.ins(f!("mov rdi, {}", E::STDOUT_FD));
        self.ins("syscall");
    }

    /// Emits the string pool.
    fn data(&mut self) {
        if self.strings.is_empty() {
            return;
        }
        self.raw("section .data");
        for (label, text) in std::mem::take(&mut self.strings) {
            self.raw(f!("{label}: db {}", data_bytes(&text)));
        }
    }

    /// Resolves a variable to its current `[rsp]`-relative byte offset.
    fn slot(&self, name: &str) -> Result<usize, Error> {
        let loc = self
            .vars
            .lookup(name)
            .ok_or_else(|| Error::Undeclared(name.into()))?;
        Ok((self.stack_size - loc) * 8)
    }

    fn fresh(&mut self, prefix: &str) -> String {
        let n = self.labels;
        self.labels += 1;
        format!("{prefix}{n}")
    }

    fn push(&mut self, src: impl std::fmt::Display) {
        self.ins(f!("push {src}"));
        self.stack_size += 1;
    }

    fn pop(&mut self, dst: &str) {
        self.ins(f!("pop {dst}"));
        self.stack_size -= 1;
    }

    /// Prints an indented instruction line.
    fn ins(&mut self, line: impl std::fmt::Display) {
        writeln!(self.code, "    {line}").expect("emitting should be infallible");
    }

    fn label(&mut self, name: &str) {
        self.raw(f!("{name}:"));
    }

    /// Prints an unindented line.
    fn raw(&mut self, line: impl std::fmt::Display) {
        writeln!(self.code, "{line}").expect("emitting should be infallible");
    }
}

/// The jump taken when the comparison holds.
fn direct_jump(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Less => "jl",
        CmpOp::Greater => "jg",
        CmpOp::Eq => "je",
    }
}

/// The jump taken when the comparison does not hold, used to branch over an
/// `if` body or out of a `for` loop.
fn inverse_jump(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Less => "jge",
        CmpOp::Greater => "jle",
        CmpOp::Eq => "jne",
    }
}

/// Renders string bytes as a null-terminated NASM `db` operand list.
/// Printable ASCII is kept in quoted runs; everything else is a numeric
/// byte.
fn data_bytes(text: &str) -> String {
    let mut parts = Vec::new();
    let mut run = String::new();
    for &byte in text.as_bytes() {
        if (0x20..0x7f).contains(&byte) && byte != b'"' {
            run.push(char::from(byte));
        } else {
            if !run.is_empty() {
                parts.push(format!("\"{run}\""));
                run.clear();
            }
            parts.push(byte.to_string());
        }
    }
    if !run.is_empty() {
        parts.push(format!("\"{run}\""));
    }
    parts.push("0".to_string());
    parts.join(", ")
}
