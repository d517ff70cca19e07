//! Compiler for tack, a small imperative language: integers, strings,
//! scalar variables, block scopes, conditionals, counting loops, `print`
//! and `exit`.

use thiserror::Error;

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The type checker walks an AST, inferring variable types and rejecting
/// mismatches.
pub mod type_checker;

/// The code generator lowers a checked AST into assembly text.
pub mod codegen;

pub mod ast;
pub mod scope;
pub mod token;

pub mod util {
    pub mod fmt;
}

/// A failure in any stage of the pipeline.
///
/// The first three variants are user-facing diagnostics with positions; a
/// [`codegen::Error`] means the earlier stages let a bad program through.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] lexer::Error),
    #[error(transparent)]
    Parse(#[from] parser::Error),
    #[error(transparent)]
    Check(#[from] type_checker::Error),
    #[error("internal error: {0}")]
    Codegen(#[from] codegen::Error),
}

/// Compiles a source string into assembly for the given target.
///
/// Each stage's output is fully materialized before the next one starts,
/// and the first failure aborts the pipeline.
pub fn compile(src: &str, target: codegen::Target) -> Result<String, CompileError> {
    let tokens = lexer::lex(src)?;
    let program = parser::parse(tokens)?;
    type_checker::check(&program)?;
    Ok(codegen::generate(target, &program)?)
}
