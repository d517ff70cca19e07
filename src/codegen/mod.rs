use thiserror::Error;

use crate::ast::Block;

mod env;
mod x86_64;

pub use env::{Darwin, Env, Linux};
pub use x86_64::Generator;

/// Lowers a checked program into assembly for the given target.
pub fn generate(target: Target, program: &Block) -> Result<String, Error> {
    match target {
        Target::x86_64_darwin => Generator::<Darwin>::new().generate(program),
        Target::x86_64_linux => Generator::<Linux>::new().generate(program),
    }
}

/// A generation failure.
///
/// Both variants are compiler-internal invariant violations: the type
/// checker rejects these programs before generation starts, so hitting one
/// means an earlier stage let something through.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("undeclared variable `{0}` reached code generation")]
    Undeclared(Box<str>),
    #[error("duplicate declaration of `{0}` reached code generation")]
    Redeclared(Box<str>),
}

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Target {
    x86_64_darwin,
    x86_64_linux,
}

impl Target {
    pub const ALL: &'static [Target] = &[Target::x86_64_darwin, Target::x86_64_linux];

    pub const fn triple(&self) -> &'static str {
        match self {
            Target::x86_64_darwin => "x86_64-apple-darwin",
            Target::x86_64_linux => "x86_64-unknown-linux-gnu",
        }
    }

    /// The `nasm -f` output format matching this target.
    pub const fn nasm_format(&self) -> &'static str {
        match self {
            Target::x86_64_darwin => "macho64",
            Target::x86_64_linux => "elf64",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::x86_64_darwin => f.write_str("x86_64_darwin"),
            Target::x86_64_linux => f.write_str("x86_64_linux"),
        }
    }
}
