use std::{
    fs, io,
    path::{Path, PathBuf},
    process::{Command, ExitCode},
};

use clap::{Parser, ValueEnum};
use thiserror::Error;

use tack::{codegen, compile, lexer, parser, util::fmt, CompileError};

#[derive(Parser)]
#[command(name = "tackc", version, about = "Compiler for the tack language")]
struct Args {
    /// Source file to compile.
    input: PathBuf,

    /// Output path. Defaults to the input path with a `.s` extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DEFAULT_TARGET)]
    target: TargetArg,

    /// What to write out: a token dump, an AST dump, or assembly.
    #[arg(long, value_enum, default_value_t = Emit::Asm)]
    emit: Emit,

    /// Assemble and link the output into an executable (requires `nasm`
    /// and `ld` on the path).
    #[arg(long)]
    link: bool,
}

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum TargetArg {
    x86_64_darwin,
    x86_64_linux,
}

impl From<TargetArg> for codegen::Target {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::x86_64_darwin => codegen::Target::x86_64_darwin,
            TargetArg::x86_64_linux => codegen::Target::x86_64_linux,
        }
    }
}

impl std::fmt::Display for TargetArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", codegen::Target::from(*self))
    }
}

#[cfg(target_os = "macos")]
const DEFAULT_TARGET: TargetArg = TargetArg::x86_64_darwin;
#[cfg(not(target_os = "macos"))]
const DEFAULT_TARGET: TargetArg = TargetArg::x86_64_linux;

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Emit {
    Tokens,
    Ast,
    Asm,
}

impl std::fmt::Display for Emit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Emit::Tokens => f.write_str("tokens"),
            Emit::Ast => f.write_str("ast"),
            Emit::Asm => f.write_str("asm"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("tackc: {failure}");
            ExitCode::from(failure.status())
        }
    }
}

#[derive(Debug, Error)]
enum Failure {
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: io::Error,
    },
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("{0}")]
    Tool(String),
}

impl Failure {
    /// Every stage fails with a distinct status so callers can tell them
    /// apart: 1 usage/tooling, 2 lexing, 3 parsing, 4 type checking,
    /// 5 internal.
    fn status(&self) -> u8 {
        match self {
            Failure::Io { .. } | Failure::Tool(_) => 1,
            Failure::Compile(CompileError::Lex(_)) => 2,
            Failure::Compile(CompileError::Parse(_)) => 3,
            Failure::Compile(CompileError::Check(_)) => 4,
            Failure::Compile(CompileError::Codegen(_)) => 5,
        }
    }
}

fn run(args: &Args) -> Result<(), Failure> {
    let src = fs::read_to_string(&args.input).map_err(|source| Failure::Io {
        context: format!("failed to read {}", args.input.display()),
        source,
    })?;
    let target = codegen::Target::from(args.target);

    match args.emit {
        Emit::Tokens => {
            let tokens = lexer::lex(&src).map_err(CompileError::from)?;
            for token in tokens {
                println!("{token:?}");
            }
            Ok(())
        }
        Emit::Ast => {
            let tokens = lexer::lex(&src).map_err(CompileError::from)?;
            let program = parser::parse(tokens).map_err(CompileError::from)?;
            print!("{}", fmt::print_program_string(&program));
            Ok(())
        }
        Emit::Asm => {
            let asm = compile(&src, target)?;
            let out = args
                .output
                .clone()
                .unwrap_or_else(|| args.input.with_extension("s"));
            fs::write(&out, asm).map_err(|source| Failure::Io {
                context: format!("failed to write {}", out.display()),
                source,
            })?;
            if args.link {
                assemble_and_link(&out, target)?;
            }
            Ok(())
        }
    }
}

/// Runs the external assembler and linker over the emitted file.
fn assemble_and_link(asm: &Path, target: codegen::Target) -> Result<(), Failure> {
    let object = asm.with_extension("o");
    let executable = asm.with_extension("");

    let mut nasm = Command::new("nasm");
    nasm.arg("-f").arg(target.nasm_format()).arg(asm);
    nasm.arg("-o").arg(&object);
    run_tool(nasm)?;

    let mut ld = Command::new("ld");
    if target == codegen::Target::x86_64_darwin {
        ld.arg("-lSystem");
    }
    ld.arg("-o").arg(&executable).arg(&object);
    run_tool(ld)
}

fn run_tool(mut command: Command) -> Result<(), Failure> {
    let name = command.get_program().to_string_lossy().into_owned();
    let status = command.status().map_err(|source| Failure::Io {
        context: format!("failed to run {name}"),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(Failure::Tool(format!("{name} exited with {status}")))
    }
}
