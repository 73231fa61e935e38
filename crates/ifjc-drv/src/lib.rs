//! ifjc-drv - Compiler driver.
//!
//! Orchestrates the phases: primes the global scope with the `Ifj.*`
//! builtins, reads the prologue, parses, resolves the deferred-reference
//! list, enforces the declared-function check and finally emits IFJcode25 to
//! stdout. The first error terminates the pipeline; the process exit code is
//! the error kind's code.

use std::fmt::Write as _;
use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use log::debug;

use ifjc_gen::generate;
use ifjc_lex::{Lexer, TokenKind, TokenValue};
use ifjc_par::Parser;
use ifjc_sem::{check_declared, resolve_deferred};
use ifjc_sym::{ScopeStack, Symbol, SymbolKind, TypeMask};
use ifjc_util::CompileResult;

/// What the driver produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitKind {
    /// Dump the token stream after the prologue and stop.
    Tokens,
    /// Dump the syntax tree and stop.
    Ast,
    /// Full compilation to IFJcode25.
    Code,
}

/// Driver configuration.
#[derive(Debug)]
pub struct Config {
    /// Source file; standard input when absent.
    pub input: Option<PathBuf>,
    pub emit: EmitKind,
    pub verbose: bool,
}

impl Config {
    /// Parses command-line arguments (without the program name).
    ///
    /// `ifjc [--emit-tokens | --emit-ast] [--verbose] [FILE]`
    pub fn from_args(args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut config = Config {
            input: None,
            emit: EmitKind::Code,
            verbose: false,
        };

        for arg in args {
            match arg.as_str() {
                "--emit-tokens" => config.emit = EmitKind::Tokens,
                "--emit-ast" => config.emit = EmitKind::Ast,
                "--verbose" | "-v" => config.verbose = true,
                flag if flag.starts_with('-') => {
                    return Err(format!("unknown option '{}'", flag));
                }
                path => {
                    if config.input.is_some() {
                        return Err("more than one input file".to_string());
                    }
                    config.input = Some(PathBuf::from(path));
                }
            }
        }

        Ok(config)
    }
}

/// Runs the configured pipeline; returns the process exit code.
///
/// The emitted program goes to stdout, diagnostics to stderr.
pub fn run(config: &Config) -> i32 {
    let source = match read_source(config) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error (code 99): {:#}", err);
            return 99;
        }
    };

    match compile(&source, config.emit) {
        Ok(output) => {
            print!("{}", output);
            0
        }
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    }
}

fn read_source(config: &Config) -> anyhow::Result<String> {
    match &config.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read '{}'", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("cannot read standard input")?;
            Ok(source)
        }
    }
}

/// Compiles `source` to the requested output.
pub fn compile(source: &str, emit: EmitKind) -> CompileResult<String> {
    let mut lexer = Lexer::new(source);

    debug!("reading prologue");
    lexer.read_prologue()?;

    if emit == EmitKind::Tokens {
        return dump_tokens(lexer);
    }

    let mut scopes = ScopeStack::new();
    scopes.push();
    load_builtins(&mut scopes);

    debug!("parsing");
    let mut parser = Parser::new(lexer, &mut scopes);
    let root = parser.parse_program()?;
    let mut ast = parser.ast;
    let deferred = parser.deferred;

    if emit == EmitKind::Ast {
        return Ok(ast.dump(root));
    }

    debug!("resolving {} deferred reference(s)", deferred.len());
    scopes.push();
    resolve_deferred(&mut ast, &deferred, &mut scopes)?;
    check_declared(&scopes)?;
    scopes.pop();

    debug!("generating code");
    generate(&ast, root, &scopes)
}

/// Renders the remaining token stream, one token per line.
fn dump_tokens(mut lexer: Lexer<'_>) -> CompileResult<String> {
    let mut out = String::new();
    loop {
        let token = lexer.next()?;
        match &token.value {
            TokenValue::None => {
                let _ = writeln!(out, "{:<4} {}", token.line, token.kind);
            }
            value => {
                let _ = writeln!(out, "{:<4} {} {}", token.line, token.kind, value);
            }
        }
        if token.kind == TokenKind::Eof {
            return Ok(out);
        }
    }
}

/// Installs the `Ifj.*` builtins into the global scope.
///
/// The symbols carry mangled names, fixed arities and per-parameter masks,
/// and are born declared, so calls to them never defer and the
/// declared-function check never trips over them.
pub fn load_builtins(scopes: &mut ScopeStack) {
    let unknown = TypeMask::UNKNOWN;
    let num_arg = TypeMask::INT | TypeMask::FLOAT | TypeMask::UNKNOWN;
    let str_arg = TypeMask::STRING | TypeMask::UNKNOWN;

    let builtins: [(&str, TypeMask, &[TypeMask]); 10] = [
        ("write", TypeMask::NULL, &[unknown]),
        ("read_str", TypeMask::STRING | TypeMask::NULL, &[]),
        ("read_num", TypeMask::FLOAT | TypeMask::NULL, &[]),
        ("floor", TypeMask::INT, &[num_arg]),
        ("str", TypeMask::STRING, &[unknown]),
        ("length", TypeMask::INT, &[str_arg]),
        (
            "substring",
            TypeMask::STRING | TypeMask::NULL,
            &[str_arg, num_arg, num_arg],
        ),
        ("strcmp", TypeMask::INT, &[str_arg, str_arg]),
        ("ord", TypeMask::INT, &[str_arg, num_arg]),
        ("chr", TypeMask::STRING, &[num_arg]),
    ];

    for (name, ret, params) in builtins {
        let mut symbol = Symbol::new(name, ret, SymbolKind::Func, params.len());
        symbol.declared = true;
        symbol.param_types = params.to_vec();
        scopes.global_mut().insert(symbol);
    }
}
