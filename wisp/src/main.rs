use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser as _;
use tracing::{debug, error, metadata::LevelFilter};
use tracing_subscriber::{prelude::*, EnvFilter};

use wisp_foundation::Diagnostics;
use wisp_preprocessor::{Preprocessor, StdFileProvider};
use wisp_syntax::parser;

/// Runs the lexer/preprocessor/parser pipeline over a single source file.
///
/// The interactive REPL loop, argument-string splitting for embedded
/// "commands", and benchmark timing that the original distillation
/// excludes (§1) remain excluded here too: this driver only ever processes
/// one file per invocation.
#[derive(Debug, clap::Parser)]
pub struct Args {
    /// Source file to process.
    source: PathBuf,

    /// Overrides the macro expansion recursion limit (default 32).
    #[clap(long)]
    macro_depth: Option<usize>,

    /// Skips installing the `__FILE__`/`__VERSION__`/... built-in macros.
    #[clap(long)]
    skip_builtins: bool,

    /// Prints the preprocessed token stream instead of running the parser.
    #[clap(long)]
    dump_tokens: bool,

    /// Prints the parsed AST.
    #[clap(long)]
    dump_ast: bool,
}

pub fn fallible_main(args: Args) -> anyhow::Result<ExitCode> {
    if !args.source.is_file() {
        bail!("{} is not a file", args.source.display());
    }
    let source = std::fs::read_to_string(&args.source)
        .with_context(|| format!("cannot read source file at {:?}", args.source))?;
    let file_name = args.source.to_string_lossy().into_owned();

    let mut diagnostics = Diagnostics::new();

    debug!(file = %file_name, "lexing");
    let tokens = wisp_lexer::lex(&source, &mut diagnostics);
    if diagnostics.display() {
        return Ok(ExitCode::FAILURE);
    }

    debug!(token_count = tokens.len(), "preprocessing");
    let file_provider = StdFileProvider;
    let mut preprocessor = Preprocessor::new(
        tokens,
        &mut diagnostics,
        &file_name,
        &file_provider,
        args.skip_builtins,
    );
    if let Some(max_macro_depth) = args.macro_depth {
        preprocessor.specify_max_macro_depth(max_macro_depth);
    }
    let tokens = preprocessor.process();
    if diagnostics.display() {
        return Ok(ExitCode::FAILURE);
    }

    if args.dump_tokens {
        for token in &tokens {
            println!("{token}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    debug!(token_count = tokens.len(), "parsing");
    let program = parser::parse(&tokens, &mut diagnostics);
    if diagnostics.display() {
        return Ok(ExitCode::FAILURE);
    }

    if args.dump_ast {
        print!("{program}");
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let subscriber = tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        );
    tracing::subscriber::set_global_default(subscriber)
        .expect("cannot set default tracing subscriber");

    let args = Args::parse();

    match fallible_main(args) {
        Ok(code) => code,
        Err(error) => {
            error!("{error:?}");
            ExitCode::FAILURE
        }
    }
}
