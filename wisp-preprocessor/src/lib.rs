//! The preprocessor: rewrites the lexer's token vector in place before the
//! parser sees it — macro definitions/invocation, conditional compilation,
//! file inclusion, concatenation/equality, `#error`/`#log` (§4.3).

pub mod builtins;
pub mod conditional;
pub mod file_provider;
pub mod preprocessor;

pub use file_provider::{FileProvider, InMemoryFileProvider, StdFileProvider};
pub use preprocessor::Preprocessor;

use wisp_foundation::Diagnostics;
use wisp_lexer::Token;

/// Convenience entry point mirroring [`wisp_lexer::lex`].
pub fn preprocess(
    tokens: Vec<Token>,
    diagnostics: &mut Diagnostics,
    originating_file: &str,
    file_provider: &dyn FileProvider,
) -> Vec<Token> {
    Preprocessor::new(tokens, diagnostics, originating_file, file_provider, false).process()
}
