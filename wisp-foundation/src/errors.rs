//! The stable error taxonomy (§7).
//!
//! Each stage gets its own `thiserror`-derived enum. The `Display` impls are
//! the stable, human-readable messages that end up in [`crate::Diagnostics`];
//! callers generally just do `diagnostics.insert(error.to_string())`.

use thiserror::Error;

/// Errors produced while converting a character stream into tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unterminated multi-line comment.")]
    UnterminatedComment,
    #[error("Unterminated string.")]
    UnterminatedString,
    #[error("Invalid escape code in character/string.")]
    InvalidEscapeCode,
    #[error("Invalid character while lexing, characters can only be one character in size.")]
    InvalidChar,
    #[error("Unexpected character while lexing.")]
    UnexpectedChar,
    #[error("Invalid single quote placement in number.")]
    InvalidQuotes,
    #[error("Invalid real number with multiple dots.")]
    InvalidRealNumber,
}

/// Errors produced while rewriting the token vector (definitions, invocation,
/// inclusion, concatenation, logging).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreprocessorError {
    #[error("Expected an identifier after macro definition.")]
    ExpectedIdentMacroDef,
    #[error("Expected '=' after macro identifier in macro definition.")]
    ExpectedEqualsMacroDef,
    #[error("Tried to define a macro that already exists.")]
    MacroExists,
    #[error("Invalid macro parameters in macro definition, either use no parentheses or parentheses with parameters.")]
    InvalidMacroParams,
    #[error("Invalid macro body, expected atleast one token. Use ';' instead of '=' if pure definition macro is needed.")]
    InvalidMacroBody,
    #[error("Expected a ',' or a ')' after a parameter in macro definition.")]
    ExpectedCommaOrRParen,
    #[error("Invalid macro call, either unclosed parentheses or parentheses without arguments.")]
    InvalidMacroCall,
    #[error("Tried to call a macro that was defined without a body.")]
    CalledEmptyMacro,
    #[error("Tried to call a macro where the argument count did not match the definition parameter count.")]
    InvalidArgCount,
    #[error("Detected infinite macro loop, if this was a mistake, set '--macro-depth' run argument to a higher value.")]
    InfiniteMacroLoop,
    #[error("Expected statement/macro to end in a semicolon.")]
    StatementSemicolon,
    #[error("Invalid concatenation macro, expected two operands.")]
    InvalidConcatenationMacro,
    #[error("Invalid equality/inequality macro, expected two operands.")]
    InvalidEqualityMacro,
    #[error("Expected a macro identifier after the '#undef' keyword.")]
    InvalidUndefine,
    #[error("Invalid variadic macro, the '...' operator can only be used once and only at the end of the parameter list.")]
    InvalidVariadicMacro,
    #[error("Expected a string after the error macro.")]
    ExpectedStringAfterError,
    #[error("Tried to import a file that does not exist.")]
    ImportInvalidFile,
    #[error("Expected a file after '#include'/'#import' keyword.")]
    ExpectedFile,

    #[error("Macro conditionals must start with '#if'.")]
    InvalidMcondStart,
    #[error("Macro conditional did not end with an '#endif'.")]
    McondEndif,
    #[error("Invalid macro conditional, expected a new line after the boolean expression.")]
    InvalidMcond,
    #[error("Mismatched parentheses in macro conditional boolean expression.")]
    McondMismatchedParentheses,
    #[error("Invalid boolean expression in macro conditional.")]
    InvalidBoolExpr,
    #[error("Unexpected token in macro conditional boolean expression.")]
    UnexpectedTokenMcond,
    #[error("Could not convert the token to a number.")]
    CouldNotConvertNumber,
}

/// Errors produced while building the AST from the preprocessed token vector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected a ':' after the middle expression in the ternary expression while parsing.")]
    ExpectedColonTernary,
    #[error("Mismatched parentheses while parsing.")]
    MismatchedParentheses,
    #[error("Expected primary expression while parsing.")]
    ExpectedPrimaryExpression,
    #[error("Expected a type name after 'mut'/'con'.")]
    ExpectedType,
    #[error("Expected an identifier after variable declaration.")]
    ExpectedIdentifierVarDecl,
    #[error("Expected a ';' or '=' after variable declaration identifier.")]
    ExpectedEqualsOrSemicolon,
    #[error("Expected the immutable/constant variable to have a body.")]
    ExpectedVarBody,
    #[error("Automatic variable must have an initial variable body.")]
    AutoMustHaveBody,
    #[error("Could not convert the token to a number.")]
    CouldNotConvertNumber,
}

/// Ambient file I/O errors, shared by the `FileProvider` contract (§4.5/§6).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("Could not open the given file.")]
    CannotOpenFile,
}
