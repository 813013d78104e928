//! Built-in macros installed on construction unless suppressed (§6).

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use wisp_lexer::{Token, TokenKind};
use wisp_foundation::version;

fn value(kind: TokenKind, lexeme: impl Into<String>) -> Vec<Token> {
    vec![Token::new(kind, lexeme)]
}

fn declaration() -> Vec<Token> {
    vec![Token::new(TokenKind::Skip, "")]
}

/// `current_file` becomes the initial value of `__FILE__` (the CLI passes
/// the source path; the REPL / library caller may pass `"REPL"`, per §6).
pub fn install(macros: &mut HashMap<String, Vec<Token>>, current_file: &str) {
    macros.insert("__FILE__".to_string(), value(TokenKind::String, current_file));

    macros.insert(
        "__VERSION__".to_string(),
        value(TokenKind::Integer, version::VERSION.to_string()),
    );
    macros.insert(
        "__VERSION_MAJOR__".to_string(),
        value(TokenKind::Integer, version::MAJOR.to_string()),
    );
    macros.insert(
        "__VERSION_MINOR__".to_string(),
        value(TokenKind::Integer, version::MINOR.to_string()),
    );
    macros.insert(
        "__VERSION_PATCH__".to_string(),
        value(TokenKind::Integer, version::PATCH.to_string()),
    );
    macros.insert(
        "__VERSION_STR__".to_string(),
        value(TokenKind::String, version::VERSION_STR),
    );

    let now = SystemTime::now();
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    macros.insert(
        "__EPOCH__".to_string(),
        value(TokenKind::Integer, since_epoch.as_secs().to_string()),
    );
    macros.insert(
        "__EPOCH_NS__".to_string(),
        value(TokenKind::Integer, since_epoch.as_nanos().to_string()),
    );

    let datetime: DateTime<Utc> = now.into();
    macros.insert(
        "__DATE__".to_string(),
        value(TokenKind::String, datetime.format("%Y-%m-%d").to_string()),
    );
    macros.insert(
        "__DATETIME__".to_string(),
        value(
            TokenKind::String,
            datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
    );
    macros.insert(
        "__TIME__".to_string(),
        value(TokenKind::String, datetime.format("%H:%M:%S").to_string()),
    );

    let os = if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    };
    macros.insert("__OS__".to_string(), value(TokenKind::String, os));
    macros.insert(
        match os {
            "windows" => "__WIN__",
            "macos" => "__MACOS__",
            _ => "__LINUX__",
        }
        .to_string(),
        declaration(),
    );

    let bits_macro = if cfg!(target_pointer_width = "64") {
        "__64BIT__"
    } else {
        "__32BIT__"
    };
    macros.insert(bits_macro.to_string(), declaration());
}
