use std::fmt;

/// Passes all the token kinds as a sequence of `Kind = "pretty name",` into
/// the provided macro. Mirrors the lexer's own longest-first scanning order
/// where that's illustrative; otherwise tokens are grouped the way §3 of the
/// front end's data model groups them.
#[macro_export]
macro_rules! expand_token_kinds {
    ($x:path) => {
        $x! {
            // Literals
            Integer   = "integer literal",
            Real      = "real literal",
            String    = "string literal",
            Character = "character literal",

            // Names
            Identifier = "identifier",
            Keyword    = "keyword",
            Macro      = "macro identifier",

            // Arithmetic
            Plus    = "`+`",
            Minus   = "`-`",
            Star    = "`*`",
            Slash   = "`/`",
            Percent = "`%`",
            StarStar = "`**`",

            // Compound assignment
            PlusEquals       = "`+=`",
            MinusEquals      = "`-=`",
            StarEquals       = "`*=`",
            SlashEquals      = "`/=`",
            PercentEquals    = "`%=`",
            StarStarEquals   = "`**=`",
            ShiftLeftEquals  = "`<<=`",
            ShiftRightEquals = "`>>=`",
            BitAndEquals     = "`&=`",
            BitXorEquals     = "`^=`",
            BitOrEquals      = "`|=`",

            // Relational / equality
            Less         = "`<`",
            LessEqual    = "`<=`",
            Greater      = "`>`",
            GreaterEqual = "`>=`",
            EqualEqual   = "`==`",
            NotEqual     = "`!=`",

            // Logical
            AndAnd = "`&&`",
            OrOr   = "`||`",
            Bang   = "`!`",

            // Bitwise / shift
            BitAnd     = "`&`",
            BitOr      = "`|`",
            BitXor     = "`^`",
            BitNot     = "`~`",
            ShiftLeft  = "`<<`",
            ShiftRight = "`>>`",

            // Increment/decrement (promoted to Right* variants when postfix)
            PlusPlus        = "`++`",
            RightPlusPlus   = "`++` (postfix)",
            MinusMinus      = "`--`",
            RightMinusMinus = "`--` (postfix)",

            // Assignment / ternary / member access
            Equals   = "`=`",
            Question = "`?`",
            Colon    = "`:`",
            Dot      = "`.`",
            DotDotDot = "`...`",

            // Structural
            LParen   = "`(`",
            RParen   = "`)`",
            LBracket = "`[`",
            RBracket = "`]`",
            LBrace   = "`{`",
            RBrace   = "`}`",
            Comma    = "`,`",
            Semicolon = "`;`",

            // Macro-specific
            HashHash      = "`##`",
            HashEquals    = "`#==`",
            HashNotEquals = "`#!=`",

            // Control
            Newline = "newline",
            Skip    = "skip",
            Eoi     = "end of included file",
            Eof     = "end of file",
        }
    };
}

macro_rules! token_kind_enum {
    ($($name:tt = $pretty_name:tt),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum TokenKind {
            $($name),*
        }

        impl TokenKind {
            pub fn name(&self) -> &'static str {
                match self {
                    $(TokenKind::$name => $pretty_name),*
                }
            }
        }
    }
}

expand_token_kinds!(token_kind_enum);

impl TokenKind {
    /// Whether this token kind is dropped by [`Preprocessor::process`]'s
    /// final cleanup pass (§4.3.9).
    pub fn is_control(&self) -> bool {
        matches!(self, TokenKind::Skip | TokenKind::Newline | TokenKind::Eoi)
    }

    /// Whether this is a prefix `++`/`--` kind, before the parser has had a
    /// chance to promote it to its postfix counterpart.
    pub fn is_increment_or_decrement(&self) -> bool {
        matches!(self, TokenKind::PlusPlus | TokenKind::MinusMinus)
    }

    /// Promotes a prefix increment/decrement kind to its postfix
    /// (`right_*`) counterpart, as used by the parser (§4.4).
    pub fn to_postfix(self) -> TokenKind {
        match self {
            TokenKind::PlusPlus => TokenKind::RightPlusPlus,
            TokenKind::MinusMinus => TokenKind::RightMinusMinus,
            other => other,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single token: a kind plus the exact lexeme it was scanned from (or, for
/// macro-synthesised tokens, the lexeme it was given by expansion).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind.name(), self.lexeme)
    }
}

/// The reserved words that promote an `identifier`/`macro` token kind during
/// lexing (§6).
pub const KEYWORDS: &[&str] = &[
    "mut", "con", "let", "int", "real", "char", "string", "bool", "def", "defl", "undef",
    "import", "include", "if", "elif", "else", "endif", "error", "log", "logl", "assert",
];

pub fn is_keyword(identifier: &str) -> bool {
    KEYWORDS.contains(&identifier)
}
