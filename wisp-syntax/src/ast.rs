//! The AST node set (§3) and its pretty-printer.
//!
//! The original front end gives every node kind its own `print()` override
//! reached through virtual dispatch; here each node family is a tagged
//! union and printing is a single recursive [`fmt::Display`] impl per family
//! (§9's "Polymorphic AST nodes" design note).

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// The `mut`/`con`/`let` flags that prefix a variable declaration's type
    /// (§3's `TypeExpr`). At most one of `MUT`/`CON` is ever set by the
    /// parser; `AUTO` is set exactly when the type keyword was `let`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DeclFlags: u8 {
        const MUT  = 0x1;
        const CON  = 0x2;
        const AUTO = 0x4;
    }
}

/// The type annotation on a variable declaration: `mut int`, `con string`,
/// or the `let` placeholder that infers from the initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub flags: DeclFlags,
    /// `None` when the declaration used the `let` placeholder.
    pub type_name: Option<String>,
}

impl TypeExpr {
    pub fn is_mut(&self) -> bool {
        self.flags.contains(DeclFlags::MUT)
    }

    pub fn is_con(&self) -> bool {
        self.flags.contains(DeclFlags::CON)
    }

    pub fn is_auto(&self) -> bool {
        self.flags.contains(DeclFlags::AUTO)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mut() {
            write!(f, "mut ")?;
        }
        if self.is_con() {
            write!(f, "con ")?;
        }
        match &self.type_name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "let"),
        }
    }
}

/// Binary operators (§4.4's equality/relational/shift/additive/
/// multiplicative/exponentiation/bitwise/logical rungs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        };
        write!(f, "{s}")
    }
}

/// Assignment operators, one rung per §4.4's chain of compound-assign levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    PowAssign,
    ShlAssign,
    ShrAssign,
    BitAndAssign,
    BitXorAssign,
    BitOrAssign,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::RemAssign => "%=",
            AssignOp::PowAssign => "**=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::BitAndAssign => "&=",
            AssignOp::BitXorAssign => "^=",
            AssignOp::BitOrAssign => "|=",
        };
        write!(f, "{s}")
    }
}

/// Unary operators, covering both the prefix forms and the postfix
/// increment/decrement promoted by the parser (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Ref,
    Deref,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostIncrement | UnaryOp::PostDecrement)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Ref => "&",
            UnaryOp::Deref => "*",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        };
        write!(f, "{s}")
    }
}

/// An expression node (§3). Parenthesisation is not represented: the parser
/// uses `(` `)` purely to reorder precedence climbing and discards the
/// grouping once the inner expression has been built.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ternary {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Assignment {
        op: AssignOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Identifier(String),
    NullLit,
    IntLit(i64),
    RealLit(f64),
    StringLit(String),
    CharLit(char),
    /// A full statement (most notably a `VarDecl`) occupying a parenthesised
    /// primary position, e.g. `(let x = 1)`. Every other statement shape
    /// already has a dedicated `Expr` variant, so in practice only a
    /// `VarDecl` ever produces this; the parser unwraps `Stmt::Expr` back
    /// down to its inner expression instead of wrapping it here.
    Stmt(Box<Stmt>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ternary {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "({cond} ? {then_branch} : {else_branch})"),
            Expr::Assignment { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Expr::Unary { op, operand } if op.is_postfix() => write!(f, "({operand}{op})"),
            Expr::Unary { op, operand } => write!(f, "({op}{operand})"),
            Expr::Identifier(name) => write!(f, "{name}"),
            Expr::NullLit => write!(f, "null"),
            Expr::IntLit(value) => write!(f, "{value}"),
            Expr::RealLit(value) => write!(f, "{value}"),
            Expr::StringLit(value) => write!(f, "{value:?}"),
            Expr::CharLit(value) => write!(f, "{value:?}"),
            Expr::Stmt(stmt) => write!(f, "({stmt})"),
        }
    }
}

/// A top-level statement (§3). `VarDecl` is the only statement shape that
/// isn't also an expression; every other statement is an expression used
/// for effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl {
        ty: TypeExpr,
        name: String,
        body: Option<Box<Expr>>,
    },
    Expr(Expr),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::VarDecl { ty, name, body: Some(body) } => write!(f, "{ty} {name} = {body};"),
            Stmt::VarDecl { ty, name, body: None } => write!(f, "{ty} {name};"),
            Stmt::Expr(expr) => write!(f, "{expr};"),
        }
    }
}

/// An ordered sequence of top-level statements: the parser's final output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{stmt}")?;
        }
        Ok(())
    }
}
