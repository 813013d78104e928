//! The AST model and parser (§3/§4.4): turns the preprocessed token vector
//! into a [`Program`] of statements, the downstream consumer contract the
//! rest of the front end exists to feed.

pub mod ast;
pub mod parser;

pub use ast::{AssignOp, BinaryOp, DeclFlags, Expr, Program, Stmt, TypeExpr, UnaryOp};
pub use parser::{parse, Parser};
