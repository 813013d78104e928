//! Recursive descent with precedence climbing over the preprocessed token
//! vector (§4.4). The grammar is a standard ladder from loosest to tightest:
//! statement → variable-declaration → compound-assign chain → ternary →
//! logical-or → logical-and → bitwise-or → bitwise-xor → bitwise-and →
//! equality → relational → shift → additive → multiplicative →
//! exponentiation (right-associative) → unary → primary.

use wisp_foundation::errors::ParseError;
use wisp_foundation::Diagnostics;
use wisp_lexer::{Token, TokenKind};

use crate::ast::{AssignOp, BinaryOp, DeclFlags, Expr, Program, Stmt, TypeExpr, UnaryOp};

const VAR_DECL_TYPE_KEYWORDS: &[&str] = &["int", "real", "char", "string", "bool", "let"];

/// Parses a preprocessed token vector into a [`Program`].
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics,
        }
    }

    pub fn parse_program(mut self) -> Program {
        let mut statements = Vec::new();
        while !self.at_eof() {
            if !self.diagnostics.empty() {
                break;
            }
            statements.push(self.parse_statement());
        }
        Program::new(statements)
    }

    // ---- token cursor helpers ----------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&mut self, error: ParseError) {
        self.diagnostics.insert(error.to_string());
    }

    // ---- statements ---------------------------------------------------------

    fn parse_statement(&mut self) -> Stmt {
        if self.is_var_decl_start() {
            self.parse_var_decl()
        } else {
            let expr = self.parse_compound_bitwise_assign();
            self.matches(TokenKind::Semicolon);
            Stmt::Expr(expr)
        }
    }

    fn is_var_decl_start(&self) -> bool {
        let token = self.current();
        token.kind == TokenKind::Keyword
            && (token.lexeme == "mut"
                || token.lexeme == "con"
                || VAR_DECL_TYPE_KEYWORDS.contains(&token.lexeme.as_str()))
    }

    fn parse_var_decl(&mut self) -> Stmt {
        let mut flags = DeclFlags::empty();
        if self.current().lexeme == "mut" {
            flags |= DeclFlags::MUT;
            self.advance();
        } else if self.current().lexeme == "con" {
            flags |= DeclFlags::CON;
            self.advance();
        }

        if self.current().kind != TokenKind::Keyword
            || !VAR_DECL_TYPE_KEYWORDS.contains(&self.current().lexeme.as_str())
        {
            self.error(ParseError::ExpectedType);
            return Stmt::Expr(Expr::NullLit);
        }
        let type_token = self.advance();
        let is_auto = type_token.lexeme == "let";
        if is_auto {
            flags |= DeclFlags::AUTO;
        }
        let type_name = if is_auto { None } else { Some(type_token.lexeme) };
        let ty = TypeExpr { flags, type_name };

        if self.current().kind != TokenKind::Identifier {
            self.error(ParseError::ExpectedIdentifierVarDecl);
            return Stmt::VarDecl {
                ty,
                name: String::new(),
                body: None,
            };
        }
        let name = self.advance().lexeme;

        if self.matches(TokenKind::Semicolon) {
            if ty.is_auto() {
                self.error(ParseError::AutoMustHaveBody);
            } else if ty.is_con() {
                self.error(ParseError::ExpectedVarBody);
            }
            return Stmt::VarDecl {
                ty,
                name,
                body: None,
            };
        }

        if !self.matches(TokenKind::Equals) {
            self.error(ParseError::ExpectedEqualsOrSemicolon);
            return Stmt::VarDecl {
                ty,
                name,
                body: None,
            };
        }

        let body = self.parse_compound_bitwise_assign();
        self.matches(TokenKind::Semicolon);
        Stmt::VarDecl {
            ty,
            name,
            body: Some(Box::new(body)),
        }
    }

    // ---- compound-assign chain (§4.4) ---------------------------------------

    fn parse_compound_bitwise_assign(&mut self) -> Expr {
        let lhs = self.parse_compound_shift_assign();
        let op = match self.current().kind {
            TokenKind::BitAndEquals => AssignOp::BitAndAssign,
            TokenKind::BitXorEquals => AssignOp::BitXorAssign,
            TokenKind::BitOrEquals => AssignOp::BitOrAssign,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_compound_bitwise_assign();
        Expr::Assignment {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_compound_shift_assign(&mut self) -> Expr {
        let lhs = self.parse_compound_additive_assign();
        let op = match self.current().kind {
            TokenKind::ShiftLeftEquals => AssignOp::ShlAssign,
            TokenKind::ShiftRightEquals => AssignOp::ShrAssign,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_compound_shift_assign();
        Expr::Assignment {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_compound_additive_assign(&mut self) -> Expr {
        let lhs = self.parse_compound_multiplicative_assign();
        let op = match self.current().kind {
            TokenKind::PlusEquals => AssignOp::AddAssign,
            TokenKind::MinusEquals => AssignOp::SubAssign,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_compound_additive_assign();
        Expr::Assignment {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_compound_multiplicative_assign(&mut self) -> Expr {
        let lhs = self.parse_compound_exponentiation_assign();
        let op = match self.current().kind {
            TokenKind::StarEquals => AssignOp::MulAssign,
            TokenKind::SlashEquals => AssignOp::DivAssign,
            TokenKind::PercentEquals => AssignOp::RemAssign,
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_compound_multiplicative_assign();
        Expr::Assignment {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_compound_exponentiation_assign(&mut self) -> Expr {
        let lhs = self.parse_simple_assign();
        if self.current().kind != TokenKind::StarStarEquals {
            return lhs;
        }
        self.advance();
        let rhs = self.parse_compound_exponentiation_assign();
        Expr::Assignment {
            op: AssignOp::PowAssign,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_simple_assign(&mut self) -> Expr {
        let lhs = self.parse_ternary();
        if self.current().kind != TokenKind::Equals {
            return lhs;
        }
        self.advance();
        let rhs = self.parse_simple_assign();
        Expr::Assignment {
            op: AssignOp::Assign,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    // ---- ternary / binary ladder --------------------------------------------

    fn parse_ternary(&mut self) -> Expr {
        let cond = self.parse_logical_or();
        if !self.matches(TokenKind::Question) {
            return cond;
        }
        let then_branch = self.parse_ternary();
        if !self.matches(TokenKind::Colon) {
            self.error(ParseError::ExpectedColonTernary);
        }
        let else_branch = self.parse_ternary();
        Expr::Ternary {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    fn parse_logical_or(&mut self) -> Expr {
        self.parse_left_assoc_binary(Self::parse_logical_and, &[(TokenKind::OrOr, BinaryOp::Or)])
    }

    fn parse_logical_and(&mut self) -> Expr {
        self.parse_left_assoc_binary(Self::parse_bitwise_or, &[(TokenKind::AndAnd, BinaryOp::And)])
    }

    fn parse_bitwise_or(&mut self) -> Expr {
        self.parse_left_assoc_binary(Self::parse_bitwise_xor, &[(TokenKind::BitOr, BinaryOp::BitOr)])
    }

    fn parse_bitwise_xor(&mut self) -> Expr {
        self.parse_left_assoc_binary(Self::parse_bitwise_and, &[(TokenKind::BitXor, BinaryOp::BitXor)])
    }

    fn parse_bitwise_and(&mut self) -> Expr {
        self.parse_left_assoc_binary(Self::parse_equality, &[(TokenKind::BitAnd, BinaryOp::BitAnd)])
    }

    fn parse_equality(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_relational,
            &[
                (TokenKind::EqualEqual, BinaryOp::Equal),
                (TokenKind::NotEqual, BinaryOp::NotEqual),
            ],
        )
    }

    fn parse_relational(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_shift,
            &[
                (TokenKind::Less, BinaryOp::Less),
                (TokenKind::LessEqual, BinaryOp::LessEqual),
                (TokenKind::Greater, BinaryOp::Greater),
                (TokenKind::GreaterEqual, BinaryOp::GreaterEqual),
            ],
        )
    }

    fn parse_shift(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_additive,
            &[
                (TokenKind::ShiftLeft, BinaryOp::Shl),
                (TokenKind::ShiftRight, BinaryOp::Shr),
            ],
        )
    }

    fn parse_additive(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_multiplicative,
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
        )
    }

    fn parse_multiplicative(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_exponentiation,
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
        )
    }

    /// Unlike every other binary rung, `**` is right-associative (§8's
    /// invariant: `a ** b ** c` ≡ `a ** (b ** c)`).
    fn parse_exponentiation(&mut self) -> Expr {
        let lhs = self.parse_unary();
        if self.current().kind != TokenKind::StarStar {
            return lhs;
        }
        self.advance();
        let rhs = self.parse_exponentiation();
        Expr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Shared left-associative binary rung: parses one `next` term, then
    /// folds in `(operator next)*` pairs.
    fn parse_left_assoc_binary(
        &mut self,
        next: fn(&mut Self) -> Expr,
        operators: &[(TokenKind, BinaryOp)],
    ) -> Expr {
        let mut lhs = next(self);
        loop {
            let Some(&(_, op)) = operators.iter().find(|(kind, _)| self.current().kind == *kind)
            else {
                break;
            };
            self.advance();
            let rhs = next(self);
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    // ---- unary / primary ------------------------------------------------------

    fn parse_unary(&mut self) -> Expr {
        let op = match self.current().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::BitNot => Some(UnaryOp::BitNot),
            TokenKind::BitAnd => Some(UnaryOp::Ref),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::PlusPlus => Some(UnaryOp::PreIncrement),
            TokenKind::MinusMinus => Some(UnaryOp::PreDecrement),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.advance();
        let operand = self.parse_unary();
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            let op = match self.current().kind {
                TokenKind::PlusPlus => UnaryOp::PostIncrement,
                TokenKind::MinusMinus => UnaryOp::PostDecrement,
                _ => break,
            };
            self.advance();
            expr = Expr::Unary {
                op,
                operand: Box::new(expr),
            };
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Integer => {
                self.advance();
                match token.lexeme.parse::<i64>() {
                    Ok(value) => Expr::IntLit(value),
                    Err(_) => {
                        self.error(ParseError::CouldNotConvertNumber);
                        Expr::IntLit(0)
                    }
                }
            }
            TokenKind::Real => {
                self.advance();
                match token.lexeme.parse::<f64>() {
                    Ok(value) => Expr::RealLit(value),
                    Err(_) => {
                        self.error(ParseError::CouldNotConvertNumber);
                        Expr::RealLit(0.0)
                    }
                }
            }
            TokenKind::String => {
                self.advance();
                Expr::StringLit(token.lexeme)
            }
            TokenKind::Character => {
                self.advance();
                Expr::CharLit(token.lexeme.chars().next().unwrap_or('\0'))
            }
            TokenKind::Identifier => {
                self.advance();
                Expr::Identifier(token.lexeme)
            }
            TokenKind::LParen => {
                self.advance();
                // A parenthesised primary wraps a full statement, not just an
                // expression (§4.4: "a parenthesised statement"), so that
                // `(let x = 1)` round-trips the same as any other statement.
                // An expression statement unwraps back to its bare `Expr`;
                // only a `VarDecl` needs the `Expr::Stmt` wrapper.
                let inner = match self.parse_statement() {
                    Stmt::Expr(expr) => expr,
                    stmt @ Stmt::VarDecl { .. } => Expr::Stmt(Box::new(stmt)),
                };
                if !self.matches(TokenKind::RParen) {
                    self.error(ParseError::MismatchedParentheses);
                }
                inner
            }
            _ => {
                self.error(ParseError::ExpectedPrimaryExpression);
                tracing::debug!(token = %token, "synthesising null literal for recovery");
                // Don't consume `eof`/terminators, but do step past a single
                // unrecognised token so recovery can make forward progress.
                if !self.at_eof() {
                    self.advance();
                }
                Expr::NullLit
            }
        }
    }
}

/// Convenience entry point mirroring [`wisp_lexer::lex`]/`wisp_preprocessor::preprocess`.
pub fn parse(tokens: &[Token], diagnostics: &mut Diagnostics) -> Program {
    Parser::new(tokens, diagnostics).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_lexer::lex;

    /// Lexes `source` and strips the control tokens (`skip`/`newline`/`eoi`)
    /// the real preprocessor would have removed by the time the parser ever
    /// sees a token stream (§4.3.9), without pulling in the preprocessor
    /// crate just to exercise that one cleanup step.
    fn parse_source(source: &str) -> (Program, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut tokens = lex(source, &mut diagnostics);
        assert!(diagnostics.empty(), "lexer diagnostics: {diagnostics:?}");
        tokens.retain(|t| !t.kind.is_control());
        let program = parse(&tokens, &mut diagnostics);
        (program, diagnostics)
    }

    #[test]
    fn integer_literal_statement() {
        let (program, diagnostics) = parse_source("42;");
        assert!(diagnostics.empty());
        assert_eq!(program.statements, vec![Stmt::Expr(Expr::IntLit(42))]);
    }

    #[test]
    fn let_declaration_with_body() {
        let (program, diagnostics) = parse_source("let x = 42;");
        assert!(diagnostics.empty());
        assert_eq!(
            program.statements,
            vec![Stmt::VarDecl {
                ty: TypeExpr {
                    flags: DeclFlags::AUTO,
                    type_name: None
                },
                name: "x".to_string(),
                body: Some(Box::new(Expr::IntLit(42))),
            }]
        );
    }

    #[test]
    fn mut_declaration_without_body_is_allowed() {
        let (program, diagnostics) = parse_source("mut int x;");
        assert!(diagnostics.empty());
        assert_eq!(
            program.statements,
            vec![Stmt::VarDecl {
                ty: TypeExpr {
                    flags: DeclFlags::MUT,
                    type_name: Some("int".to_string()),
                },
                name: "x".to_string(),
                body: None,
            }]
        );
    }

    #[test]
    fn con_declaration_without_body_is_an_error() {
        let (_, diagnostics) = parse_source("con int x;");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn auto_declaration_without_body_is_an_error() {
        let (_, diagnostics) = parse_source("let x;");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn exponentiation_is_right_associative() {
        let (program, diagnostics) = parse_source("a ** b ** c;");
        assert!(diagnostics.empty());
        let expected = Expr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(Expr::Identifier("a".to_string())),
            rhs: Box::new(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(Expr::Identifier("b".to_string())),
                rhs: Box::new(Expr::Identifier("c".to_string())),
            }),
        };
        assert_eq!(program.statements, vec![Stmt::Expr(expected)]);
    }

    #[test]
    fn additive_is_left_associative() {
        let (program, diagnostics) = parse_source("a - b - c;");
        assert!(diagnostics.empty());
        let expected = Expr::Binary {
            op: BinaryOp::Sub,
            lhs: Box::new(Expr::Binary {
                op: BinaryOp::Sub,
                lhs: Box::new(Expr::Identifier("a".to_string())),
                rhs: Box::new(Expr::Identifier("b".to_string())),
            }),
            rhs: Box::new(Expr::Identifier("c".to_string())),
        };
        assert_eq!(program.statements, vec![Stmt::Expr(expected)]);
    }

    #[test]
    fn ternary_nests_to_the_right() {
        let (program, diagnostics) = parse_source("a ? b : c ? d : e;");
        assert!(diagnostics.empty());
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Expr(Expr::Ternary { else_branch, .. }) => {
                assert!(matches!(**else_branch, Expr::Ternary { .. }));
            }
            other => panic!("expected ternary, got {other:?}"),
        }
    }

    #[test]
    fn postfix_increment_is_promoted() {
        let (program, diagnostics) = parse_source("x++;");
        assert!(diagnostics.empty());
        assert_eq!(
            program.statements,
            vec![Stmt::Expr(Expr::Unary {
                op: UnaryOp::PostIncrement,
                operand: Box::new(Expr::Identifier("x".to_string())),
            })]
        );
    }

    #[test]
    fn prefix_increment_is_not_promoted() {
        let (program, diagnostics) = parse_source("++x;");
        assert!(diagnostics.empty());
        assert_eq!(
            program.statements,
            vec![Stmt::Expr(Expr::Unary {
                op: UnaryOp::PreIncrement,
                operand: Box::new(Expr::Identifier("x".to_string())),
            })]
        );
    }

    #[test]
    fn parenthesised_expression_overrides_precedence() {
        let (program, diagnostics) = parse_source("(a + b) * c;");
        assert!(diagnostics.empty());
        let expected = Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::Identifier("a".to_string())),
                rhs: Box::new(Expr::Identifier("b".to_string())),
            }),
            rhs: Box::new(Expr::Identifier("c".to_string())),
        };
        assert_eq!(program.statements, vec![Stmt::Expr(expected)]);
    }

    #[test]
    fn parenthesised_var_decl_round_trips_as_a_statement_expression() {
        let (program, diagnostics) = parse_source("(let x = 1);");
        assert!(diagnostics.empty());
        let inner = Stmt::VarDecl {
            ty: TypeExpr {
                flags: DeclFlags::AUTO,
                type_name: None,
            },
            name: "x".to_string(),
            body: Some(Box::new(Expr::IntLit(1))),
        };
        assert_eq!(
            program.statements,
            vec![Stmt::Expr(Expr::Stmt(Box::new(inner)))]
        );
    }

    #[test]
    fn mismatched_parentheses_is_an_error() {
        let (_, diagnostics) = parse_source("(a + b;");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn missing_primary_synthesises_a_null_literal() {
        let (program, diagnostics) = parse_source("+ ;");
        assert!(!diagnostics.empty());
        assert_eq!(
            program.statements,
            vec![Stmt::Expr(Expr::Unary {
                op: UnaryOp::Plus,
                operand: Box::new(Expr::NullLit),
            })]
        );
    }

    #[test]
    fn compound_assignment_chain() {
        let (program, diagnostics) = parse_source("x += 1;");
        assert!(diagnostics.empty());
        assert_eq!(
            program.statements,
            vec![Stmt::Expr(Expr::Assignment {
                op: AssignOp::AddAssign,
                lhs: Box::new(Expr::Identifier("x".to_string())),
                rhs: Box::new(Expr::IntLit(1)),
            })]
        );
    }

    #[test]
    fn multiple_statements() {
        let (program, diagnostics) = parse_source("let x = 1; let y = 2;");
        assert!(diagnostics.empty());
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn multiline_program_parses_one_statement_per_line() {
        use indoc::indoc;

        let (program, diagnostics) = parse_source(indoc! {"
            let total = 0;
            mut int count;
            count = total + 1;
        "});
        assert!(diagnostics.empty());
        assert_eq!(program.statements.len(), 3);
    }
}
