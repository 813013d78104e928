//! Shunting-yard evaluation of `#if`/`#elif` boolean expressions (§4.3.6).

use std::collections::{HashMap, VecDeque};

use wisp_foundation::errors::PreprocessorError;
use wisp_foundation::Diagnostics;
use wisp_lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Not,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl Op {
    fn from_kind(kind: TokenKind) -> Option<Op> {
        match kind {
            TokenKind::Bang => Some(Op::Not),
            TokenKind::Less => Some(Op::Less),
            TokenKind::LessEqual => Some(Op::LessEqual),
            TokenKind::Greater => Some(Op::Greater),
            TokenKind::GreaterEqual => Some(Op::GreaterEqual),
            TokenKind::EqualEqual => Some(Op::Equal),
            TokenKind::NotEqual => Some(Op::NotEqual),
            TokenKind::AndAnd => Some(Op::And),
            TokenKind::OrOr => Some(Op::Or),
            _ => None,
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Op::Not => 5,
            Op::Less | Op::LessEqual | Op::Greater | Op::GreaterEqual => 4,
            Op::Equal | Op::NotEqual => 3,
            Op::And => 2,
            Op::Or => 1,
        }
    }

    fn is_unary(self) -> bool {
        matches!(self, Op::Not)
    }
}

#[derive(Debug, Clone)]
enum RpnItem {
    Operand(Token),
    Operator(Op),
}

enum StackItem {
    Op(Op),
    LParen,
}

/// Converts an infix boolean-expression token slice into Reverse Polish
/// Notation. Returns `None` (after recording a diagnostic) on mismatched
/// parentheses.
fn shunt(tokens: &[Token], diagnostics: &mut Diagnostics) -> Option<VecDeque<RpnItem>> {
    let mut output = VecDeque::new();
    let mut stack: Vec<StackItem> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::LParen => stack.push(StackItem::LParen),
            TokenKind::RParen => {
                let mut found = false;
                while let Some(top) = stack.pop() {
                    match top {
                        StackItem::LParen => {
                            found = true;
                            break;
                        }
                        StackItem::Op(op) => output.push_back(RpnItem::Operator(op)),
                    }
                }
                if !found {
                    diagnostics.insert(PreprocessorError::McondMismatchedParentheses.to_string());
                    return None;
                }
            }
            kind => {
                if let Some(op) = Op::from_kind(kind) {
                    while let Some(StackItem::Op(top)) = stack.last() {
                        let pops = if op.is_unary() {
                            top.precedence() > op.precedence()
                        } else {
                            top.precedence() >= op.precedence()
                        };
                        if !pops {
                            break;
                        }
                        if let Some(StackItem::Op(top)) = stack.pop() {
                            output.push_back(RpnItem::Operator(top));
                        }
                    }
                    stack.push(StackItem::Op(op));
                } else {
                    output.push_back(RpnItem::Operand(token.clone()));
                }
            }
        }
    }

    while let Some(top) = stack.pop() {
        match top {
            StackItem::LParen => {
                diagnostics.insert(PreprocessorError::McondMismatchedParentheses.to_string());
                return None;
            }
            StackItem::Op(op) => output.push_back(RpnItem::Operator(op)),
        }
    }

    Some(output)
}

fn parse_number(lexeme: &str) -> Option<f64> {
    lexeme.trim().parse::<f64>().ok()
}

/// Resolves the numeric value of a single RPN operand, possibly splicing a
/// referenced macro's body tokens onto the front of `queue` for further
/// evaluation (the body is treated as already being in RPN order, matching
/// the original's observable behaviour rather than re-shunting it).
fn resolve_operand(
    token: &Token,
    queue: &mut VecDeque<RpnItem>,
    macros: &HashMap<String, Vec<Token>>,
    diagnostics: &mut Diagnostics,
) -> Option<f64> {
    match token.kind {
        TokenKind::Integer | TokenKind::Real => match parse_number(&token.lexeme) {
            Some(n) => Some(n),
            None => {
                diagnostics.insert(PreprocessorError::CouldNotConvertNumber.to_string());
                None
            }
        },
        TokenKind::Identifier => match macros.get(&token.lexeme) {
            None => Some(0.0),
            Some(body) if body.len() == 1 && body[0].kind == TokenKind::Skip => Some(1.0),
            Some(body) => {
                for defined in body.iter().rev() {
                    let item = match Op::from_kind(defined.kind) {
                        Some(op) => RpnItem::Operator(op),
                        None => RpnItem::Operand(defined.clone()),
                    };
                    queue.push_front(item);
                }
                None
            }
        },
        _ => {
            diagnostics.insert(PreprocessorError::UnexpectedTokenMcond.to_string());
            None
        }
    }
}

/// Evaluates a `#if`/`#elif` boolean expression given the tokens between the
/// directive and its terminating newline.
pub fn evaluate(
    tokens: &[Token],
    macros: &HashMap<String, Vec<Token>>,
    diagnostics: &mut Diagnostics,
) -> bool {
    let Some(mut queue) = shunt(tokens, diagnostics) else {
        return false;
    };

    let mut stack: Vec<f64> = Vec::new();

    while let Some(item) = queue.pop_front() {
        if !diagnostics.empty() {
            return false;
        }
        match item {
            RpnItem::Operand(token) => {
                if let Some(value) = resolve_operand(&token, &mut queue, macros, diagnostics) {
                    stack.push(value);
                }
            }
            RpnItem::Operator(op) => {
                if op.is_unary() {
                    match stack.pop() {
                        Some(a) => stack.push(if a == 0.0 { 1.0 } else { 0.0 }),
                        None => {
                            diagnostics.insert(PreprocessorError::InvalidBoolExpr.to_string());
                            return false;
                        }
                    }
                    continue;
                }

                let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                    diagnostics.insert(PreprocessorError::InvalidBoolExpr.to_string());
                    return false;
                };
                let result = match op {
                    Op::Less => a < b,
                    Op::LessEqual => a <= b,
                    Op::Greater => a > b,
                    Op::GreaterEqual => a >= b,
                    Op::Equal => a == b,
                    Op::NotEqual => a != b,
                    Op::And => a != 0.0 && b != 0.0,
                    Op::Or => a != 0.0 || b != 0.0,
                    Op::Not => unreachable!("unary operator handled above"),
                };
                stack.push(if result { 1.0 } else { 0.0 });
            }
        }
    }

    if !diagnostics.empty() {
        return false;
    }

    stack.pop().map(|v| v != 0.0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_foundation::Diagnostics;

    fn tokenize(source: &str) -> Vec<Token> {
        let mut diagnostics = Diagnostics::new();
        let tokens = wisp_lexer::lex(source, &mut diagnostics);
        assert!(diagnostics.empty());
        // Drop the trailing `eof`; `evaluate` only sees the expression body.
        tokens[..tokens.len() - 1].to_vec()
    }

    fn eval(source: &str, macros: &HashMap<String, Vec<Token>>) -> bool {
        let tokens = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let result = evaluate(&tokens, macros, &mut diagnostics);
        assert!(diagnostics.empty(), "unexpected diagnostics for {source:?}");
        result
    }

    #[test]
    fn relational_precedence_over_equality() {
        // `1 < 2 == 1` parses as `(1 < 2) == 1`, i.e. true.
        assert!(eval("1 < 2 == 1", &HashMap::new()));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // `1 || 0 && 0` parses as `1 || (0 && 0)`, i.e. true.
        assert!(eval("1 || 0 && 0", &HashMap::new()));
    }

    #[test]
    fn not_is_highest_precedence() {
        assert!(eval("!0 && 1", &HashMap::new()));
        assert!(!eval("!1", &HashMap::new()));
    }

    #[test]
    fn parentheses_group_subexpressions() {
        assert!(eval("(1 || 0) && 1", &HashMap::new()));
    }

    #[test]
    fn undefined_identifier_is_falsy() {
        assert!(!eval("UNDEFINED", &HashMap::new()));
    }

    #[test]
    fn numeric_macro_expands_in_place() {
        let mut macros = HashMap::new();
        macros.insert(
            "TWO".to_string(),
            vec![Token::new(TokenKind::Integer, "2")],
        );
        assert!(eval("TWO == 2", &macros));
    }

    #[test]
    fn mismatched_parentheses_is_reported() {
        let tokens = tokenize("(1 || 0");
        let mut diagnostics = Diagnostics::new();
        let macros = HashMap::new();
        evaluate(&tokens, &macros, &mut diagnostics);
        assert!(!diagnostics.empty());
    }
}
