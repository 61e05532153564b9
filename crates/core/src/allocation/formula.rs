//! Restricted arithmetic expressions for formula allocations.
//!
//! Grammar: `+ - * /`, unary minus, parentheses, decimal literals, and
//! read-only variables. No I/O, no assignment, no functions. Errors
//! carry the byte position in the source text.

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;

/// Formula parse or evaluation failure, with byte position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Character outside the expression language.
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar {
        /// Byte offset in the formula.
        pos: usize,
        /// The offending character.
        ch: char,
    },

    /// Token valid in the language but not here.
    #[error("Unexpected token at position {pos}")]
    UnexpectedToken {
        /// Byte offset in the formula.
        pos: usize,
    },

    /// Formula ended mid-expression.
    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    /// Numeric literal out of range or malformed.
    #[error("Invalid number at position {pos}")]
    InvalidNumber {
        /// Byte offset in the formula.
        pos: usize,
    },

    /// Variable not supplied by the caller.
    #[error("Unknown variable '{name}' at position {pos}")]
    UnknownVariable {
        /// Byte offset in the formula.
        pos: usize,
        /// The variable name.
        name: String,
    },

    /// Right-hand side of a division evaluated to zero.
    #[error("Division by zero at position {pos}")]
    DivisionByZero {
        /// Byte offset of the division operator.
        pos: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        match ch {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push((i, Token::Plus));
                i += 1;
            }
            '-' => {
                tokens.push((i, Token::Minus));
                i += 1;
            }
            '*' => {
                tokens.push((i, Token::Star));
                i += 1;
            }
            '/' => {
                tokens.push((i, Token::Slash));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let literal = &source[start..i];
                let value = literal
                    .parse::<Decimal>()
                    .map_err(|_| FormulaError::InvalidNumber { pos: start })?;
                tokens.push((start, Token::Number(value)));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i] as char, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
                {
                    i += 1;
                }
                tokens.push((start, Token::Ident(source[start..i].to_string())));
            }
            other => return Err(FormulaError::UnexpectedChar { pos: i, ch: other }),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(usize, Token)],
    cursor: usize,
    vars: &'a HashMap<String, Decimal>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.cursor)
    }

    fn bump(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        token
    }

    fn expr(&mut self) -> Result<Decimal, FormulaError> {
        let mut value = self.term()?;
        while let Some((_, token)) = self.peek() {
            match token {
                Token::Plus => {
                    self.cursor += 1;
                    value += self.term()?;
                }
                Token::Minus => {
                    self.cursor += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<Decimal, FormulaError> {
        let mut value = self.factor()?;
        while let Some(&(pos, ref token)) = self.peek() {
            match token {
                Token::Star => {
                    self.cursor += 1;
                    value *= self.factor()?;
                }
                Token::Slash => {
                    self.cursor += 1;
                    let divisor = self.factor()?;
                    if divisor.is_zero() {
                        return Err(FormulaError::DivisionByZero { pos });
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<Decimal, FormulaError> {
        let Some((pos, token)) = self.bump() else {
            return Err(FormulaError::UnexpectedEnd);
        };
        match token {
            Token::Number(value) => Ok(value),
            Token::Ident(name) => self
                .vars
                .get(&name)
                .copied()
                .ok_or(FormulaError::UnknownVariable { pos, name }),
            Token::Minus => Ok(-self.factor()?),
            Token::LParen => {
                let value = self.expr()?;
                match self.bump() {
                    Some((_, Token::RParen)) => Ok(value),
                    Some((close_pos, _)) => Err(FormulaError::UnexpectedToken { pos: close_pos }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            _ => Err(FormulaError::UnexpectedToken { pos }),
        }
    }
}

/// Evaluates a formula against the supplied variables.
pub fn evaluate_formula(
    source: &str,
    vars: &HashMap<String, Decimal>,
) -> Result<Decimal, FormulaError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
        vars,
    };
    let value = parser.expr()?;
    if let Some(&(pos, _)) = parser.peek() {
        return Err(FormulaError::UnexpectedToken { pos });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn vars() -> HashMap<String, Decimal> {
        let mut map = HashMap::new();
        map.insert("source".to_string(), dec!(100));
        map.insert("headcount".to_string(), dec!(40));
        map
    }

    #[rstest]
    #[case("1 + 2 * 3", dec!(7))]
    #[case("(1 + 2) * 3", dec!(9))]
    #[case("-4 + 10", dec!(6))]
    #[case("source * 0.25", dec!(25.00))]
    #[case("source * headcount / 100", dec!(40))]
    #[case("10 - 2 - 3", dec!(5))]
    fn evaluates_arithmetic(#[case] formula: &str, #[case] expected: Decimal) {
        assert_eq!(evaluate_formula(formula, &vars()).unwrap(), expected);
    }

    #[test]
    fn unknown_variable_carries_position_and_name() {
        let err = evaluate_formula("source * rate", &vars()).unwrap_err();
        assert_eq!(
            err,
            FormulaError::UnknownVariable {
                pos: 9,
                name: "rate".to_string(),
            }
        );
    }

    #[test]
    fn division_by_zero_carries_operator_position() {
        let err = evaluate_formula("10 / (2 - 2)", &vars()).unwrap_err();
        assert_eq!(err, FormulaError::DivisionByZero { pos: 3 });
    }

    #[test]
    fn stray_character_rejected() {
        let err = evaluate_formula("1 + $2", &vars()).unwrap_err();
        assert_eq!(err, FormulaError::UnexpectedChar { pos: 4, ch: '$' });
    }

    #[test]
    fn dangling_operator_rejected() {
        assert_eq!(
            evaluate_formula("1 +", &vars()).unwrap_err(),
            FormulaError::UnexpectedEnd
        );
    }

    #[test]
    fn trailing_garbage_rejected() {
        assert_eq!(
            evaluate_formula("1 2", &vars()).unwrap_err(),
            FormulaError::UnexpectedToken { pos: 2 }
        );
    }

    #[test]
    fn unclosed_paren_rejected() {
        assert_eq!(
            evaluate_formula("(1 + 2", &vars()).unwrap_err(),
            FormulaError::UnexpectedEnd
        );
    }

    #[test]
    fn malformed_number_rejected() {
        assert_eq!(
            evaluate_formula("1.2.3", &vars()).unwrap_err(),
            FormulaError::InvalidNumber { pos: 0 }
        );
    }
}
