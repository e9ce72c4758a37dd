//! Lexical analysis of function text.

use std::fmt;

use logos::Logos;

use super::ParseError;

/// Associativity of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a op b op c` is `(a op b) op c`.
    Left,
    /// `a op b op c` is `a op (b op c)`.
    Right,
}

/// Associativity of the exponentiation operator.
///
/// Left, so `2^3^2` is `(2^3)^2 = 64`.
pub const EXPONENT_ASSOCIATIVITY: Associativity = Associativity::Left;

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
}

impl Operator {
    /// Recognizes an operator symbol.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '^' => Some(Operator::Pow),
            _ => None,
        }
    }

    /// Source symbol of the operator.
    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Pow => '^',
        }
    }

    /// Binding strength. Higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
            Operator::Pow => 3,
        }
    }

    /// Associativity of the operator.
    pub fn associativity(&self) -> Associativity {
        match self {
            Operator::Pow => EXPONENT_ASSOCIATIVITY,
            _ => Associativity::Left,
        }
    }

    /// Computes `a op b`. Follows IEEE-754, so division by zero gives infinity
    /// or NaN rather than an error.
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => a / b,
            Operator::Pow => a.powf(b),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A lexical unit of function text.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal in decimal notation.
    #[regex(r"[0-9]+(\.[0-9]*)?|\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
    /// Variable identifier, `x` followed by digits.
    #[regex(r"x[0-9]+", |lex| lex.slice().to_string())]
    Variable(String),
    /// Binary operator.
    #[token("+", |_| Operator::Add)]
    #[token("-", |_| Operator::Sub)]
    #[token("*", |_| Operator::Mul)]
    #[token("/", |_| Operator::Div)]
    #[token("^", |_| Operator::Pow)]
    Operator(Operator),
    /// `(`
    #[token("(")]
    LeftParen,
    /// `)`
    #[token(")")]
    RightParen,
}

impl Token {
    /// Returns true for numbers and variables.
    pub fn is_operand(&self) -> bool {
        matches!(self, Token::Number(_) | Token::Variable(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{}", value),
            Token::Variable(name) => write!(f, "{}", name),
            Token::Operator(op) => write!(f, "{}", op),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

/// Splits function text into tokens.
///
/// Whitespace is insignificant and identifiers are case-insensitive. Every
/// operator and parenthesis is a token of its own. The runs of characters in
/// between must form exactly one number or variable, otherwise the whole run
/// is reported as unrecognized.
///
/// ```rust
/// use optimex::expr::{tokenize, Operator, Token};
///
/// let tokens = tokenize("X1 * 2").unwrap();
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Variable("x1".to_string()),
///         Token::Operator(Operator::Mul),
///         Token::Number(2.0),
///     ]
/// );
/// ```
pub fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let text: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(&text);
    // Start of the operand directly preceding the current position.
    let mut operand_start = None;

    while let Some(token) = lexer.next() {
        let start = lexer.span().start;

        match token {
            Ok(token) if !token.is_operand() => {
                operand_start = None;
                tokens.push(token);
            }
            Ok(token) if operand_start.is_none() => {
                operand_start = Some(start);
                tokens.push(token);
            }
            _ => return Err(unrecognized(&text, operand_start.unwrap_or(start))),
        }
    }

    Ok(tokens)
}

fn unrecognized(text: &str, start: usize) -> ParseError {
    let rest = &text[start..];
    let end = rest
        .find(|c: char| matches!(c, '(' | ')') || Operator::from_symbol(c).is_some())
        .unwrap_or(rest.len());

    ParseError::UnrecognizedToken(rest[..end].to_string())
}
