//! Compiler of textual functions into evaluable objectives.
//!
//! The function text goes through a short pipeline:
//!
//! 1. [`tokenize`] splits the text into [`Token`]s,
//! 2. [`extract_variables`] fixes the order of variables,
//! 3. [`to_postfix`] reorders tokens for stack evaluation,
//! 4. [`evaluate`] computes the value for an assignment.
//!
//! [`CompiledExpression`] bundles the result of the first three steps and
//! implements [`Function`](crate::Function), so it can be minimized directly.
//!
//! ## Format
//!
//! ASCII arithmetic with variables `x1`, `x2`, ..., operators `+ - * / ^`,
//! parentheses and decimal literals. Whitespace is insignificant and the text
//! is case-insensitive. All operators are binary and left-associative (see
//! [`EXPONENT_ASSOCIATIVITY`]).

mod compiled;
mod eval;
mod postfix;
mod token;
mod variables;

pub use compiled::*;
pub use eval::*;
pub use postfix::to_postfix;
pub use token::*;
pub use variables::*;

use thiserror::Error;

/// Error encountered while compiling function text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A part of the text is neither a number, a variable, an operator nor a
    /// parenthesis.
    #[error("unrecognized token `{0}`")]
    UnrecognizedToken(String),
    /// A closing parenthesis without an opening one or vice versa.
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,
    /// There is nothing to evaluate.
    #[error("empty expression")]
    EmptyExpression,
    /// An operator does not have two operands.
    #[error("missing operand for `{0}`")]
    MissingOperand(Operator),
    /// Two operands are not joined by an operator.
    #[error("missing operator between operands")]
    MissingOperator,
}
