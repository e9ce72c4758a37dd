use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use thiserror::Error;

use super::{token::Token, variables::VariableList};

/// Error encountered while evaluating a postfix sequence.
///
/// Compiled expressions are validated, so these indicate a defect or an
/// incomplete assignment rather than malformed user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The assignment has no value for the variable.
    #[error("unbound variable `{0}`")]
    UnboundVariable(String),
    /// The postfix sequence does not reduce to a single value.
    #[error("malformed expression: {depth} values on the stack")]
    MalformedExpression {
        /// Stack depth at the point of failure.
        depth: usize,
    },
}

/// Source of variable values for evaluation.
pub trait Bindings {
    /// Value bound to the variable, if any.
    fn value(&self, name: &str) -> Option<f64>;
}

impl<B: Bindings + ?Sized> Bindings for &B {
    fn value(&self, name: &str) -> Option<f64> {
        (**self).value(name)
    }
}

impl<S: BuildHasher> Bindings for HashMap<String, f64, S> {
    fn value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Bindings for BTreeMap<String, f64> {
    fn value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<N: AsRef<str>> Bindings for [(N, f64)] {
    fn value(&self, name: &str) -> Option<f64> {
        self.iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, value)| *value)
    }
}

/// Binds values to variables by their position in a [`VariableList`].
///
/// This is how a point of the optimizer's coordinate space becomes an
/// assignment.
#[derive(Debug, Clone, Copy)]
pub struct Positional<'a> {
    names: &'a VariableList,
    values: &'a [f64],
}

impl<'a> Positional<'a> {
    /// Pairs the names with the values. Names without a corresponding value
    /// stay unbound.
    pub fn new(names: &'a VariableList, values: &'a [f64]) -> Self {
        Self { names, values }
    }
}

impl Bindings for Positional<'_> {
    fn value(&self, name: &str) -> Option<f64> {
        self.names
            .position(name)
            .and_then(|i| self.values.get(i))
            .copied()
    }
}

/// Evaluates a postfix sequence against the assignment.
///
/// Division by zero is not an error and yields infinity or NaN.
///
/// ```rust
/// use std::collections::HashMap;
/// use optimex::expr::{evaluate, to_postfix, tokenize};
///
/// let postfix = to_postfix(tokenize("x1+x2").unwrap()).unwrap();
/// let assignment = HashMap::from([("x1".to_string(), 2.0), ("x2".to_string(), 3.0)]);
/// assert_eq!(evaluate(&postfix, &assignment), Ok(5.0));
/// ```
pub fn evaluate<B>(postfix: &[Token], bindings: &B) -> Result<f64, EvalError>
where
    B: Bindings + ?Sized,
{
    let mut stack: Vec<f64> = Vec::with_capacity(postfix.len() / 2 + 1);

    for token in postfix {
        match token {
            Token::Number(value) => stack.push(*value),
            Token::Variable(name) => {
                let value = bindings
                    .value(name)
                    .ok_or_else(|| EvalError::UnboundVariable(name.clone()))?;
                stack.push(value);
            }
            Token::Operator(op) => {
                let depth = stack.len();
                match (stack.pop(), stack.pop()) {
                    (Some(b), Some(a)) => stack.push(op.apply(a, b)),
                    _ => return Err(EvalError::MalformedExpression { depth }),
                }
            }
            Token::LeftParen | Token::RightParen => {
                return Err(EvalError::MalformedExpression { depth: stack.len() });
            }
        }
    }

    match stack.as_slice() {
        [value] => Ok(*value),
        _ => Err(EvalError::MalformedExpression { depth: stack.len() }),
    }
}
