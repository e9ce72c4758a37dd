use std::{fmt, str::FromStr};

use log::debug;
use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use super::{
    eval::{evaluate, Bindings, EvalError, Positional},
    postfix::{check_arity, to_postfix},
    token::{tokenize, Token},
    variables::{extract_variables, VariableList},
    ParseError,
};
use crate::core::{Function, Problem, ProblemError};

/// Function text compiled into postfix form together with its variables.
///
/// Immutable once built. Evaluation takes the assignment as an argument, so a
/// single instance can be evaluated from multiple threads.
///
/// ```rust
/// use optimex::expr::CompiledExpression;
///
/// let expr: CompiledExpression = "x1*(x2+3)^2".parse().unwrap();
/// assert_eq!(expr.variables().as_slice(), ["x1", "x2"]);
/// assert_eq!(expr.evaluate(&[("x1", 2.0), ("x2", 1.0)][..]), Ok(32.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    postfix: Vec<Token>,
    variables: VariableList,
}

impl CompiledExpression {
    /// Compiles the function text.
    pub fn compile(text: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(text)?;
        let postfix = to_postfix(tokens.iter().cloned())?;
        check_arity(&tokens)?;

        let variables = extract_variables(&tokens);

        let expr = Self { postfix, variables };
        debug!(
            "compiled `{}` into `{}` with {} variable(s)",
            text,
            expr,
            expr.variables.len()
        );

        Ok(expr)
    }

    /// Tokens in postfix order.
    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }

    /// Variables in order of first appearance.
    pub fn variables(&self) -> &VariableList {
        &self.variables
    }

    /// Evaluates the expression for the assignment.
    pub fn evaluate<B>(&self, bindings: &B) -> Result<f64, EvalError>
    where
        B: Bindings + ?Sized,
    {
        evaluate(&self.postfix, bindings)
    }
}

impl FromStr for CompiledExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.postfix.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl Problem for CompiledExpression {
    type Field = f64;

    fn dim(&self) -> usize {
        self.variables.len()
    }
}

impl Function for CompiledExpression {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Result<Self::Field, ProblemError>
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        if x.len() != self.dim() {
            return Err(ProblemError::InvalidDimensionality {
                expected: self.dim(),
                actual: x.len(),
            });
        }

        let values = x.as_slice();
        let value = self.evaluate(&Positional::new(&self.variables, values))?;
        Ok(value)
    }
}
