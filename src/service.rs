//! Optimization facade.
//!
//! This is the single entry point for collaborators such as HTTP gateways,
//! RPC servers or chat bots. A query carries the function text, the
//! convergence tolerance and the iteration budget; the result carries the
//! minimizing assignment and the function value.
//!
//! ```rust
//! use optimex::service::optimize;
//!
//! let result = optimize("(x1 - 2)^2 + (x2 + 1)^2", 1e-9, 1000).unwrap();
//!
//! assert_eq!(result.variables[0].name, "x1");
//! assert!((result.variables[0].value - 2.0).abs() < 1e-3);
//! assert!(result.function_value < 1e-6);
//! ```
//!
//! Each call compiles its own expression and owns its own simplex, so calls
//! can run concurrently from any number of threads.

use std::sync::atomic::{AtomicBool, Ordering};

use getset::{CopyGetters, Getters, MutGetters, Setters};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    algo::nelder_mead::{NelderMead, NelderMeadError, NelderMeadOptions},
    core::ProblemError,
    driver::{OptimizerDriver, STARTING_COORDINATE},
    expr::{CompiledExpression, ParseError},
};

/// Request to minimize a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationQuery {
    /// Function text, e.g. `x1^2 + x2^2`.
    pub function: String,
    /// Maximal spread of function values across the simplex at convergence.
    /// Must be positive.
    pub tolerance: f64,
    /// Iteration budget. Must be positive.
    #[serde(alias = "max_iter")]
    pub max_iterations: i64,
}

impl OptimizationQuery {
    /// Creates a query.
    pub fn new(function: impl Into<String>, tolerance: f64, max_iterations: i64) -> Self {
        Self {
            function: function.into(),
            tolerance,
            max_iterations,
        }
    }
}

/// Value of a variable at the found minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Name of the variable as it appears in the function text (lowercase).
    pub name: String,
    /// Coordinate of the minimum.
    pub value: f64,
}

/// Found minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Variables in order of their first appearance in the function text.
    pub variables: Vec<Variable>,
    /// Function value at the minimum.
    pub function_value: f64,
}

impl OptimizationResult {
    /// Looks up the value of a variable by name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
    }
}

/// Error returned from the optimization facade.
#[derive(Debug, Error)]
pub enum OptimizationError {
    /// The function text could not be compiled.
    #[error("invalid function: {0}")]
    InvalidFunction(#[from] ParseError),
    /// The tolerance is not a positive finite number.
    #[error("tolerance must be positive, got {0}")]
    InvalidTolerance(f64),
    /// The iteration budget is not positive.
    #[error("maximum number of iterations must be positive, got {0}")]
    InvalidMaxIterations(i64),
    /// The iteration budget was exhausted before reaching the tolerance.
    #[error("did not converge in {iterations} iterations (best value {function_value})")]
    DidNotConverge {
        /// Number of performed iterations.
        iterations: u64,
        /// Best function value found.
        function_value: f64,
    },
    /// The caller requested cancellation.
    #[error("cancelled after {iterations} iterations")]
    Cancelled {
        /// Number of performed iterations.
        iterations: u64,
    },
    /// An internal invariant was violated.
    #[error("internal fault: {0}")]
    Internal(#[source] ProblemError),
}

/// Coarse classification of [`OptimizationError`] for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The query is malformed. Retrying it without changes is pointless.
    InvalidInput,
    /// The function, tolerance and budget do not lead to convergence.
    NotConverged,
    /// The computation was cancelled.
    Cancelled,
    /// The engine is broken.
    Internal,
}

impl OptimizationError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OptimizationError::InvalidFunction(_)
            | OptimizationError::InvalidTolerance(_)
            | OptimizationError::InvalidMaxIterations(_) => ErrorKind::InvalidInput,
            OptimizationError::DidNotConverge { .. } => ErrorKind::NotConverged,
            OptimizationError::Cancelled { .. } => ErrorKind::Cancelled,
            OptimizationError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<NelderMeadError> for OptimizationError {
    fn from(error: NelderMeadError) -> Self {
        match error {
            NelderMeadError::Problem(error) => OptimizationError::Internal(error),
        }
    }
}

/// Port through which collaborators request optimizations.
pub trait Optimizator {
    /// Minimizes the function described by the query.
    fn optimize(&self, query: &OptimizationQuery) -> Result<OptimizationResult, OptimizationError>;
}

/// Options for [`Service`].
#[derive(Debug, Clone, CopyGetters, Getters, MutGetters, Setters)]
pub struct ServiceOptions {
    /// Value of every coordinate of the starting point. Default: `1`.
    #[getset(get_copy = "pub", set = "pub")]
    starting_coordinate: f64,
    /// Options of the Nelder-Mead method.
    #[getset(get = "pub", get_mut = "pub", set = "pub")]
    nelder_mead: NelderMeadOptions<CompiledExpression>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            starting_coordinate: STARTING_COORDINATE,
            nelder_mead: NelderMeadOptions::default(),
        }
    }
}

/// Stateless optimization service. See [module](self) documentation for more
/// details.
#[derive(Debug, Clone, Default)]
pub struct Service {
    options: ServiceOptions,
}

impl Service {
    /// Creates the service with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the service with given options.
    pub fn with_options(options: ServiceOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Minimizes the function described by the query, checking `cancel` once
    /// per iteration.
    pub fn optimize_with_cancel(
        &self,
        query: &OptimizationQuery,
        cancel: &AtomicBool,
    ) -> Result<OptimizationResult, OptimizationError> {
        info!(
            "optimizing `{}` (tolerance = {}, max iterations = {})",
            query.function, query.tolerance, query.max_iterations
        );

        if !(query.tolerance.is_finite() && query.tolerance > 0.0) {
            return Err(OptimizationError::InvalidTolerance(query.tolerance));
        }

        let max_iterations = match u64::try_from(query.max_iterations) {
            Ok(max_iterations) if max_iterations > 0 => max_iterations,
            _ => return Err(OptimizationError::InvalidMaxIterations(query.max_iterations)),
        };

        let expr = CompiledExpression::compile(&query.function).map_err(|error| {
            debug!("cannot compile `{}`: {}", query.function, error);
            error
        })?;

        let x0 = vec![self.options.starting_coordinate; expr.variables().len()];
        let nelder_mead = self.options.nelder_mead.clone();

        let mut driver = OptimizerDriver::builder(&expr)
            .with_initial(x0)
            .with_algo(|f| NelderMead::with_options(f, nelder_mead))
            .build();

        let tolerance = query.tolerance;
        let outcome = driver.find(|state| {
            state.spread() <= tolerance
                || state.iter() as u64 >= max_iterations
                || cancel.load(Ordering::Relaxed)
        });

        if let Err(error) = outcome {
            error!("optimization of `{}` failed: {}", query.function, error);
            return Err(error.into());
        }

        let iterations = driver.iter() as u64;
        let function_value = driver.fx();

        if !(driver.spread() <= tolerance) {
            if cancel.load(Ordering::Relaxed) {
                warn!("optimization cancelled after {} iterations", iterations);
                return Err(OptimizationError::Cancelled { iterations });
            }

            warn!(
                "optimization did not converge in {} iterations, spread = {}",
                iterations,
                driver.spread()
            );
            return Err(OptimizationError::DidNotConverge {
                iterations,
                function_value,
            });
        }

        let variables = expr
            .variables()
            .iter()
            .zip(driver.x())
            .map(|(name, value)| Variable {
                name: name.to_string(),
                value: *value,
            })
            .collect();

        info!(
            "converged in {} iterations, f(x) = {}",
            iterations, function_value
        );

        Ok(OptimizationResult {
            variables,
            function_value,
        })
    }
}

impl Optimizator for Service {
    fn optimize(&self, query: &OptimizationQuery) -> Result<OptimizationResult, OptimizationError> {
        self.optimize_with_cancel(query, &AtomicBool::new(false))
    }
}

/// Minimizes the function with default options.
///
/// Equivalent to [`Service::optimize`](Optimizator::optimize) on a default
/// [`Service`].
pub fn optimize(
    function: &str,
    tolerance: f64,
    max_iterations: i64,
) -> Result<OptimizationResult, OptimizationError> {
    Service::new().optimize(&OptimizationQuery::new(function, tolerance, max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use approx::assert_abs_diff_eq;

    use crate::algo::nelder_mead::CoefficientsFamily;

    #[test]
    fn sphere_converges() {
        let result = optimize("x1^2+x2^2", 1e-6, 1000).unwrap();

        assert_abs_diff_eq!(result.function_value, 0.0, epsilon = 1e-4);
        assert_eq!(result.variables.len(), 2);
        assert_eq!(result.variables[0].name, "x1");
        assert_eq!(result.variables[1].name, "x2");
    }

    #[test]
    fn budget_exhausted() {
        let error = optimize("x1^2+x2^2", 1e-6, 1).unwrap_err();

        assert!(matches!(
            error,
            OptimizationError::DidNotConverge { iterations: 1, .. }
        ));
        assert_eq!(error.kind(), ErrorKind::NotConverged);
    }

    #[test]
    fn invalid_functions() {
        for text in [
            "",
            "x1+(x2",
            "x1 + y",
            "x1 *",
            "(x1)(x2)",
            "x1(+x2)",
            "x1+x2(*3)",
            "x1^2(+x2^2)",
            "1e-5 * x1",
        ] {
            let error = optimize(text, 1e-6, 1000).unwrap_err();

            assert!(
                matches!(error, OptimizationError::InvalidFunction(_)),
                "{}: {:?}",
                text,
                error
            );
            assert_eq!(error.kind(), ErrorKind::InvalidInput);
        }

        assert!(matches!(
            optimize("", 1e-6, 1000),
            Err(OptimizationError::InvalidFunction(ParseError::EmptyExpression))
        ));
        assert!(matches!(
            optimize("x1+(x2", 1e-6, 1000),
            Err(OptimizationError::InvalidFunction(
                ParseError::UnbalancedParentheses
            ))
        ));
    }

    #[test]
    fn invalid_query() {
        for tolerance in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                optimize("x1^2", tolerance, 100),
                Err(OptimizationError::InvalidTolerance(_))
            ));
        }

        for max_iterations in [0, -5] {
            assert!(matches!(
                optimize("x1^2", 1e-6, max_iterations),
                Err(OptimizationError::InvalidMaxIterations(m)) if m == max_iterations
            ));
        }
    }

    #[test]
    fn full_precision_coordinates() {
        let result = optimize("(x1 - 0.5)^2 + (x2 + 2.25)^2", 1e-12, 2000).unwrap();

        assert_abs_diff_eq!(result.value("x1").unwrap(), 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(result.value("x2").unwrap(), -2.25, epsilon = 1e-4);
        assert_eq!(result.value("x3"), None);
    }

    #[test]
    fn variables_in_first_seen_order() {
        let result = optimize("(x3 - 1)^2 + (x1 + 1)^2 + X2^2", 1e-10, 5000).unwrap();

        let names: Vec<&str> = result.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["x3", "x1", "x2"]);

        assert_abs_diff_eq!(result.variables[0].value, 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(result.variables[1].value, -1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(result.variables[2].value, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn constant_function() {
        let result = optimize("2 * (3 + 4)", 1e-6, 10).unwrap();

        assert!(result.variables.is_empty());
        assert_eq!(result.function_value, 14.0);
    }

    #[test]
    fn division_by_zero_is_not_an_error() {
        // Infinite at the starting point.
        let result = optimize("(x1 - 3)^2 + 1/(x1 - 1)^2", 1e-10, 2000).unwrap();

        assert!(result.function_value.is_finite());
        assert!(result.value("x1").unwrap() > 1.0);
    }

    #[test]
    fn cancellation() {
        let cancel = AtomicBool::new(true);
        let error = Service::new()
            .optimize_with_cancel(&OptimizationQuery::new("x1^2 + x2^2", 1e-12, 1000), &cancel)
            .unwrap_err();

        assert!(matches!(
            error,
            OptimizationError::Cancelled { iterations: 1 }
        ));
        assert_eq!(error.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn custom_options() {
        let mut options = ServiceOptions::default();
        options.set_starting_coordinate(-4.0);
        options
            .nelder_mead_mut()
            .set_family(CoefficientsFamily::Balanced);

        let service = Service::with_options(options);
        assert_eq!(service.options().starting_coordinate(), -4.0);

        let result = service
            .optimize(&OptimizationQuery::new("(x1 + 4)^2 + (x2 - 1)^2 + (x3 + x1)^2", 1e-10, 5000))
            .unwrap();

        assert_abs_diff_eq!(result.function_value, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn concurrent_requests() {
        let service = Service::new();
        let functions: Vec<(String, f64)> = (1..=8)
            .map(|k| (format!("(x1 - {})^2 + (x2 + {})^2", k, k), k as f64))
            .collect();

        let results: Vec<(f64, OptimizationResult)> = thread::scope(|s| {
            let handles: Vec<_> = functions
                .iter()
                .map(|(function, k)| {
                    let service = &service;
                    s.spawn(move || {
                        let query = OptimizationQuery::new(function.as_str(), 1e-10, 2000);
                        (*k, service.optimize(&query).unwrap())
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (k, result) in results {
            assert_abs_diff_eq!(result.value("x1").unwrap(), k, epsilon = 1e-3);
            assert_abs_diff_eq!(result.value("x2").unwrap(), -k, epsilon = 1e-3);
        }
    }

    #[test]
    fn wire_format() {
        let query: OptimizationQuery =
            serde_json::from_str(r#"{"function": "x1^2", "tolerance": 0.001, "max_iter": 10}"#)
                .unwrap();
        assert_eq!(query, OptimizationQuery::new("x1^2", 0.001, 10));

        let result = OptimizationResult {
            variables: vec![Variable {
                name: "x1".to_string(),
                value: 0.5,
            }],
            function_value: 0.25,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "variables": [{"name": "x1", "value": 0.5}],
                "function_value": 0.25
            })
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            OptimizationError::from(ParseError::UnbalancedParentheses).to_string(),
            "invalid function: unbalanced parentheses"
        );
        assert_eq!(
            OptimizationError::DidNotConverge {
                iterations: 3,
                function_value: 1.5
            }
            .to_string(),
            "did not converge in 3 iterations (best value 1.5)"
        );
    }
}
