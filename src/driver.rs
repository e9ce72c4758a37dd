//! High-level API for optimization.
//!
//! The driver encapsulates all internal state and provides a simple API to run
//! the iterative process.
//!
//! The simplest way of using the driver is to initialize it with the defaults:
//!
//! ```rust
//! use optimex::{expr::CompiledExpression, OptimizerDriver};
//!
//! let f = CompiledExpression::compile("x1^2 + x2^2").unwrap();
//!
//! let mut optimizer = OptimizerDriver::new(&f);
//! ```
//!
//! If you need to specify additional settings, use the builder:
//!
//! ```rust
//! use optimex::{algo::nelder_mead::*, expr::CompiledExpression, OptimizerDriver};
//!
//! let f = CompiledExpression::compile("x1^2 + x2^2").unwrap();
//!
//! let mut options = NelderMeadOptions::default();
//! options.set_family(CoefficientsFamily::Balanced);
//!
//! let mut optimizer = OptimizerDriver::builder(&f)
//!     .with_initial(vec![10.0, -10.0])
//!     .with_algo(|f| NelderMead::with_options(f, options))
//!     .build();
//! ```
//!
//! Once you have the optimizer, you can use it to find the minimum:
//!
//! ```rust
//! # use optimex::{expr::CompiledExpression, OptimizerDriver};
//! # let f = CompiledExpression::compile("x1^2 + x2^2").unwrap();
//! # let mut optimizer = OptimizerDriver::new(&f);
//! let (x, value) = optimizer
//!     .find(|state| state.spread() <= 1e-6 || state.iter() >= 1000)
//!     .expect("optimizer encountered an error");
//! ```
//!
//! If you need more control over the iteration process, you can do the
//! iterations manually:
//!
//! ```rust
//! # use optimex::{expr::CompiledExpression, OptimizerDriver};
//! # let f = CompiledExpression::compile("x1^2 + x2^2").unwrap();
//! # let mut optimizer = OptimizerDriver::new(&f);
//! loop {
//!     let (x, value) = optimizer.next().expect("no optimizer error");
//!     // ...
//! #   break;
//! }
//! ```

use nalgebra::{convert, DimName, Dyn, OVector, U1};

use crate::{algo::NelderMead, Function, Optimizer, Problem};

/// Value of every coordinate of the default starting point.
pub const STARTING_COORDINATE: f64 = 1.0;

/// Builder for the [`OptimizerDriver`].
pub struct OptimizerBuilder<'a, F: Problem, A> {
    f: &'a F,
    algo: A,
    x0: OVector<F::Field, Dyn>,
}

impl<'a, F: Problem> OptimizerBuilder<'a, F, NelderMead<F>> {
    fn new(f: &'a F) -> Self {
        let algo = NelderMead::new(f);

        let dim = Dyn(f.dim());
        let x0 = OVector::from_element_generic(dim, U1::name(), convert(STARTING_COORDINATE));

        Self { f, algo, x0 }
    }
}

impl<'a, F: Problem, A> OptimizerBuilder<'a, F, A> {
    /// Sets the initial point from which the iterative process starts.
    ///
    /// The length must be equal to the dimension of the problem.
    pub fn with_initial(mut self, x0: Vec<F::Field>) -> Self {
        assert_eq!(x0.len(), self.f.dim(), "initial point has invalid dimension");

        let dim = Dyn(self.f.dim());
        self.x0 = OVector::from_vec_generic(dim, U1::name(), x0);
        self
    }

    /// Sets specific algorithm to be used.
    ///
    /// This builder method accepts a closure that takes the reference to the
    /// problem. For algorithms in optimex, you can simply pass the `new`
    /// constructor directly (e.g., `NelderMead::new`).
    pub fn with_algo<A2, FA>(self, factory: FA) -> OptimizerBuilder<'a, F, A2>
    where
        FA: FnOnce(&F) -> A2,
    {
        let algo = factory(self.f);

        OptimizerBuilder {
            f: self.f,
            algo,
            x0: self.x0,
        }
    }

    /// Builds the [`OptimizerDriver`].
    pub fn build(self) -> OptimizerDriver<'a, F, A> {
        let Self { f, algo, x0 } = self;

        OptimizerDriver {
            f,
            algo,
            x: x0,
            fx: convert(f64::INFINITY),
            iter: 0,
        }
    }
}

/// The driver for the process of minimizing a function.
///
/// For default settings, use [`OptimizerDriver::new`]. For more flexibility,
/// use [`OptimizerDriver::builder`]. For the usage of the driver, see
/// [module](self) documentation.
pub struct OptimizerDriver<'a, F: Problem, A> {
    f: &'a F,
    algo: A,
    x: OVector<F::Field, Dyn>,
    fx: F::Field,
    iter: usize,
}

impl<'a, F: Problem> OptimizerDriver<'a, F, NelderMead<F>> {
    /// Returns the builder for specifying additional settings.
    pub fn builder(f: &'a F) -> OptimizerBuilder<'a, F, NelderMead<F>> {
        OptimizerBuilder::new(f)
    }

    /// Initializes the driver with the default settings.
    pub fn new(f: &'a F) -> Self {
        OptimizerDriver::builder(f).build()
    }
}

impl<'a, F: Problem, A> OptimizerDriver<'a, F, A> {
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Returns the current function value.
    pub fn fx(&self) -> F::Field {
        self.fx
    }

    /// Returns the number of completed iterations.
    pub fn iter(&self) -> usize {
        self.iter
    }

    /// Returns reference to the algorithm.
    pub fn algo(&self) -> &A {
        &self.algo
    }
}

impl<'a, F: Function, A: Optimizer<F>> OptimizerDriver<'a, F, A> {
    /// Does one iteration of the process, returning the function value in case
    /// of no error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(&[F::Field], F::Field), A::Error> {
        self.fx = self.algo.opt_next(self.f, &mut self.x)?;
        self.iter += 1;
        Ok((self.x.as_slice(), self.fx))
    }

    /// Runs the iterative process until given stopping criterion is satisfied.
    pub fn find<C>(&mut self, stop: C) -> Result<(&[F::Field], F::Field), A::Error>
    where
        C: Fn(OptimizerIterState<'_, F>) -> bool,
    {
        loop {
            self.next()?;

            let state = OptimizerIterState {
                x: &self.x,
                fx: self.fx,
                spread: self.algo.spread(),
                iter: self.iter,
            };

            if stop(state) {
                return Ok((self.x.as_slice(), self.fx));
            }
        }
    }

    /// Returns the convergence measure of the algorithm.
    pub fn spread(&self) -> F::Field {
        self.algo.spread()
    }

    /// Returns the name of the used optimizer.
    pub fn name(&self) -> &str {
        A::NAME
    }
}

/// State of the current iteration.
pub struct OptimizerIterState<'a, F: Problem> {
    x: &'a OVector<F::Field, Dyn>,
    fx: F::Field,
    spread: F::Field,
    iter: usize,
}

impl<'a, F: Problem> OptimizerIterState<'a, F> {
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Returns the current function value.
    pub fn fx(&self) -> F::Field {
        self.fx
    }

    /// Returns the convergence measure of the algorithm (see
    /// [`Optimizer::spread`]).
    pub fn spread(&self) -> F::Field {
        self.spread
    }

    /// Returns the number of completed iterations, including the current one.
    pub fn iter(&self) -> usize {
        self.iter
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        algo::nelder_mead::{CoefficientsFamily, NelderMead, NelderMeadOptions},
        expr::CompiledExpression,
        testing::{Booth, Sphere},
    };

    use super::*;

    #[test]
    fn optimizer_basic_use_case() {
        let f = Sphere::new(4);
        let mut optimizer = OptimizerDriver::builder(&f)
            // Zeros are the minimum for sphere, there would be no point is
            // such test.
            .with_initial(vec![10.0; 4])
            .build();

        let tolerance = 1e-6;
        let (_, value) = optimizer
            .find(|state| state.iter() >= 1000 || state.fx() < tolerance)
            .unwrap();

        assert!(value <= tolerance);
    }

    #[test]
    fn optimizer_custom() {
        let f = Booth::new();
        let mut options = NelderMeadOptions::default();
        options.set_family(CoefficientsFamily::Balanced);

        let mut optimizer = OptimizerDriver::builder(&f)
            .with_algo(|f| NelderMead::with_options(f, options))
            .with_initial(vec![-10.0, 10.0])
            .build();

        let tolerance = 1e-6;
        let (_, value) = optimizer
            .find(|state| state.iter() >= 1000 || state.fx() < tolerance)
            .unwrap();

        assert!(value <= tolerance);
        assert_eq!(optimizer.name(), "Nelder-Mead");
    }

    #[test]
    fn optimizer_initial() {
        let x0 = vec![10.0; 4];

        let f = Sphere::new(4);
        let optimizer = OptimizerDriver::builder(&f)
            .with_initial(x0.clone())
            .build();

        assert_eq!(optimizer.x(), &x0);
        assert_eq!(optimizer.iter(), 0);
    }

    #[test]
    fn optimizer_default_starting_point() {
        let f = CompiledExpression::compile("x1 + x2 + x3").unwrap();
        let optimizer = OptimizerDriver::new(&f);

        assert_eq!(optimizer.x(), &[1.0, 1.0, 1.0]);
        assert_eq!(optimizer.spread(), f64::INFINITY);
    }

    #[test]
    fn optimizer_spread_criterion() {
        let f = CompiledExpression::compile("x1^2 + x2^2").unwrap();
        let mut optimizer = OptimizerDriver::new(&f);

        let tolerance = 1e-6;
        let (_, value) = optimizer
            .find(|state| state.spread() <= tolerance || state.iter() >= 1000)
            .unwrap();

        assert!(optimizer.spread() <= tolerance);
        assert!(optimizer.iter() < 1000);
        assert!(value.abs() < 1e-4);
    }

    #[test]
    #[should_panic(expected = "initial point has invalid dimension")]
    fn optimizer_initial_invalid_dimension() {
        let f = Sphere::new(2);
        OptimizerDriver::builder(&f).with_initial(vec![1.0]);
    }
}
