use nalgebra::{storage::StorageMut, Dyn, IsContiguous, Vector};

use super::function::Function;

/// Interface of an optimizer.
///
/// An optimizer is an iterative algorithm which takes a point _x_ and computes
/// the next step in the optimization process. Repeated calls to the next step
/// should eventually converge into a minimum _x'_.
///
/// ## Implementing an optimizer
///
/// Here is an implementation of an "optimizer" which walks along the first
/// coordinate and never claims convergence.
///
/// ```rust
/// use optimex::nalgebra as na;
/// use optimex::{Function, Optimizer, ProblemError};
/// use na::{storage::StorageMut, Dyn, IsContiguous, Vector};
///
/// struct Walk;
///
/// impl<F: Function<Field = f64>> Optimizer<F> for Walk {
///     const NAME: &'static str = "Walk";
///     type Error = ProblemError;
///
///     fn opt_next<Sx>(
///         &mut self,
///         f: &F,
///         x: &mut Vector<F::Field, Dyn, Sx>,
///     ) -> Result<F::Field, Self::Error>
///     where
///         Sx: StorageMut<F::Field, Dyn> + IsContiguous,
///     {
///         x[0] -= 0.1;
///
///         // We must compute the value.
///         f.apply(x)
///     }
///
///     fn spread(&self) -> F::Field {
///         f64::INFINITY
///     }
/// }
/// ```
pub trait Optimizer<F: Function> {
    /// Name of the optimizer.
    const NAME: &'static str;

    /// Error while computing the next step.
    type Error;

    /// Computes the next step in the optimization process.
    ///
    /// The value of `x` is the current point. After the method returns, `x`
    /// should hold the variable values of the performed step and the return
    /// value _must_ be the function value of that step as computed by
    /// [`Function::apply`].
    ///
    /// The implementations _can_ assume that subsequent calls to `opt_next`
    /// pass the value of `x` as was returned in the previous iteration.
    fn opt_next<Sx>(
        &mut self,
        f: &F,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous;

    /// Returns the convergence measure of the current state. For population or
    /// simplex based methods it is the spread of function values across the
    /// kept points. Infinity when there is no state yet.
    fn spread(&self) -> F::Field;
}
