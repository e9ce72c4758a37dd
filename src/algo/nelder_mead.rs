//! Nelder-mead (simplex) optimization method.
//!
//! [Nelder-Mead](https://en.wikipedia.org/wiki/Nelder%E2%80%93Mead_method)
//! simplex-reflection method is a popular derivative-free optimization
//! algorithm. It keeps a [simplex](https://en.wikipedia.org/wiki/Simplex) of
//! _n + 1_ points and the simplex is reflected, expanded, contracted or shrunk
//! based on the function values comparison.
//!
//! Non-finite function values are ranked as positive infinity, so such points
//! are always the first candidates for replacement and never become the best
//! point unless every point is non-finite.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
//!
//! \[2\] [Implementing the Nelder-Mead simplex algorithm with adaptive
//! parameters](https://link.springer.com/article/10.1007/s10589-010-9329-3)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{
    convert,
    storage::{Storage, StorageMut},
    ComplexField, Dim, DimName, Dyn, IsContiguous, OVector, RealField, Vector, U1,
};
use num_traits::{One, Zero};
use thiserror::Error;

use crate::core::{Function, Optimizer, Problem, ProblemError};

/// Family of coefficients for reflection, expansion, contraction and
/// shrinking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoefficientsFamily {
    /// Standard ("textbook") choice: 1, 2, 0.5 and 0.5.
    Standard,
    /// The coefficients are adjusted compared to standard by taking problem
    /// dimension into account to avoid diminishing of expansion and contraction
    /// steps in higher dimensions \[2\]. Falls back to standard for problems
    /// with less than two variables.
    Balanced,
    /// The coefficients are left unchanged so it is the responsibility of the
    /// user to set them through [`NelderMeadOptions`].
    Fixed,
}

/// Options for [`NelderMead`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct NelderMeadOptions<F: Problem> {
    /// Family for coefficients adaptation or fixed coefficients. Default:
    /// standard (see [`CoefficientsFamily`]).
    family: CoefficientsFamily,
    /// Coefficient for reflection operation. Default: `1`.
    reflection_coeff: F::Field,
    /// Coefficient for expansion operation. Default: `2`.
    expansion_coeff: F::Field,
    /// Coefficient for contraction operation. Default: `0.5`.
    contraction_coeff: F::Field,
    /// Coefficient for shrinking operation. Default: `0.5`.
    shrink_coeff: F::Field,
    /// Relative perturbation of a nonzero coordinate when building the
    /// initial simplex. Default: `0.05`.
    relative_step: F::Field,
    /// Value of a zero coordinate after perturbation when building the initial
    /// simplex. Default: `0.00025`.
    zero_step: F::Field,
}

impl<F: Problem> Default for NelderMeadOptions<F> {
    fn default() -> Self {
        Self {
            family: CoefficientsFamily::Standard,
            reflection_coeff: convert(1.0),
            expansion_coeff: convert(2.0),
            contraction_coeff: convert(0.5),
            shrink_coeff: convert(0.5),
            relative_step: convert(0.05),
            zero_step: convert(0.00025),
        }
    }
}

impl<F: Problem> NelderMeadOptions<F> {
    fn overwrite_coeffs(&mut self, dim: usize) {
        let Self {
            family,
            reflection_coeff,
            expansion_coeff,
            contraction_coeff,
            shrink_coeff,
            ..
        } = self;

        match family {
            CoefficientsFamily::Balanced if dim >= 2 => {
                let n: F::Field = convert(dim as f64);
                let n_inv = F::Field::one() / n;

                *reflection_coeff = convert(1.0);
                *expansion_coeff = n_inv * convert(2.0) + convert(1.0);
                *contraction_coeff = convert::<_, F::Field>(0.75) - n_inv * convert(0.5);
                *shrink_coeff = F::Field::one() - n_inv;
            }
            CoefficientsFamily::Standard | CoefficientsFamily::Balanced => {
                *reflection_coeff = convert(1.0);
                *expansion_coeff = convert(2.0);
                *contraction_coeff = convert(0.5);
                *shrink_coeff = convert(0.5);
            }
            CoefficientsFamily::Fixed => {
                // Leave unchanged.
            }
        }
    }
}

/// Nelder-Mead optimizer. See [module](self) documentation for more details.
pub struct NelderMead<F: Problem> {
    options: NelderMeadOptions<F>,
    centroid: OVector<F::Field, Dyn>,
    reflection: OVector<F::Field, Dyn>,
    expansion: OVector<F::Field, Dyn>,
    contraction: OVector<F::Field, Dyn>,
    simplex: Vec<OVector<F::Field, Dyn>>,
    values: Vec<F::Field>,
    sort_perm: Vec<usize>,
}

impl<F: Problem> NelderMead<F> {
    /// Initializes Nelder-Mead optimizer with default options.
    pub fn new(f: &F) -> Self {
        Self::with_options(f, NelderMeadOptions::default())
    }

    /// Initializes Nelder-Mead optimizer with given options.
    pub fn with_options(f: &F, mut options: NelderMeadOptions<F>) -> Self {
        let dim = Dyn(f.dim());

        options.overwrite_coeffs(f.dim());

        Self {
            options,
            centroid: OVector::zeros_generic(dim, U1::name()),
            reflection: OVector::zeros_generic(dim, U1::name()),
            expansion: OVector::zeros_generic(dim, U1::name()),
            contraction: OVector::zeros_generic(dim, U1::name()),
            simplex: Vec::with_capacity(f.dim() + 1),
            values: Vec::with_capacity(f.dim() + 1),
            sort_perm: Vec::with_capacity(f.dim() + 1),
        }
    }

    /// Returns the options in effect, with the coefficients of the chosen
    /// family filled in.
    pub fn options(&self) -> &NelderMeadOptions<F> {
        &self.options
    }

    /// Resets the internal state of the optimizer.
    pub fn reset(&mut self) {
        // Causes simplex to be initialized again.
        self.simplex.clear();
        self.values.clear();
        self.sort_perm.clear();
    }

    /// Iterates over the simplex points and their function values, from the
    /// best to the worst. Empty before the first iteration.
    pub fn vertices(&self) -> impl Iterator<Item = (&[F::Field], F::Field)> + '_ {
        self.sort_perm
            .iter()
            .map(move |&i| (self.simplex[i].as_slice(), self.values[i]))
    }
}

/// Error returned from [`NelderMead`] optimizer.
#[derive(Debug, Error)]
pub enum NelderMeadError {
    /// Evaluation of the function failed.
    #[error("{0}")]
    Problem(#[from] ProblemError),
}

impl<F: Function> NelderMead<F> {
    fn init_simplex<Sx>(&mut self, f: &F, x: &Vector<F::Field, Dyn, Sx>) -> Result<(), ProblemError>
    where
        Sx: Storage<F::Field, Dyn> + IsContiguous,
    {
        let NelderMeadOptions {
            relative_step,
            zero_step,
            ..
        } = self.options;

        let Self {
            simplex,
            values,
            sort_perm,
            ..
        } = self;

        let n = f.dim();

        // It is important to return early on error before the point is
        // added to the simplex.
        let value = f.apply(x)?.nan_to_inf();
        values.push(value);
        simplex.push(x.clone_owned());

        for j in 0..n {
            let mut xi = x.clone_owned();
            if xi[j] == F::Field::zero() {
                xi[j] = zero_step;
            } else {
                xi[j] *= F::Field::one() + relative_step;
            }

            let value = match f.apply(&xi) {
                Ok(value) => value.nan_to_inf(),
                Err(error) => {
                    simplex.clear();
                    values.clear();
                    return Err(error);
                }
            };

            values.push(value);
            simplex.push(xi);
        }

        let invalid_count = values.iter().filter(|v| !v.is_finite()).count();
        if invalid_count > 0 {
            debug!(
                "{} out of {} points in initial simplex have invalid value",
                invalid_count,
                simplex.len()
            );
        }

        sort_perm.extend(0..=n);
        sort_by_values(sort_perm.as_mut_slice(), values.as_slice());

        Ok(())
    }

    fn next_inner<Sx>(
        &mut self,
        f: &F,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, NelderMeadError>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        if self.simplex.is_empty() {
            self.init_simplex(f, x)?;
        }

        let NelderMeadOptions {
            reflection_coeff,
            expansion_coeff,
            contraction_coeff,
            shrink_coeff,
            ..
        } = self.options;

        let Self {
            simplex,
            values,
            sort_perm,
            centroid,
            reflection,
            expansion,
            contraction,
            ..
        } = self;

        let n = f.dim();

        if n == 0 {
            // A constant has nothing to move.
            x.copy_from(&simplex[sort_perm[0]]);
            return Ok(values[sort_perm[0]]);
        }

        // Calculate the centroid of all points except the worst.
        centroid.fill(F::Field::zero());
        (0..n)
            .map(|i| &simplex[sort_perm[i]])
            .for_each(|xi| *centroid += xi);
        *centroid /= convert(n as f64);

        debug!("centroid of simplex: {:?}", centroid.as_slice());

        #[derive(Debug, Clone, Copy, PartialEq)]
        enum Transformation {
            Reflection,
            Expansion,
            Contraction,
            Shrinkage,
        }

        impl Transformation {
            fn as_str(&self) -> &str {
                match self {
                    Transformation::Reflection => "reflection",
                    Transformation::Expansion => "expansion",
                    Transformation::Contraction => "contraction",
                    Transformation::Shrinkage => "shrinkage",
                }
            }
        }

        let best = sort_perm[0];
        let second_worst = sort_perm[n - 1];
        let worst = sort_perm[n];

        // Perform one of possible simplex transformations.
        reflection.on_line2_mut(centroid, &simplex[worst], -reflection_coeff);
        let reflection_value = f.apply(reflection)?.nan_to_inf();

        #[allow(clippy::suspicious_else_formatting)]
        let transformation = if values[best] <= reflection_value
            && reflection_value < values[second_worst]
        {
            // Reflected point is neither best nor worst in the new simplex.
            // Just replace the worst point.
            simplex[worst].copy_from(reflection);
            values[worst] = reflection_value;
            Transformation::Reflection
        } else if reflection_value < values[best] {
            // Reflected point is better than the current best. Try to go
            // farther along this direction.
            expansion.on_line2_mut(centroid, reflection, expansion_coeff);
            let expansion_value = f.apply(expansion)?.nan_to_inf();

            if expansion_value < reflection_value {
                // Expansion indeed helped, replace the worst point.
                simplex[worst].copy_from(expansion);
                values[worst] = expansion_value;
                Transformation::Expansion
            } else {
                // Expansion didn't help, replace the worst point with the
                // reflected point.
                simplex[worst].copy_from(reflection);
                values[worst] = reflection_value;
                Transformation::Reflection
            }
        } else
        /* reflection_value >= values[second_worst] */
        {
            // Reflected point is still worse than the second to last point.
            // Try to contract towards the worst point.
            contraction.on_line2_mut(centroid, &simplex[worst], contraction_coeff);
            let contraction_value = f.apply(contraction)?.nan_to_inf();

            if contraction_value < values[worst] {
                simplex[worst].copy_from(contraction);
                values[worst] = contraction_value;
                Transformation::Contraction
            } else {
                // Contraction was not acceptable. Shrink the simplex towards
                // the best point.
                contraction.copy_from(&simplex[best]);

                for &i in sort_perm.iter().skip(1) {
                    let xi = &mut simplex[i];
                    xi.on_line_mut(contraction, shrink_coeff);
                    values[i] = f.apply(xi)?.nan_to_inf();
                }

                Transformation::Shrinkage
            }
        };

        // Establish the ordering of simplex points.
        sort_by_values(sort_perm.as_mut_slice(), values.as_slice());

        debug!(
            "performed {},\tf(x) = {} - {}",
            transformation.as_str(),
            values[sort_perm[0]],
            values[sort_perm[n]]
        );

        // Return the best simplex point.
        x.copy_from(&simplex[sort_perm[0]]);

        Ok(values[sort_perm[0]])
    }
}

impl<F: Function> Optimizer<F> for NelderMead<F> {
    const NAME: &'static str = "Nelder-Mead";

    type Error = NelderMeadError;

    fn opt_next<Sx>(
        &mut self,
        f: &F,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        self.next_inner(f, x)
    }

    fn spread(&self) -> F::Field {
        match (self.sort_perm.first(), self.sort_perm.last()) {
            (Some(&best), Some(&worst)) => self.values[worst] - self.values[best],
            _ => convert(f64::INFINITY),
        }
    }
}

// Stable sort keeps the best point in place when values tie.
fn sort_by_values<T: RealField>(sort_perm: &mut [usize], values: &[T]) {
    sort_perm.sort_by(|a, b| {
        values[*a]
            .partial_cmp(&values[*b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

trait VectorNelderMeadExt<T: RealField, D: Dim> {
    fn on_line_mut<Sto>(&mut self, to: &Vector<T, D, Sto>, t: T)
    where
        Sto: Storage<T, D>;

    fn on_line2_mut<Sfrom, Sto>(
        &mut self,
        from: &Vector<T, D, Sfrom>,
        to: &Vector<T, D, Sto>,
        t: T,
    ) where
        Sfrom: Storage<T, D>,
        Sto: Storage<T, D>;
}

impl<T: RealField + Copy, D: Dim, S> VectorNelderMeadExt<T, D> for Vector<T, D, S>
where
    S: StorageMut<T, D>,
{
    /// `self <- to + t * (self - to)`
    fn on_line_mut<Sto>(&mut self, to: &Vector<T, D, Sto>, t: T)
    where
        Sto: Storage<T, D>,
    {
        *self -= to;
        *self *= t;
        *self += to;
    }

    /// `self <- from + t * (to - from)`
    fn on_line2_mut<Sfrom, Sto>(&mut self, from: &Vector<T, D, Sfrom>, to: &Vector<T, D, Sto>, t: T)
    where
        Sfrom: Storage<T, D>,
        Sto: Storage<T, D>,
    {
        to.sub_to(from, self);
        *self *= t;
        *self += from;
    }
}

trait RealFieldNelderMeadExt {
    fn nan_to_inf(self) -> Self;
}

impl<T: RealField> RealFieldNelderMeadExt for T {
    fn nan_to_inf(self) -> Self {
        if self.is_finite() {
            self
        } else {
            // Not finite also covers NaN and negative infinity.
            convert(f64::INFINITY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use crate::{expr::CompiledExpression, testing::*};

    #[test]
    fn rosenbrock() {
        let n = 2;

        let f = ExtendedRosenbrock::new(n);
        let eps = 1e-8;

        for x in f.initials() {
            let optimizer = NelderMead::new(&f);
            let x = optimize(&f, optimizer, x, 0.0, 5000, eps).unwrap();
            assert!(f.is_optimum(&x, 1e-3));
        }
    }

    #[test]
    fn sphere() {
        let f = Sphere::new(4);
        let eps = 1e-10;

        for x in f.initials() {
            let optimizer = NelderMead::new(&f);
            let x = optimize(&f, optimizer, x, 0.0, 5000, eps).unwrap();
            assert!(f.is_optimum(&x, 1e-3));
        }
    }

    #[test]
    fn booth_balanced() {
        let f = Booth::new();
        let eps = 1e-10;

        let mut options = NelderMeadOptions::default();
        options.set_family(CoefficientsFamily::Balanced);

        for x in f.initials() {
            let optimizer = NelderMead::with_options(&f, options.clone());
            let x = optimize(&f, optimizer, x, 0.0, 5000, eps).unwrap();
            assert!(f.is_optimum(&x, 1e-3));
        }
    }

    #[test]
    fn univariate_optimization() {
        let f = Sphere::new(1);
        let eps = 1e-3;

        for x in f.initials() {
            let optimizer = NelderMead::new(&f);
            optimize(&f, optimizer, x, 0.0, 100, eps).unwrap();
        }
    }

    #[test]
    fn initial_simplex() {
        let f = Sphere::new(3);
        let mut optimizer = NelderMead::new(&f);

        let mut x = dvector![1.0, 0.0, -2.0];
        optimizer.init_simplex(&f, &x).unwrap();

        let mut points: Vec<Vec<f64>> = optimizer.vertices().map(|(x, _)| x.to_vec()).collect();
        points.sort_by(|a, b| a.partial_cmp(b).unwrap());

        assert_eq!(
            points,
            vec![
                vec![1.0, 0.0, -2.1],
                vec![1.0, 0.0, -2.0],
                vec![1.0, 0.00025, -2.0],
                vec![1.05, 0.0, -2.0],
            ]
        );

        // Iterating does not initialize the simplex again.
        optimizer.opt_next(&f, &mut x).unwrap();
        assert_eq!(optimizer.vertices().count(), 4);
    }

    #[test]
    fn simplex_stays_sorted() {
        let f = ExtendedRosenbrock::new(2);
        let mut optimizer = NelderMead::new(&f);
        let mut x = dvector![-1.2, 1.0];

        for _ in 0..50 {
            let fx = optimizer.opt_next(&f, &mut x).unwrap();
            let values: Vec<f64> = optimizer.vertices().map(|(_, v)| v).collect();

            assert_eq!(values.len(), 3);
            assert!(values.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(fx, values[0]);
            assert_eq!(optimizer.spread(), values[2] - values[0]);
            assert_eq!(f.apply(&x).unwrap(), fx);
        }
    }

    #[test]
    fn non_finite_ranked_worst() {
        // NaN at the starting point, finite elsewhere.
        let f = CompiledExpression::compile("x1^2 + x2^2 + (x1 - 1)/(x2 - 1)").unwrap();
        let mut optimizer = NelderMead::new(&f);

        let mut x = dvector![1.0, 1.0];
        let fx = optimizer.opt_next(&f, &mut x).unwrap();

        assert!(fx.is_finite());
        assert!(optimizer.vertices().all(|(_, v)| !v.is_nan()));
        assert_ne!(x, dvector![1.0, 1.0]);
    }

    #[test]
    fn spread_before_first_iteration() {
        let f = Sphere::new(2);
        let optimizer = NelderMead::new(&f);

        assert_eq!(Optimizer::<Sphere>::spread(&optimizer), f64::INFINITY);
        assert_eq!(optimizer.vertices().count(), 0);
    }

    #[test]
    fn constant_function() {
        let f = CompiledExpression::compile("2*3").unwrap();
        let mut optimizer = NelderMead::new(&f);

        let mut x = nalgebra::DVector::zeros(0);
        assert_eq!(optimizer.opt_next(&f, &mut x).unwrap(), 6.0);
        assert_eq!(optimizer.spread(), 0.0);
    }

    #[test]
    fn quadratic_minimum() {
        let f = CompiledExpression::compile("(x1 - 3)^2 + (x2 + 1)^2 + 2").unwrap();
        let optimizer = NelderMead::new(&f);

        let x = optimize(&f, optimizer, dvector![1.0, 1.0], 2.0, 1000, 1e-10).unwrap();

        assert_abs_diff_eq!(x[0], 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(x[1], -1.0, epsilon = 1e-3);
    }

    #[test]
    fn balanced_coefficients() {
        let f = Sphere::new(4);

        let mut options = NelderMeadOptions::default();
        options.set_family(CoefficientsFamily::Balanced);
        let optimizer = NelderMead::with_options(&f, options);

        assert_abs_diff_eq!(optimizer.options().expansion_coeff(), 1.5);
        assert_abs_diff_eq!(optimizer.options().contraction_coeff(), 0.625);
        assert_abs_diff_eq!(optimizer.options().shrink_coeff(), 0.75);

        // Not defined for univariate problems.
        let f = Sphere::new(1);
        let mut options = NelderMeadOptions::default();
        options.set_family(CoefficientsFamily::Balanced);
        let optimizer = NelderMead::with_options(&f, options);

        assert_abs_diff_eq!(optimizer.options().shrink_coeff(), 0.5);
    }
}
