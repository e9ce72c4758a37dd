#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![warn(missing_docs)]

//! # Optimex
//!
//! Derivative-free minimization of multivariate functions given as text.
//!
//! A caller submits a function such as `x1^2 + (x2 - 3)^2`, a convergence
//! tolerance and an iteration budget. The library compiles the text into an
//! evaluable objective and minimizes it with the [Nelder-Mead simplex
//! method](algo::nelder_mead), returning the minimizing assignment of
//! variables together with the function value.
//!
//! ## Quick start
//!
//! ```rust
//! use optimex::optimize;
//!
//! let result = optimize("x1^2 + (x2 - 3)^2", 1e-9, 1000).unwrap();
//!
//! for variable in &result.variables {
//!     println!("{} = {}", variable.name, variable.value);
//! }
//!
//! assert!(result.function_value < 1e-6);
//! ```
//!
//! Errors are classified by [`ErrorKind`] so that transport layers can map
//! them to their own status codes.
//!
//! ```rust
//! use optimex::{optimize, ErrorKind};
//!
//! let error = optimize("x1 + (x2", 1e-6, 100).unwrap_err();
//! assert_eq!(error.kind(), ErrorKind::InvalidInput);
//!
//! let error = optimize("x1^2 + x2^2", 1e-6, 1).unwrap_err();
//! assert_eq!(error.kind(), ErrorKind::NotConverged);
//! ```
//!
//! ## Function text
//!
//! Variables are named `x1`, `x2`, ... and may appear in any order. The
//! supported operators are `+`, `-`, `*`, `/` and `^`, all binary and
//! left-associative, with the usual precedence. Whitespace is ignored and the
//! text is case-insensitive. See [`expr`] for details.
//!
//! ## Lower-level API
//!
//! Any type implementing [`Function`] can be minimized with the
//! [`OptimizerDriver`], which gives full control over the iteration process.
//!
//! ```rust
//! use optimex::nalgebra as na;
//! use optimex::{Function, OptimizerDriver, Problem, ProblemError};
//! use na::{Dyn, IsContiguous};
//!
//! struct Himmelblau;
//!
//! impl Problem for Himmelblau {
//!     type Field = f64;
//!
//!     fn dim(&self) -> usize {
//!         2
//!     }
//! }
//!
//! impl Function for Himmelblau {
//!     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Result<Self::Field, ProblemError>
//!     where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!     {
//!         Ok((x[0].powi(2) + x[1] - 11.0).powi(2) + (x[0] + x[1].powi(2) - 7.0).powi(2))
//!     }
//! }
//!
//! let f = Himmelblau;
//! let mut optimizer = OptimizerDriver::builder(&f)
//!     .with_initial(vec![-1.0, 2.0])
//!     .build();
//!
//! let (x, value) = optimizer
//!     .find(|state| {
//!         println!("iter = {}\tfx = {}\tx = {:?}", state.iter(), state.fx(), state.x());
//!         state.spread() <= 1e-12 || state.iter() >= 1000
//!     })
//!     .expect("optimizer encountered an error");
//!
//! assert!(value < 1e-6);
//! ```
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
mod core;
pub mod driver;
pub mod expr;
pub mod service;

pub use core::*;
pub use driver::OptimizerDriver;
pub use service::{
    optimize, ErrorKind, OptimizationError, OptimizationQuery, OptimizationResult, Optimizator,
    Service, ServiceOptions, Variable,
};

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
