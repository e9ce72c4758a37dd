//! Core abstractions and types for optimex.
//!
//! *Users* are mainly interested in the [`Function`] trait, which is what an
//! [`Optimizer`] minimizes. The expression compiler produces a
//! [`CompiledExpression`](crate::expr::CompiledExpression) that implements
//! it, but any type can be plugged in.
//!
//! Algorithm *developers* are interested in implementing the [`Optimizer`]
//! trait.

mod base;
mod function;
mod optimizer;

pub use base::*;
pub use function::*;
pub use optimizer::*;
