//! The collection of implemented algorithms.

pub mod nelder_mead;

pub use nelder_mead::NelderMead;
