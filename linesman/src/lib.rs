//! Numerical building blocks for turning bookmaker lines into predictive distributions: overround
//! removal, robust cross-sample statistics, isotonic regression, monotone interpolation with inversion,
//! and the normal, lognormal and Poisson families used to extrapolate beyond the quoted lines.

pub mod file;
pub mod interp;
pub mod isotonic;
pub mod lognormal;
pub mod market;
pub mod normal;
pub mod opt;
pub mod poisson;
pub mod probs;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
