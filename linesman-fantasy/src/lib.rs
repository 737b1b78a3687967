//! Fantasy-football point ranges from sportsbook player props.
//!
//! Quotes are de-vigged per book, combined into a consensus line, fitted to a per-stat distribution
//! and finally scored under a league's rules into a floor, a mid and a ceiling per player.

pub mod config;
pub mod consensus;
pub mod data;
pub mod devig;
pub mod distribution;
pub mod domain;
pub mod lines;
pub mod print;
pub mod projection;
pub mod quantiles;
pub mod scoring;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
