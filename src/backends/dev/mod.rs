//! Interactive development surface
//!
//! - [`repl::Repl`] - statement accumulator and dispatch loop
//! - [`repl::LineSource`] - where physical lines come from

pub mod repl;

pub use repl::{Repl, SessionEnd};
