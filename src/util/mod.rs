//! Utility types and functions

pub mod config;
pub mod diagnostic;
pub mod io;
pub mod logger;
pub mod span;
