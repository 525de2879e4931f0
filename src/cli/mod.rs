//! Command-line interface
//!
//! Handlers behind the `vault` binary. Each mutating command loads the
//! wallet snapshot, applies one operation and saves the result.

pub mod commands;

pub use commands::*;
