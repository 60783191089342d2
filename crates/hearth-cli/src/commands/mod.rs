//! Command implementations. Each command exposes an `execute` function.

pub mod serve;

pub use serve::execute as serve_execute;
