//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `check` command.
/// This command reports whether each given video contains audio.
pub mod check;

/// Module containing the implementation of the `tools` command.
pub mod tools;
