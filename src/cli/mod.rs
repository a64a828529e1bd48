//! Command-line interface
//!
//! Argument definitions and command handlers for the `posterquiz` binary.

pub mod args;
pub mod commands;
