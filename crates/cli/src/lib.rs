//! ProtoGraph CLI library
//!
//! Subcommand implementations, kept out of `main.rs` so they can be tested.

pub mod commands;
