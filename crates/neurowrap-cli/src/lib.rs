//! Neurowrap CLI library.
//!
//! Input loading and the command implementations behind the `neurowrap`
//! binary. Commands only render and predict; nothing is executed.

pub mod commands;
pub mod input;
pub mod logging;
