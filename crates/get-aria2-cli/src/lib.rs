//! Command line front end for `get-aria2`.
//!
//! Parses arguments, sets up logging, and pipes the extracted binary to a
//! file or standard output.

pub mod cli;
pub mod install;
pub mod tracing;
