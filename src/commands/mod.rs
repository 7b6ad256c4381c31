//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `pack-sync` command-line tool, one file per subcommand.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `pack_sync` library.

pub mod completions;
pub mod download;
pub mod index;
