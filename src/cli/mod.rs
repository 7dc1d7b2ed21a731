//! CLI module for the mdnotes application
//!
//! This module handles the command-line interface for interacting with the
//! note store.
mod app;
mod args;

pub use app::App;
pub use args::Cli;
