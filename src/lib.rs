//! fontreg: register font files in a per-user store, with a directory tree
//! whose checked state stays in sync with the store.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
