//! Utility functions for nodelink binaries

pub mod config;
pub mod env_var;
pub mod observability;

pub use env_var::*;
