//! Utility modules for common functionality.
//!
//! Currently just logging configuration for the binary.

pub mod logger;
