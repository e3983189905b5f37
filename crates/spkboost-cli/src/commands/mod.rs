//! CLI command implementations.

pub mod calibrate;
pub mod common;
pub mod config;
pub mod log;
pub mod model;
pub mod modellog;
pub mod record;
