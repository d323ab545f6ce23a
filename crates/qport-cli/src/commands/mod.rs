//! CLI command implementations.

pub mod cancel;
pub mod common;
pub mod compile;
pub mod config;
pub mod convert;
pub mod devices;
pub mod result;
pub mod status;
pub mod submit;
