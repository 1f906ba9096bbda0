//! CLI command implementations

pub mod advance;
pub mod completions;
pub mod gate;
pub mod init;
pub mod metrics;
pub mod project;
pub mod solution;
pub mod status;
pub mod submit;
