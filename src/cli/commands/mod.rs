//! Command implementations

pub mod bin;
pub mod completions;
pub mod init;
pub mod sync;
pub mod wish;
