//! CLI command implementations.

pub mod common;
pub mod count;
pub mod generate;
pub mod init;
