//! Utilities.

pub mod conf;
pub mod init;
pub mod path;
