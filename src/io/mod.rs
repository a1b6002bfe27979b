//! File-system access and session persistence

pub mod fs;
pub mod session;
