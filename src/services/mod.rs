//! Core services for pattern matching, classification, config conversion,
//! and wizard state

pub mod classify;
pub mod config;
pub mod facade;
pub mod pattern;
pub mod steps;
pub mod test_files;
