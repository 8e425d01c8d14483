// ABOUTME: Library root for gantry - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cloud;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod output;
pub mod provision;
pub mod types;
