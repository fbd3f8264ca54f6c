//! CLI commands

pub mod check;
pub mod config;
pub mod show;
