pub mod branch_info;
pub mod clock;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod github;
pub mod manifest;
pub mod planner;
pub mod ui;
pub mod version_manager;
pub mod warning;

pub use error::{CdToolsError, Result};
