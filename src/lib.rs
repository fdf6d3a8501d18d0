//! ski - skill package installer
//!
//! Discovers reusable skill packages in a library tree, installs them into
//! per-agent directory conventions, and tracks installed state in a JSON
//! manifest to support update, status, and removal.

pub mod agent;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod query;
pub mod utils;

pub use error::{Result, SkiError};
