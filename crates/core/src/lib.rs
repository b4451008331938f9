//! Core types and host collaborators for usetofu.
//!
//! This crate holds everything the OpenTofu installation stages share:
//!
//! - [`Error`] / [`Result`] - the error taxonomy of a setup run
//! - [`config::SetupConfig`] - runtime configuration with defaults
//! - [`retry`] - exponential backoff for transient failures
//! - [`tools`] - platform detection, the tool cache and the search path
//!
//! The host environment (tool cache directory, `PATH`, platform) is never
//! touched directly by the stages. It is reached through the traits in
//! [`tools`] so that every stage can be exercised against in-memory fakes.

pub mod config;
mod error;
pub mod retry;
pub mod tools;

pub use error::{Error, Result};

/// Name under which OpenTofu is registered in the tool cache.
pub const TOOL_NAME: &str = "opentofu";
