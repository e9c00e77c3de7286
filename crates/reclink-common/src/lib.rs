//! Reclink Common Library
//!
//! Shared types, logging, and error handling for the reclink workspace.
//!
//! # Overview
//!
//! This crate provides the pieces both the worker and any future surface
//! share:
//!
//! - **Error Handling**: the `LinkError` enum and `Result` alias
//! - **Logging**: tracing subscriber setup driven by `LogConfig`
//! - **Record Model**: the bibliographic record with its two equality
//!   relations (structural and full)
//! - **Types**: job lifecycle, filter specifications, and link data

pub mod error;
pub mod logging;
pub mod record;
pub mod types;

// Re-export commonly used types
pub use error::{LinkError, Result};
pub use record::{DataField, Record, Subfield};
pub use types::{Edit, FilterSpec, Job, JobConfig, JobState, LinkData, Selector};
