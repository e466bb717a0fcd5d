//! Shared utility functions.
//!
//! This module contains reusable utilities used across the codebase:
//! - `lines`: ordered, case-insensitive line deduplication

mod lines;

pub use lines::UniqueLines;
