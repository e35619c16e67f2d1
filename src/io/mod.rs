//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `client` - HTTP client for the populartimes page, error classification
//! - `parser` - extraction and decoding of the embedded JSON blobs

pub mod client;
pub mod parser;

// Re-export commonly used types
pub use client::{ApiClient, ApiError, ErrorKind, SnapshotSource};
