//! Shared helpers for build tasks.

pub mod fs;
pub mod http;

pub use http::{Fetch, HttpFetcher};
