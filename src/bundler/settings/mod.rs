//! Build configuration.
//!
//! This module provides the immutable [`Configuration`] value, the
//! [`BuildInclusion`] rules describing archive contents, platform and
//! architecture types, and the file loader that layers `kodegen.json`
//! over the built-in defaults.

mod arch;
mod core;
mod inclusion;
pub mod loader;
mod schema;

pub use arch::{Arch, Os};
pub use core::{Configuration, DEFAULT_BOX_VERSION, DEFAULT_STUB_BASE_URI};
pub use inclusion::{BuildInclusion, FinderRule};
pub use loader::{DEFAULT_CONFIG_FILE, ValidationReport, load};
pub use schema::configuration_schema;
