//! Runtime stub selection for native targets.
//!
//! Choosing the stub is a two-stage decision. [`edition`] picks the
//! smallest edition that ships every required extension, and [`stub`]
//! finds or downloads the matching prebuilt file. A custom stub on the
//! target skips both. [`libraries`] finds the companion libraries
//! shipped next to the executable.

pub mod edition;
pub mod libraries;
pub mod stub;

pub use edition::{Edition, is_known_extension, required_extensions, select_edition};
pub use libraries::{all_libraries, libraries_for};
pub use stub::{ResolveStub, StubSource, stub_filename};
