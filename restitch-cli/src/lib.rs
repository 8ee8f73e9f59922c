//! Library target for the `restitch` package.
//!
//! The primary deliverable of this package is the `restitch` CLI binary
//! (`src/main.rs`). This library exists so CI can run `cargo test -p restitch --doc`
//! for feature/doctype validation.

#[doc(hidden)]
pub use restitch_engine;
