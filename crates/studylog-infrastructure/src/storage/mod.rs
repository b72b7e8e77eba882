//! Storage layer.
//!
//! `AtomicTomlFile` is the only component that touches the file system
//! directly; the repositories above it only deal in documents.

pub mod atomic_toml;

pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
