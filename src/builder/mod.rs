//! Tree building
//!
//! Arranges a flat list of fixtures into nested namespace suites.

mod namespace;

pub use namespace::{namespace_of, NamespaceTreeBuilder};
