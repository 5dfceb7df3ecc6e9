//! Embeddable core library for docufill.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking into a host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`DocumentStore`](ports::DocumentStore): open and persist document trees
//! - [`WritePort`](ports::WritePort): write summary artifacts
//!
//! The [`adapters`] module provides in-memory and filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_fill`](pipeline::run_fill): fill one document
//! - [`run_cleanup`](pipeline::run_cleanup): strip annotations and unwrap placeholders
//! - [`run_batch`](pipeline::run_batch): either of the above over many documents
//! - [`preview_fill`](pipeline::preview_fill): unified diff of a fill, nothing persisted

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the edit options so callers don't need docufill-edit directly.
pub use docufill_edit::{CancelToken, CleanupOptions, FillOptions};
pub use docufill_tree::DocTree;
