//! Core vocabulary types for the Weft kernel construction framework.
//!
//! Weft builds type-erased computation kernels into growable owning
//! buffers and dispatches them through a fixed function-pointer ABI.
//! This crate holds the shared vocabulary used by every other crate:
//! calling-convention selectors, entry-point shapes, the error taxonomy,
//! opaque type handles, and instantiation metadata. It contains no
//! buffer machinery and no `unsafe` code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod metadata;
pub mod request;
pub mod types;

// Public re-exports for the primary API surface.
pub use error::BuildError;
pub use metadata::ArgMetadata;
pub use request::{EntryShape, KernelRequest};
pub use types::{TypeHandle, TypeKey};
