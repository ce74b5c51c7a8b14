//! Deferred kernel factories and the instantiation protocol.
//!
//! A deferred kernel factory is a reusable, buffer-independent
//! description of how to build a kernel (or kernel chain) into a
//! [`KernelBuilder`](weft_buffer::KernelBuilder) at a given byte
//! offset. Factories are created once — from a type-system lookup or by
//! wrapping an external operation — and instantiate any number of
//! times into any number of buffers; they never hold buffer memory.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod factory;

pub use factory::{check_metadata, KernelFactory};
