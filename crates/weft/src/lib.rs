//! Weft: type-erased computation kernel construction and dispatch.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Weft sub-crates. For most users, adding `weft` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use weft::prelude::*;
//! use weft::kernels::scalars;
//!
//! // Build a kernel that assigns int64 elements to float32 cells.
//! let factory =
//!     AssignmentKernelFactory::new(scalars::float32(), scalars::int64()).unwrap();
//! let mut ckb = KernelBuilder::new();
//! factory
//!     .instantiate(&mut ckb, 0, &[ArgMetadata::NONE; 2], KernelRequest::Single)
//!     .unwrap();
//!
//! let src: i64 = 1234;
//! let mut dst: f32 = 0.0;
//! // SAFETY: one readable i64 cell, one writable f32 cell.
//! unsafe {
//!     ckb.unary_single().call(
//!         &mut dst as *mut f32 as *mut u8,
//!         &src as *const i64 as *const u8,
//!     );
//! }
//! assert_eq!(dst, 1234.0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `weft-core` | Type handles, requests, metadata, errors |
//! | [`buffer`] | `weft-buffer` | Kernel prefix ABI, builder, chain adaptor |
//! | [`factory`] | `weft-factory` | The deferred factory trait |
//! | [`kernels`] | `weft-kernels` | Builtin assignment and elementwise factories |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, requests, and errors (`weft-core`).
///
/// Contains [`types::TypeHandle`], [`types::KernelRequest`],
/// [`types::ArgMetadata`], and [`types::BuildError`].
pub use weft_core as types;

/// Kernel storage and the invocation ABI (`weft-buffer`).
///
/// [`buffer::KernelBuilder`] owns the frames; the typed accessors
/// ([`buffer::KernelBuilder::unary_single`] and friends) are the
/// invocation surface.
pub use weft_buffer as buffer;

/// The deferred factory trait (`weft-factory`).
///
/// [`factory::KernelFactory`] is the main extension point for
/// user-defined kernel construction.
pub use weft_factory as factory;

/// Builtin kernel factories (`weft-kernels`).
///
/// [`kernels::AssignmentKernelFactory`] for type conversion,
/// [`kernels::ElementwiseKernelFactory`] for wrapping external loops,
/// and the well-known scalar handles in [`kernels::scalars`].
pub use weft_kernels as kernels;

/// Common imports for typical Weft usage.
///
/// ```rust
/// use weft::prelude::*;
/// ```
///
/// This imports the most frequently used types: the builder, requests,
/// metadata, the factory trait, and the builtin factories.
pub mod prelude {
    // Core types
    pub use weft_core::{ArgMetadata, BuildError, EntryShape, KernelRequest, TypeHandle, TypeKey};

    // Storage and invocation
    pub use weft_buffer::{KernelBuilder, KernelPrefix};

    // Factory trait
    pub use weft_factory::KernelFactory;

    // Builtin factories
    pub use weft_kernels::{
        build_assignment_kernel, AssignmentKernelFactory, ElementwiseKernelFactory, ElementwiseOp,
    };
}
