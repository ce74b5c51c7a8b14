//! Builtin kernel factories exercising the Weft instantiation protocol.
//!
//! Two factory families live here:
//!
//! - **Assignment** ([`assignment`]): type-conversion kernels between
//!   the builtin scalar types, looked up in a deterministic registry
//!   keyed by type-key pairs. Numeric pairs carry native single and
//!   strided entries; fixed-width text parsing is defined
//!   element-at-a-time and lowered to strided requests through the
//!   chain adaptor.
//! - **Elementwise** ([`elementwise`]): wrapping of externally supplied
//!   elementwise loops into expression-shaped kernels, including the
//!   process-wide exclusivity lock for operations that are not safe for
//!   concurrent execution.
//!
//! The well-known [`TypeHandle`](weft_core::TypeHandle) constructors
//! for the builtin scalars live in [`scalars`]. Kernel entry points in
//! this crate contain `unsafe` code (they are the invocation side of
//! the dispatch ABI); everything else is safe.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod assignment;
pub mod convert;
pub mod elementwise;
pub mod scalars;

// Public re-exports for the primary API surface.
pub use assignment::{build_assignment_kernel, AssignmentKernelFactory};
pub use elementwise::{ElementwiseKernelFactory, ElementwiseLoopFn, ElementwiseOp};
