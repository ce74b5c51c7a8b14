//! Growable kernel buffer and type-erased dispatch ABI.
//!
//! This crate hosts the machinery that stores and invokes constructed
//! kernels. It is the designated `unsafe` crate of the workspace (along
//! with the kernel entry points in `weft-kernels`); every `unsafe` block
//! carries a `SAFETY:` comment.
//!
//! # Architecture
//!
//! ```text
//! KernelBuilder (owning byte region, inline or heap)
//! ├── Frame<P> at offset 0 (the root kernel)
//! │   ├── KernelPrefix (entry fn pointer + nullable destructor)
//! │   └── payload P (captured state)
//! ├── Frame<Q> at a child offset (optional, chained)
//! │   └── ...
//! └── zeroed tail (uncommitted bytes are always zero)
//! ```
//!
//! A frame's prefix is two pointer-sized fields: the entry point and a
//! destructor. Dispatch reads the prefix; there is no trait object and
//! no inheritance. Composite kernels reference their children by byte
//! offsets relative to their own frame, never by absolute address, so a
//! whole chain survives buffer reallocation intact.
//!
//! # Resource safety
//!
//! All bytes beyond the committed region are zero, and a zeroed prefix
//! is a no-op to destroy. If construction is interrupted after some
//! frames were written, the destructor chain rooted at offset 0 still
//! reaches exactly the frames that exist, and each destructor runs at
//! most once — on [`KernelBuilder::reset`] or on drop, whichever comes
//! first.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod adapt;
pub mod builder;
pub mod invoke;
pub mod prefix;

// Public re-exports for the primary API surface.
pub use adapt::{push_strided_over_single, StridedOverSingle};
pub use builder::{KernelBuilder, INLINE_CAPACITY, MAX_FRAME_ALIGN};
pub use invoke::{ExprSingleKernel, ExprStridedKernel, UnarySingleKernel, UnaryStridedKernel};
pub use prefix::{
    DestructorFn, Entry, ExprSingleFn, ExprStridedFn, Frame, KernelPrefix, UnarySingleFn,
    UnaryStridedFn,
};
