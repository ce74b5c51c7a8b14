//! Opaque per-argument instantiation metadata.
//!
//! Factories receive one [`ArgMetadata`] per operand (destination first,
//! then sources) when instantiating a kernel. The pointee layout is the
//! factory's business — dimension descriptors, stride tables, whatever
//! its operand types require — and is defined by the type-system
//! collaborator, never by the kernel buffer. The buffer and factory
//! layers validate metadata by count only.

use std::fmt;
use std::ptr;

/// One opaque metadata descriptor for one kernel operand.
///
/// Types whose `metadata_size()` is zero take [`ArgMetadata::NONE`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ArgMetadata(*const u8);

impl ArgMetadata {
    /// The empty descriptor, for operand types that require no metadata.
    pub const NONE: ArgMetadata = ArgMetadata(ptr::null());

    /// Wrap a raw descriptor pointer.
    ///
    /// The pointee must stay valid for the duration of the
    /// `instantiate` call it is passed to; factories may read it during
    /// construction but never retain it.
    pub fn new(ptr: *const u8) -> Self {
        Self(ptr)
    }

    /// The raw descriptor pointer (null for [`ArgMetadata::NONE`]).
    pub fn as_ptr(&self) -> *const u8 {
        self.0
    }

    /// Whether this is the empty descriptor.
    pub fn is_none(&self) -> bool {
        self.0.is_null()
    }
}

impl fmt::Debug for ArgMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "ArgMetadata::NONE")
        } else {
            write!(f, "ArgMetadata({:p})", self.0)
        }
    }
}
