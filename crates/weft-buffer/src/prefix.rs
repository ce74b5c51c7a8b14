//! The fixed-layout frame header and entry-point ABI.
//!
//! Every kernel frame begins with a [`KernelPrefix`]: an entry-point
//! pointer and a nullable destructor pointer, one machine pointer each,
//! in that order. The entry pointer is type-erased; its real signature
//! is one of the four shapes in [`EntryShape`], and the builder records
//! which one the root frame was built for so retrieval can fail fast on
//! a convention mismatch.
//!
//! Entry points receive the address of their own prefix as their last
//! argument and recover their captured state by casting it back to the
//! [`Frame`] type they were constructed with.

use std::mem;
use std::ptr;

use weft_core::EntryShape;

/// Destructor for a constructed frame.
///
/// Receives the frame's own prefix. Composite frames destroy their
/// children from here; the buffer only ever invokes the root.
pub type DestructorFn = unsafe extern "C" fn(kernel: *mut KernelPrefix);

/// Entry point: one destination, one source, one element.
pub type UnarySingleFn =
    unsafe extern "C" fn(dst: *mut u8, src: *const u8, kernel: *const KernelPrefix);

/// Entry point: one destination and one source, each with a byte
/// stride, over `count` elements.
pub type UnaryStridedFn = unsafe extern "C" fn(
    dst: *mut u8,
    dst_stride: isize,
    src: *const u8,
    src_stride: isize,
    count: usize,
    kernel: *const KernelPrefix,
);

/// Entry point: one destination and an array of source locations whose
/// length is the constructed kernel's arity, one element.
pub type ExprSingleFn =
    unsafe extern "C" fn(dst: *mut u8, src: *const *const u8, kernel: *const KernelPrefix);

/// Entry point: generalized arity with per-source byte strides, over
/// `count` elements.
pub type ExprStridedFn = unsafe extern "C" fn(
    dst: *mut u8,
    dst_stride: isize,
    src: *const *const u8,
    src_strides: *const isize,
    count: usize,
    kernel: *const KernelPrefix,
);

/// The fixed-layout header every kernel frame begins with.
///
/// Two pointer-sized fields: the type-erased entry point, then the
/// destructor (`None` means trivial — nothing to clean up). An
/// all-zero-bytes prefix is a valid value with a null entry and no
/// destructor, which is what makes uncommitted buffer regions safe to
/// destroy.
#[repr(C)]
pub struct KernelPrefix {
    function: *const (),
    destructor: Option<DestructorFn>,
}

// Layout contract: exactly two machine pointers, entry first.
const _: () = assert!(mem::size_of::<KernelPrefix>() == 2 * mem::size_of::<*const ()>());

impl KernelPrefix {
    pub(crate) fn new(function: *const (), destructor: Option<DestructorFn>) -> Self {
        Self {
            function,
            destructor,
        }
    }

    /// Read the entry point as a concrete function-pointer type.
    ///
    /// # Safety
    ///
    /// `F` must be the exact function-pointer type this frame was
    /// constructed with, and the frame must actually have been
    /// constructed (a zeroed prefix holds a null entry, which is not a
    /// valid function pointer).
    pub unsafe fn function<F: Copy>(&self) -> F {
        const { assert!(mem::size_of::<F>() == mem::size_of::<*const ()>()) };
        // SAFETY: caller guarantees F is the constructed fn-pointer type.
        unsafe { mem::transmute_copy(&self.function) }
    }

    /// Whether this frame has no destructor.
    pub fn is_trivial(&self) -> bool {
        self.destructor.is_none()
    }

    /// Run the frame's destructor, if any.
    ///
    /// A zeroed or trivially-constructed prefix is a no-op. The buffer
    /// calls this exactly once per chain root; composite frames call it
    /// on their children from their own destructors.
    ///
    /// # Safety
    ///
    /// `kernel` must point to a prefix that is either constructed or
    /// entirely zeroed, and whose destructor has not already run.
    pub unsafe fn destroy(kernel: *mut KernelPrefix) {
        // SAFETY: per this function's contract the pointee is readable.
        if let Some(destructor) = unsafe { (*kernel).destructor } {
            // SAFETY: a non-null destructor was installed at
            // construction together with the frame it expects.
            unsafe { destructor(kernel) };
        }
    }
}

/// A typed entry point paired with the shape it implements.
///
/// The four constructors are the only way to build one, so the shape
/// tag and the function signature cannot disagree.
#[derive(Clone, Copy, Debug)]
pub struct Entry {
    shape: EntryShape,
    function: *const (),
}

impl Entry {
    /// Entry implementing the unary single shape.
    pub fn unary_single(f: UnarySingleFn) -> Self {
        Self {
            shape: EntryShape::UnarySingle,
            function: f as *const (),
        }
    }

    /// Entry implementing the unary strided shape.
    pub fn unary_strided(f: UnaryStridedFn) -> Self {
        Self {
            shape: EntryShape::UnaryStrided,
            function: f as *const (),
        }
    }

    /// Entry implementing the expression single shape.
    pub fn expr_single(f: ExprSingleFn) -> Self {
        Self {
            shape: EntryShape::ExprSingle,
            function: f as *const (),
        }
    }

    /// Entry implementing the expression strided shape.
    pub fn expr_strided(f: ExprStridedFn) -> Self {
        Self {
            shape: EntryShape::ExprStrided,
            function: f as *const (),
        }
    }

    /// The shape this entry implements.
    pub fn shape(&self) -> EntryShape {
        self.shape
    }

    pub(crate) fn function(&self) -> *const () {
        self.function
    }
}

/// A complete kernel frame: prefix followed by captured state.
///
/// Frames must be position-independent — the buffer may reallocate and
/// move them wholesale. Payloads therefore never store absolute
/// addresses into the buffer; children are referenced by byte offsets
/// relative to the frame's own prefix.
#[repr(C)]
pub struct Frame<P> {
    prefix: KernelPrefix,
    payload: P,
}

impl<P> Frame<P> {
    pub(crate) fn new(prefix: KernelPrefix, payload: P) -> Self {
        Self { prefix, payload }
    }

    /// Recover a frame reference from the prefix pointer an entry point
    /// or destructor received.
    ///
    /// # Safety
    ///
    /// `kernel` must point to the prefix of a constructed `Frame<P>`
    /// with exactly this payload type, and the frame must outlive `'a`.
    pub unsafe fn from_prefix<'a>(kernel: *const KernelPrefix) -> &'a Self {
        // SAFETY: the prefix is the first field of a repr(C) Frame<P>,
        // so the frame address equals the prefix address.
        unsafe { &*(kernel as *const Self) }
    }

    /// The frame's header.
    pub fn prefix(&self) -> &KernelPrefix {
        &self.prefix
    }

    /// The frame's captured state.
    pub fn payload(&self) -> &P {
        &self.payload
    }
}

/// Destructor shim installed for payloads that need dropping.
///
/// # Safety
///
/// `kernel` must point to the prefix of a constructed `Frame<P>` whose
/// payload has not already been dropped.
pub(crate) unsafe extern "C" fn drop_frame_payload<P>(kernel: *mut KernelPrefix) {
    // SAFETY: prefix address equals frame address (repr(C), first
    // field); the payload sits behind it and is still live.
    unsafe { ptr::drop_in_place(&mut (*(kernel as *mut Frame<P>)).payload) };
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn nop_single(_dst: *mut u8, _src: *const u8, _kernel: *const KernelPrefix) {}

    #[test]
    fn entry_constructors_tag_the_shape() {
        let e = Entry::unary_single(nop_single);
        assert_eq!(e.shape(), EntryShape::UnarySingle);
        assert!(!e.function().is_null());
    }

    #[test]
    fn zeroed_prefix_is_trivial_and_destroyable() {
        let mut prefix = KernelPrefix::new(std::ptr::null(), None);
        assert!(prefix.is_trivial());
        // SAFETY: zeroed-equivalent prefix; destroy is a no-op.
        unsafe { KernelPrefix::destroy(&mut prefix) };
    }

    #[test]
    fn prefix_is_two_pointers() {
        assert_eq!(
            mem::size_of::<KernelPrefix>(),
            2 * mem::size_of::<*const ()>()
        );
        assert_eq!(mem::align_of::<KernelPrefix>(), mem::align_of::<*const ()>());
    }
}
