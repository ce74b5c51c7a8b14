//! Typed retrieval and invocation of constructed kernels.
//!
//! Once a kernel has been instantiated, the builder hands back a
//! borrow-scoped handle matching the shape it was built for. Requesting
//! any other shape is a contract violation and panics — the stored
//! entry pointer would be called with the wrong signature otherwise.
//!
//! Invocation is synchronous and runs to completion; handles borrow the
//! builder shared, so a reentrant kernel may be called concurrently on
//! independent data while the builder itself stays single-owner.

use weft_core::EntryShape;

use crate::builder::KernelBuilder;
use crate::prefix::{ExprSingleFn, ExprStridedFn, KernelPrefix, UnarySingleFn, UnaryStridedFn};

impl KernelBuilder {
    /// Retrieve the root kernel as a unary single-element callable.
    ///
    /// # Panics
    ///
    /// Panics if no kernel has been constructed or the root frame was
    /// built for a different shape.
    pub fn unary_single(&self) -> UnarySingleKernel<'_> {
        UnarySingleKernel {
            prefix: self.require_shape(EntryShape::UnarySingle),
        }
    }

    /// Retrieve the root kernel as a unary strided callable.
    ///
    /// # Panics
    ///
    /// Panics on an empty builder or a shape mismatch.
    pub fn unary_strided(&self) -> UnaryStridedKernel<'_> {
        UnaryStridedKernel {
            prefix: self.require_shape(EntryShape::UnaryStrided),
        }
    }

    /// Retrieve the root kernel as an expression single-element
    /// callable.
    ///
    /// # Panics
    ///
    /// Panics on an empty builder or a shape mismatch.
    pub fn expr_single(&self) -> ExprSingleKernel<'_> {
        ExprSingleKernel {
            prefix: self.require_shape(EntryShape::ExprSingle),
        }
    }

    /// Retrieve the root kernel as an expression strided callable.
    ///
    /// # Panics
    ///
    /// Panics on an empty builder or a shape mismatch.
    pub fn expr_strided(&self) -> ExprStridedKernel<'_> {
        ExprStridedKernel {
            prefix: self.require_shape(EntryShape::ExprStrided),
        }
    }
}

/// A constructed kernel invocable one element at a time, one source.
pub struct UnarySingleKernel<'a> {
    pub(crate) prefix: &'a KernelPrefix,
}

impl UnarySingleKernel<'_> {
    /// Invoke the kernel on one destination and one source location.
    ///
    /// # Safety
    ///
    /// `dst` must be writable and `src` readable for the element sizes
    /// the kernel was constructed for; neither needs alignment.
    pub unsafe fn call(&self, dst: *mut u8, src: *const u8) {
        // SAFETY: the shape check at retrieval guarantees the stored
        // entry has this signature.
        let f: UnarySingleFn = unsafe { self.prefix.function() };
        // SAFETY: operand validity is the caller's contract.
        unsafe { f(dst, src, self.prefix) };
    }
}

/// A constructed kernel invocable over a strided run, one source.
pub struct UnaryStridedKernel<'a> {
    pub(crate) prefix: &'a KernelPrefix,
}

impl UnaryStridedKernel<'_> {
    /// Invoke the kernel over `count` elements with byte strides.
    ///
    /// # Safety
    ///
    /// `dst` and `src` must be valid for `count` elements at their
    /// respective strides; alignment is not required.
    pub unsafe fn call(
        &self,
        dst: *mut u8,
        dst_stride: isize,
        src: *const u8,
        src_stride: isize,
        count: usize,
    ) {
        // SAFETY: shape checked at retrieval.
        let f: UnaryStridedFn = unsafe { self.prefix.function() };
        // SAFETY: operand validity is the caller's contract.
        unsafe { f(dst, dst_stride, src, src_stride, count, self.prefix) };
    }
}

/// A constructed generalized-arity kernel, one element per call.
pub struct ExprSingleKernel<'a> {
    pub(crate) prefix: &'a KernelPrefix,
}

impl ExprSingleKernel<'_> {
    /// Invoke the kernel on one destination and `src` source locations.
    ///
    /// # Safety
    ///
    /// `src` must hold at least as many readable locations as the
    /// kernel's arity, and `dst` must be writable for the destination
    /// element size.
    pub unsafe fn call(&self, dst: *mut u8, src: &[*const u8]) {
        // SAFETY: shape checked at retrieval.
        let f: ExprSingleFn = unsafe { self.prefix.function() };
        // SAFETY: operand validity is the caller's contract.
        unsafe { f(dst, src.as_ptr(), self.prefix) };
    }
}

/// A constructed generalized-arity kernel over a strided run.
pub struct ExprStridedKernel<'a> {
    pub(crate) prefix: &'a KernelPrefix,
}

impl ExprStridedKernel<'_> {
    /// Invoke the kernel over `count` elements.
    ///
    /// # Safety
    ///
    /// `src` and `src_strides` must each hold at least the kernel's
    /// arity entries; every location must be valid for `count` elements
    /// at its stride.
    pub unsafe fn call(
        &self,
        dst: *mut u8,
        dst_stride: isize,
        src: &[*const u8],
        src_strides: &[isize],
        count: usize,
    ) {
        // SAFETY: shape checked at retrieval.
        let f: ExprStridedFn = unsafe { self.prefix.function() };
        // SAFETY: operand validity is the caller's contract.
        unsafe {
            f(
                dst,
                dst_stride,
                src.as_ptr(),
                src_strides.as_ptr(),
                count,
                self.prefix,
            )
        };
    }
}
