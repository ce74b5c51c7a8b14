//! Chain adaptors between calling conventions.
//!
//! A composite frame stores the byte offset from its own prefix to a
//! child frame constructed immediately after it in the same buffer.
//! Relative offsets survive reallocation — the whole committed region
//! moves as one block — which is what lets chains be built across
//! growth boundaries.
//!
//! The one builtin adaptor lowers a single-element kernel to the unary
//! strided shape by looping over the child. Factories whose operation
//! is only defined element-at-a-time use it to satisfy strided
//! requests.

use std::mem;

use weft_core::BuildError;

use crate::builder::KernelBuilder;
use crate::prefix::{Entry, Frame, KernelPrefix, UnarySingleFn};

/// Payload of the strided-over-single adaptor frame.
///
/// Holds the relative offset of the child frame; its destructor
/// destroys the child, keeping the whole chain on a single destructor
/// path rooted at the buffer's first frame.
pub struct StridedOverSingle {
    /// Byte offset from this frame's prefix to the child's prefix.
    child_offset: usize,
}

impl Drop for StridedOverSingle {
    fn drop(&mut self) {
        // SAFETY: this payload lives inside a Frame in the kernel
        // buffer; the child prefix sits child_offset bytes after the
        // frame base and is either constructed or still zeroed (if
        // construction was interrupted), both safe to destroy. The
        // chain runs each destructor at most once.
        unsafe {
            let base = (self as *mut Self as *mut u8).sub(mem::size_of::<KernelPrefix>());
            KernelPrefix::destroy(base.add(self.child_offset) as *mut KernelPrefix);
        }
    }
}

/// Size in bytes of the adaptor frame.
fn adaptor_size() -> usize {
    mem::size_of::<Frame<StridedOverSingle>>()
}

/// Push a strided adaptor frame at `offset` and return the offset at
/// which the caller must construct the child single-element frame.
///
/// The adaptor's entry loops the child over the run; its destructor
/// destroys the child. The child must be constructed before the kernel
/// is invoked (an unconstructed child is safe to destroy but not to
/// call).
pub fn push_strided_over_single(
    ckb: &mut KernelBuilder,
    offset: usize,
) -> Result<usize, BuildError> {
    let child_offset = adaptor_size();
    let payload = StridedOverSingle { child_offset };
    // SAFETY: strided_over_single_entry interprets its kernel argument
    // as Frame<StridedOverSingle>, which is exactly what is pushed.
    let size = unsafe {
        ckb.push_frame(
            offset,
            Entry::unary_strided(strided_over_single_entry),
            payload,
            false,
        )?
    };
    Ok(offset + size)
}

unsafe extern "C" fn strided_over_single_entry(
    dst: *mut u8,
    dst_stride: isize,
    src: *const u8,
    src_stride: isize,
    count: usize,
    kernel: *const KernelPrefix,
) {
    // SAFETY: kernel points at the adaptor's own Frame; the child was
    // constructed at child_offset before invocation was permitted.
    unsafe {
        let frame = Frame::<StridedOverSingle>::from_prefix(kernel);
        let child = (kernel as *const u8).add(frame.payload().child_offset) as *const KernelPrefix;
        let single: UnarySingleFn = (*child).function();
        let mut dst = dst;
        let mut src = src;
        for _ in 0..count {
            single(dst, src, child);
            dst = dst.offset(dst_stride);
            src = src.offset(src_stride);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;
    use weft_test_utils::CountedDrop;

    unsafe extern "C" fn negate_single(dst: *mut u8, src: *const u8, _kernel: *const KernelPrefix) {
        // SAFETY: test passes valid i32 cells.
        unsafe {
            let v = ptr::read_unaligned(src as *const i32);
            ptr::write_unaligned(dst as *mut i32, -v);
        }
    }

    #[test]
    fn adaptor_loops_the_child_over_a_run() {
        let mut ckb = KernelBuilder::new();
        let child = push_strided_over_single(&mut ckb, 0).unwrap();
        // SAFETY: negate_single ignores its payload.
        unsafe {
            ckb.push_frame(child, Entry::unary_single(negate_single), (), true)
                .unwrap();
        }
        let src: [i32; 3] = [1, -2, 3];
        let mut dst: [i32; 3] = [0; 3];
        // SAFETY: cells valid for 3 elements at 4-byte strides.
        unsafe {
            ckb.unary_strided().call(
                dst.as_mut_ptr() as *mut u8,
                4,
                src.as_ptr() as *const u8,
                4,
                3,
            );
        }
        assert_eq!(dst, [-1, 2, -3]);
    }

    #[test]
    fn adaptor_destroys_its_child_exactly_once() {
        let (payload, count) = CountedDrop::new();
        {
            let mut ckb = KernelBuilder::new();
            let child = push_strided_over_single(&mut ckb, 0).unwrap();
            // SAFETY: negate_single ignores its payload.
            unsafe {
                ckb.push_frame(child, Entry::unary_single(negate_single), payload, true)
                    .unwrap();
            }
            assert_eq!(count.get(), 0);
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn interrupted_chain_is_safe_to_destroy() {
        let (_payload, count) = CountedDrop::new();
        {
            let mut ckb = KernelBuilder::new();
            // Adaptor pushed, child never constructed: the child region
            // is zeroed and its destroy must be a no-op.
            push_strided_over_single(&mut ckb, 0).unwrap();
        }
        assert_eq!(count.get(), 0);
    }
}
