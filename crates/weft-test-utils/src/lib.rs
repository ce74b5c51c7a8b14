//! Test fixtures and reference operations for Weft development.
//!
//! Provides a drop-counting payload for destructor-exactly-once
//! assertions, fixed-width text packing for parse-kernel scenarios, and
//! a reference elementwise loop matching the extern operation contract.
//! This crate deliberately depends on no other Weft crate so it can be
//! used from every crate's dev-dependencies.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A kernel payload that counts how many times it is dropped.
///
/// Push it into a frame, then assert through the paired [`DropCount`]
/// that the frame's destructor ran exactly once.
pub struct CountedDrop {
    count: Arc<AtomicUsize>,
}

impl CountedDrop {
    /// Create a payload and the handle that observes its drops.
    pub fn new() -> (Self, DropCount) {
        let count = Arc::new(AtomicUsize::new(0));
        (
            Self {
                count: Arc::clone(&count),
            },
            DropCount(count),
        )
    }
}

impl Drop for CountedDrop {
    fn drop(&mut self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Observer half of [`CountedDrop`].
#[derive(Clone)]
pub struct DropCount(Arc<AtomicUsize>);

impl DropCount {
    /// Number of times the paired payload has been dropped.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pack strings into a contiguous fixed-width, NUL-padded byte array.
///
/// # Panics
///
/// Panics if any value exceeds `width` bytes.
pub fn fixed_text(width: usize, values: &[&str]) -> Vec<u8> {
    let mut out = vec![0u8; width * values.len()];
    for (i, v) in values.iter().enumerate() {
        assert!(v.len() <= width, "value '{v}' exceeds width {width}");
        out[i * width..i * width + v.len()].copy_from_slice(v.as_bytes());
    }
    out
}

/// Reference elementwise loop: 32-bit integer addition, two sources.
///
/// Matches the extern operation contract: `args` holds the destination
/// location first and then the sources, `strides` gives one byte stride
/// per argument in the same order.
///
/// # Safety
///
/// `args` and `strides` must hold three entries each, and every
/// location must be valid for `count` i32 elements at its stride.
pub unsafe extern "C" fn int32_add_loop(
    args: *const *mut u8,
    strides: *const isize,
    count: usize,
) {
    // SAFETY: per this function's contract.
    unsafe {
        let dst = *args;
        let a = *args.add(1);
        let b = *args.add(2);
        let dst_stride = *strides;
        let a_stride = *strides.add(1);
        let b_stride = *strides.add(2);
        for i in 0..count as isize {
            let x = ptr::read_unaligned(a.offset(a_stride * i) as *const i32);
            let y = ptr::read_unaligned(b.offset(b_stride * i) as *const i32);
            ptr::write_unaligned(dst.offset(dst_stride * i) as *mut i32, x + y);
        }
    }
}
