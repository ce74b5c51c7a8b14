//! End-to-end text-to-float assignment through the chain adaptor.
//!
//! Strided parsing is the one builtin path that constructs a composite
//! kernel: an adaptor frame looping a single-element parse child. These
//! tests drive it through the public assignment surface only.

use weft_buffer::KernelBuilder;
use weft_core::{ArgMetadata, KernelRequest};
use weft_factory::KernelFactory;
use weft_kernels::{build_assignment_kernel, scalars, AssignmentKernelFactory};
use weft_test_utils::fixed_text;

const WIDTH: usize = 15;

#[test]
fn strided_text_to_float32_parses_a_packed_column() {
    let mut ckb = KernelBuilder::new();
    build_assignment_kernel(
        &mut ckb,
        0,
        &scalars::float32(),
        &scalars::fixed_text(WIDTH as u32),
        KernelRequest::Strided,
    )
    .unwrap();

    let src = fixed_text(WIDTH, &["3.25", "-1000", "1e5"]);
    let mut dst: [f32; 3] = [0.0; 3];
    // SAFETY: src holds 3 fields of WIDTH bytes, dst 3 f32 cells.
    unsafe {
        ckb.unary_strided().call(
            dst.as_mut_ptr() as *mut u8,
            4,
            src.as_ptr(),
            WIDTH as isize,
            3,
        );
    }
    assert_eq!(dst, [3.25, -1000.0, 1e5]);
}

#[test]
fn single_text_to_float64_is_one_leaf_frame() {
    let mut ckb = KernelBuilder::new();
    build_assignment_kernel(
        &mut ckb,
        0,
        &scalars::float64(),
        &scalars::fixed_text(WIDTH as u32),
        KernelRequest::Single,
    )
    .unwrap();

    let src = fixed_text(WIDTH, &["2.5e-3"]);
    let mut dst: f64 = 0.0;
    // SAFETY: one WIDTH-byte field, one f64 cell.
    unsafe {
        ckb.unary_single()
            .call(&mut dst as *mut f64 as *mut u8, src.as_ptr());
    }
    assert_eq!(dst, 2.5e-3);
    assert!(ckb.is_inline());
}

#[test]
fn factory_rebuilds_the_composite_after_reset() {
    let factory = AssignmentKernelFactory::new(
        scalars::float64(),
        scalars::fixed_text(WIDTH as u32),
    )
    .unwrap();
    let meta = [ArgMetadata::NONE; 2];
    let mut ckb = KernelBuilder::new();

    for round in 0..3 {
        factory
            .instantiate(&mut ckb, 0, &meta, KernelRequest::Strided)
            .unwrap();
        let values = ["0", "42", "-1.5"];
        let src = fixed_text(WIDTH, &values);
        let mut dst: [f64; 3] = [f64::from(round); 3];
        // SAFETY: 3 fields, 3 f64 cells.
        unsafe {
            ckb.unary_strided().call(
                dst.as_mut_ptr() as *mut u8,
                8,
                src.as_ptr(),
                WIDTH as isize,
                3,
            );
        }
        assert_eq!(dst, [0.0, 42.0, -1.5]);
        ckb.reset();
    }
}

#[test]
fn unparseable_fields_quietly_become_nan() {
    let mut ckb = KernelBuilder::new();
    build_assignment_kernel(
        &mut ckb,
        0,
        &scalars::float32(),
        &scalars::fixed_text(WIDTH as u32),
        KernelRequest::Strided,
    )
    .unwrap();

    let src = fixed_text(WIDTH, &["1.5", "not a number", "2.5"]);
    let mut dst: [f32; 3] = [0.0; 3];
    // SAFETY: 3 fields, 3 f32 cells.
    unsafe {
        ckb.unary_strided().call(
            dst.as_mut_ptr() as *mut u8,
            4,
            src.as_ptr(),
            WIDTH as isize,
            3,
        );
    }
    assert_eq!(dst[0], 1.5);
    assert!(dst[1].is_nan());
    assert_eq!(dst[2], 2.5);
}
