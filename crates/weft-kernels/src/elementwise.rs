//! Wrapping externally supplied elementwise loops into kernels.
//!
//! The numeric/array collaborator hands over a raw loop function, the
//! operand type handles (destination first), and two capability flags:
//! whether the loop tolerates arbitrary strides, and whether it is safe
//! for concurrent execution. The factory turns that into expression-
//! shaped kernels — generalized arity, so a frame captures the wrapped
//! operation behind an `Arc` rather than monomorphizing per signature.
//!
//! Operations flagged as not reentrant get lock-acquiring entry points
//! installed at construction time: every invocation then runs under one
//! process-wide mutex, and callers never know the difference.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use smallvec::{smallvec, SmallVec};

use weft_buffer::{Entry, Frame, KernelBuilder, KernelPrefix};
use weft_core::{ArgMetadata, BuildError, KernelRequest, TypeHandle};
use weft_factory::{check_metadata, KernelFactory};

/// An elementwise loop over raw operand locations.
///
/// `args` holds the destination location first, then the sources;
/// `strides` gives one byte stride per argument in the same order;
/// `count` is the number of elements to process.
pub type ElementwiseLoopFn =
    unsafe extern "C" fn(args: *const *mut u8, strides: *const isize, count: usize);

/// Process-wide exclusivity lock for non-reentrant wrapped operations.
static EXCLUSIVE: Mutex<()> = Mutex::new(());

fn exclusive_guard() -> MutexGuard<'static, ()> {
    // A poisoned lock only means another kernel panicked while holding
    // it; the guarded operation holds no shared state of ours.
    EXCLUSIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An externally supplied elementwise operation.
pub struct ElementwiseOp {
    func: ElementwiseLoopFn,
    operands: SmallVec<[TypeHandle; 4]>,
    requires_exclusive: bool,
    supports_strided: bool,
}

impl ElementwiseOp {
    /// Wrap a raw loop.
    ///
    /// `operands` lists the destination type first, then one source
    /// type per loop input. Set `requires_exclusive` when the loop is
    /// not safe for concurrent execution; every invocation of kernels
    /// built from it will then hold the process-wide exclusivity lock.
    ///
    /// # Panics
    ///
    /// Panics if `operands` is empty — the destination is mandatory.
    pub fn new(
        func: ElementwiseLoopFn,
        operands: Vec<TypeHandle>,
        requires_exclusive: bool,
    ) -> Self {
        assert!(
            !operands.is_empty(),
            "an elementwise operation needs at least a destination operand"
        );
        Self {
            func,
            operands: SmallVec::from_vec(operands),
            requires_exclusive,
            supports_strided: true,
        }
    }

    /// Declare that the loop must only be called one element at a time
    /// (it cannot honor arbitrary strides). Strided instantiation
    /// requests will then fail with `UnsupportedCallingConvention`.
    pub fn single_only(mut self) -> Self {
        self.supports_strided = false;
        self
    }

    /// Number of source operands.
    pub fn arity(&self) -> usize {
        self.operands.len() - 1
    }

    /// Whether invocations serialize on the process-wide lock.
    pub fn requires_exclusive(&self) -> bool {
        self.requires_exclusive
    }
}

/// Payload of an elementwise kernel frame: the shared wrapped
/// operation. Dropping the frame releases this reference.
struct ElementwisePayload {
    op: Arc<ElementwiseOp>,
}

/// # Safety
///
/// Per the entry contract: `kernel` is the prefix of the
/// `Frame<ElementwisePayload>` this entry was installed in; `src` holds
/// at least `arity` readable locations.
unsafe fn run_single(dst: *mut u8, src: *const *const u8, kernel: *const KernelPrefix) {
    // SAFETY: per this function's contract.
    unsafe {
        let op = &Frame::<ElementwisePayload>::from_prefix(kernel).payload().op;
        let arity = op.arity();
        let mut args: SmallVec<[*mut u8; 8]> = SmallVec::with_capacity(arity + 1);
        args.push(dst);
        for i in 0..arity {
            args.push(*src.add(i) as *mut u8);
        }
        let strides: SmallVec<[isize; 8]> = smallvec![0; arity + 1];
        (op.func)(args.as_ptr(), strides.as_ptr(), 1);
    }
}

/// # Safety
///
/// As [`run_single`], plus `src_strides` holds `arity` entries and
/// every location is valid for `count` elements at its stride.
unsafe fn run_strided(
    dst: *mut u8,
    dst_stride: isize,
    src: *const *const u8,
    src_strides: *const isize,
    count: usize,
    kernel: *const KernelPrefix,
) {
    // SAFETY: per this function's contract.
    unsafe {
        let op = &Frame::<ElementwisePayload>::from_prefix(kernel).payload().op;
        let arity = op.arity();
        let mut args: SmallVec<[*mut u8; 8]> = SmallVec::with_capacity(arity + 1);
        args.push(dst);
        let mut strides: SmallVec<[isize; 8]> = SmallVec::with_capacity(arity + 1);
        strides.push(dst_stride);
        for i in 0..arity {
            args.push(*src.add(i) as *mut u8);
            strides.push(*src_strides.add(i));
        }
        (op.func)(args.as_ptr(), strides.as_ptr(), count);
    }
}

unsafe extern "C" fn elementwise_single(
    dst: *mut u8,
    src: *const *const u8,
    kernel: *const KernelPrefix,
) {
    // SAFETY: forwarded per the entry contract.
    unsafe { run_single(dst, src, kernel) };
}

unsafe extern "C" fn elementwise_single_exclusive(
    dst: *mut u8,
    src: *const *const u8,
    kernel: *const KernelPrefix,
) {
    let _guard = exclusive_guard();
    // SAFETY: forwarded per the entry contract.
    unsafe { run_single(dst, src, kernel) };
}

unsafe extern "C" fn elementwise_strided(
    dst: *mut u8,
    dst_stride: isize,
    src: *const *const u8,
    src_strides: *const isize,
    count: usize,
    kernel: *const KernelPrefix,
) {
    // SAFETY: forwarded per the entry contract.
    unsafe { run_strided(dst, dst_stride, src, src_strides, count, kernel) };
}

unsafe extern "C" fn elementwise_strided_exclusive(
    dst: *mut u8,
    dst_stride: isize,
    src: *const *const u8,
    src_strides: *const isize,
    count: usize,
    kernel: *const KernelPrefix,
) {
    let _guard = exclusive_guard();
    // SAFETY: forwarded per the entry contract.
    unsafe { run_strided(dst, dst_stride, src, src_strides, count, kernel) };
}

/// Deferred factory wrapping an [`ElementwiseOp`].
///
/// Cheap to clone and instantiate; every constructed frame shares the
/// wrapped operation through the factory's `Arc`.
#[derive(Clone)]
pub struct ElementwiseKernelFactory {
    op: Arc<ElementwiseOp>,
}

impl ElementwiseKernelFactory {
    /// Create a factory from a wrapped operation.
    pub fn new(op: ElementwiseOp) -> Self {
        Self { op: Arc::new(op) }
    }

    /// The shared wrapped operation (diagnostics and tests).
    pub fn op(&self) -> &Arc<ElementwiseOp> {
        &self.op
    }
}

impl KernelFactory for ElementwiseKernelFactory {
    fn name(&self) -> &str {
        "elementwise"
    }

    fn arity(&self) -> usize {
        self.op.arity()
    }

    fn instantiate(
        &self,
        ckb: &mut KernelBuilder,
        offset: usize,
        meta: &[ArgMetadata],
        request: KernelRequest,
    ) -> Result<usize, BuildError> {
        check_metadata(self.arity(), meta)?;
        let entry = match request {
            KernelRequest::Single if self.op.requires_exclusive => {
                Entry::expr_single(elementwise_single_exclusive)
            }
            KernelRequest::Single => Entry::expr_single(elementwise_single),
            KernelRequest::Strided if !self.op.supports_strided => {
                return Err(BuildError::UnsupportedCallingConvention {
                    factory: self.name().into(),
                    requested: request,
                });
            }
            KernelRequest::Strided if self.op.requires_exclusive => {
                Entry::expr_strided(elementwise_strided_exclusive)
            }
            KernelRequest::Strided => Entry::expr_strided(elementwise_strided),
        };
        let payload = ElementwisePayload {
            op: Arc::clone(&self.op),
        };
        // SAFETY: all four entries interpret their kernel argument as
        // Frame<ElementwisePayload>, which is exactly what is pushed.
        unsafe { ckb.push_frame(offset, entry, payload, true) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalars;
    use weft_test_utils::int32_add_loop;

    fn add_factory(requires_exclusive: bool) -> ElementwiseKernelFactory {
        ElementwiseKernelFactory::new(ElementwiseOp::new(
            int32_add_loop,
            vec![scalars::int32(), scalars::int32(), scalars::int32()],
            requires_exclusive,
        ))
    }

    fn check_single_add(factory: &ElementwiseKernelFactory) {
        let mut ckb = KernelBuilder::new();
        let meta = [ArgMetadata::NONE; 3];
        factory
            .instantiate(&mut ckb, 0, &meta, KernelRequest::Single)
            .unwrap();
        let a: i32 = 10;
        let b: i32 = 21;
        let mut c: i32 = 0;
        let src = [&a as *const i32 as *const u8, &b as *const i32 as *const u8];
        // SAFETY: two valid source cells, one valid destination cell.
        unsafe {
            ckb.expr_single().call(&mut c as *mut i32 as *mut u8, &src);
        }
        assert_eq!(c, 31);
    }

    fn check_strided_add(factory: &ElementwiseKernelFactory) {
        let mut ckb = KernelBuilder::new();
        let meta = [ArgMetadata::NONE; 3];
        factory
            .instantiate(&mut ckb, 0, &meta, KernelRequest::Strided)
            .unwrap();
        let a: [i32; 3] = [1, 4, 6];
        let b: [i32; 3] = [3, -1, 12];
        let mut c: [i32; 3] = [0; 3];
        let src = [a.as_ptr() as *const u8, b.as_ptr() as *const u8];
        let strides: [isize; 2] = [4, 4];
        // SAFETY: cells valid for 3 elements per argument.
        unsafe {
            ckb.expr_strided()
                .call(c.as_mut_ptr() as *mut u8, 4, &src, &strides, 3);
        }
        assert_eq!(c, [4, 3, 18]);
    }

    #[test]
    fn int32_add_single_and_strided() {
        let factory = add_factory(false);
        check_single_add(&factory);
        check_strided_add(&factory);
    }

    #[test]
    fn int32_add_under_the_exclusivity_lock() {
        // Same observable behavior; every call serializes internally.
        let factory = add_factory(true);
        check_single_add(&factory);
        check_strided_add(&factory);
    }

    #[test]
    fn single_only_op_refuses_strided_requests() {
        let factory = ElementwiseKernelFactory::new(
            ElementwiseOp::new(
                int32_add_loop,
                vec![scalars::int32(), scalars::int32(), scalars::int32()],
                false,
            )
            .single_only(),
        );
        let mut ckb = KernelBuilder::new();
        let meta = [ArgMetadata::NONE; 3];
        let err = factory
            .instantiate(&mut ckb, 0, &meta, KernelRequest::Strided)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnsupportedCallingConvention { .. }
        ));
        // No partial frame left behind; single still works.
        assert_eq!(ckb.used(), 0);
        factory
            .instantiate(&mut ckb, 0, &meta, KernelRequest::Single)
            .unwrap();
    }

    #[test]
    fn metadata_mismatch_is_reported_before_any_write() {
        let factory = add_factory(false);
        let mut ckb = KernelBuilder::new();
        let err = factory
            .instantiate(&mut ckb, 0, &[ArgMetadata::NONE; 2], KernelRequest::Single)
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::MetadataMismatch {
                expected: 3,
                actual: 2,
            }
        );
        assert_eq!(ckb.used(), 0);
    }

    #[test]
    fn frames_release_the_shared_op_exactly_once() {
        let factory = add_factory(false);
        assert_eq!(Arc::strong_count(factory.op()), 1);
        let mut ckb = KernelBuilder::new();
        let meta = [ArgMetadata::NONE; 3];
        factory
            .instantiate(&mut ckb, 0, &meta, KernelRequest::Single)
            .unwrap();
        assert_eq!(Arc::strong_count(factory.op()), 2);
        // Growth must not duplicate or lose the reference.
        ckb.ensure_capacity_leaf(4096).unwrap();
        assert_eq!(Arc::strong_count(factory.op()), 2);
        ckb.reset();
        assert_eq!(Arc::strong_count(factory.op()), 1);
        ckb.reset();
        assert_eq!(Arc::strong_count(factory.op()), 1);
    }
}
