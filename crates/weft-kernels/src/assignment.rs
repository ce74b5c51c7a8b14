//! Assignment (type-conversion) kernel construction.
//!
//! A deterministic registry maps (destination kind, source kind) pairs
//! to frame builders. [`build_assignment_kernel`] is the direct
//! construction path; [`AssignmentKernelFactory`] wraps the same lookup
//! as a deferred factory, validated once at creation and reusable
//! across unlimited instantiations.

use std::sync::OnceLock;

use indexmap::IndexMap;

use weft_buffer::KernelBuilder;
use weft_core::{ArgMetadata, BuildError, KernelRequest, TypeHandle};
use weft_factory::{check_metadata, KernelFactory};

use crate::convert::{build_convert, build_parse_text};
use crate::scalars::{
    kind_of, KIND_FIXED_TEXT, KIND_FLOAT32, KIND_FLOAT64, KIND_INT32, KIND_INT64, KIND_UINT32,
    KIND_UINT64,
};

/// A frame builder for one registered conversion pair.
///
/// Receives the handles so parameterized types (fixed text) can read
/// their width from the size contract.
type BuildFn = fn(
    &mut KernelBuilder,
    usize,
    &TypeHandle,
    &TypeHandle,
    KernelRequest,
) -> Result<usize, BuildError>;

struct ConversionTable {
    entries: IndexMap<(u32, u32), BuildFn>,
}

impl ConversionTable {
    fn global() -> &'static ConversionTable {
        static TABLE: OnceLock<ConversionTable> = OnceLock::new();
        TABLE.get_or_init(ConversionTable::new)
    }

    fn new() -> Self {
        let mut entries: IndexMap<(u32, u32), BuildFn> = IndexMap::new();

        macro_rules! numeric {
            ($dkind:expr, $dty:ty) => {
                entries.insert(($dkind, KIND_INT32), |ckb, off, _d, _s, req| {
                    build_convert::<i32, $dty>(ckb, off, req)
                });
                entries.insert(($dkind, KIND_INT64), |ckb, off, _d, _s, req| {
                    build_convert::<i64, $dty>(ckb, off, req)
                });
                entries.insert(($dkind, KIND_UINT32), |ckb, off, _d, _s, req| {
                    build_convert::<u32, $dty>(ckb, off, req)
                });
                entries.insert(($dkind, KIND_UINT64), |ckb, off, _d, _s, req| {
                    build_convert::<u64, $dty>(ckb, off, req)
                });
                entries.insert(($dkind, KIND_FLOAT32), |ckb, off, _d, _s, req| {
                    build_convert::<f32, $dty>(ckb, off, req)
                });
                entries.insert(($dkind, KIND_FLOAT64), |ckb, off, _d, _s, req| {
                    build_convert::<f64, $dty>(ckb, off, req)
                });
            };
        }

        numeric!(KIND_INT32, i32);
        numeric!(KIND_INT64, i64);
        numeric!(KIND_UINT32, u32);
        numeric!(KIND_UINT64, u64);
        numeric!(KIND_FLOAT32, f32);
        numeric!(KIND_FLOAT64, f64);

        entries.insert((KIND_FLOAT32, KIND_FIXED_TEXT), |ckb, off, _d, src, req| {
            build_parse_text::<f32>(ckb, off, src.data_size(), req)
        });
        entries.insert((KIND_FLOAT64, KIND_FIXED_TEXT), |ckb, off, _d, src, req| {
            build_parse_text::<f64>(ckb, off, src.data_size(), req)
        });

        Self { entries }
    }

    fn lookup(&self, dst: &TypeHandle, src: &TypeHandle) -> Option<BuildFn> {
        self.entries
            .get(&(kind_of(dst.key()), kind_of(src.key())))
            .copied()
    }
}

/// Build an assignment kernel converting `src` elements to `dst`
/// elements, at byte `offset` of `ckb`.
///
/// Returns the number of bytes written, or
/// [`BuildError::UnsupportedConversion`] — before any bytes are
/// written — if the pair is not registered.
pub fn build_assignment_kernel(
    ckb: &mut KernelBuilder,
    offset: usize,
    dst: &TypeHandle,
    src: &TypeHandle,
    request: KernelRequest,
) -> Result<usize, BuildError> {
    match ConversionTable::global().lookup(dst, src) {
        Some(build) => build(ckb, offset, dst, src, request),
        None => Err(BuildError::UnsupportedConversion {
            dst: dst.key(),
            src: src.key(),
        }),
    }
}

/// Deferred factory for assignment kernels between one type pair.
///
/// The pair is validated against the registry at creation, so
/// instantiation can only fail on metadata or capacity.
#[derive(Clone, Debug)]
pub struct AssignmentKernelFactory {
    dst: TypeHandle,
    src: TypeHandle,
}

impl AssignmentKernelFactory {
    /// Create a factory for `src` → `dst` assignment.
    pub fn new(dst: TypeHandle, src: TypeHandle) -> Result<Self, BuildError> {
        if ConversionTable::global().lookup(&dst, &src).is_none() {
            return Err(BuildError::UnsupportedConversion {
                dst: dst.key(),
                src: src.key(),
            });
        }
        Ok(Self { dst, src })
    }

    /// Destination type of the kernels this factory builds.
    pub fn dst(&self) -> &TypeHandle {
        &self.dst
    }

    /// Source type of the kernels this factory builds.
    pub fn src(&self) -> &TypeHandle {
        &self.src
    }
}

impl KernelFactory for AssignmentKernelFactory {
    fn name(&self) -> &str {
        "assignment"
    }

    fn arity(&self) -> usize {
        1
    }

    fn instantiate(
        &self,
        ckb: &mut KernelBuilder,
        offset: usize,
        meta: &[ArgMetadata],
        request: KernelRequest,
    ) -> Result<usize, BuildError> {
        check_metadata(self.arity(), meta)?;
        build_assignment_kernel(ckb, offset, &self.dst, &self.src, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalars;

    #[test]
    fn int64_to_float32_single() {
        let mut ckb = KernelBuilder::new();
        build_assignment_kernel(
            &mut ckb,
            0,
            &scalars::float32(),
            &scalars::int64(),
            KernelRequest::Single,
        )
        .unwrap();
        let src: i64 = 1234;
        let mut dst: f32 = 1.0;
        // SAFETY: valid cells.
        unsafe {
            ckb.unary_single().call(
                &mut dst as *mut f32 as *mut u8,
                &src as *const i64 as *const u8,
            );
        }
        assert_eq!(dst, 1234.0);
    }

    #[test]
    fn float32_to_int64_single_is_the_inverse_direction() {
        let mut ckb = KernelBuilder::new();
        build_assignment_kernel(
            &mut ckb,
            0,
            &scalars::int64(),
            &scalars::float32(),
            KernelRequest::Single,
        )
        .unwrap();
        let src: f32 = 1234.0;
        let mut dst: i64 = 0;
        // SAFETY: valid cells.
        unsafe {
            ckb.unary_single().call(
                &mut dst as *mut i64 as *mut u8,
                &src as *const f32 as *const u8,
            );
        }
        assert_eq!(dst, 1234);
    }

    #[test]
    fn unregistered_pair_is_reported_before_any_write() {
        let mut ckb = KernelBuilder::new();
        let err = build_assignment_kernel(
            &mut ckb,
            0,
            &scalars::fixed_text(8),
            &scalars::int32(),
            KernelRequest::Single,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedConversion { .. }));
        assert_eq!(ckb.used(), 0);
    }

    #[test]
    fn factory_validates_the_pair_at_creation() {
        assert!(AssignmentKernelFactory::new(scalars::fixed_text(8), scalars::int32()).is_err());
        assert!(AssignmentKernelFactory::new(scalars::float32(), scalars::int64()).is_ok());
    }

    #[test]
    fn factory_rejects_short_metadata() {
        let factory =
            AssignmentKernelFactory::new(scalars::float32(), scalars::int64()).unwrap();
        let mut ckb = KernelBuilder::new();
        let err = factory
            .instantiate(&mut ckb, 0, &[ArgMetadata::NONE], KernelRequest::Single)
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::MetadataMismatch {
                expected: 2,
                actual: 1,
            }
        );
        assert_eq!(ckb.used(), 0);
    }

    #[test]
    fn factory_reuses_across_builders_and_requests() {
        let factory =
            AssignmentKernelFactory::new(scalars::float32(), scalars::int64()).unwrap();
        let meta = [ArgMetadata::NONE; 2];

        let mut single = KernelBuilder::new();
        factory
            .instantiate(&mut single, 0, &meta, KernelRequest::Single)
            .unwrap();
        let src: i64 = 21;
        let mut dst: f32 = 0.0;
        // SAFETY: valid cells.
        unsafe {
            single.unary_single().call(
                &mut dst as *mut f32 as *mut u8,
                &src as *const i64 as *const u8,
            );
        }
        assert_eq!(dst, 21.0);

        let mut strided = KernelBuilder::new();
        factory
            .instantiate(&mut strided, 0, &meta, KernelRequest::Strided)
            .unwrap();
        let src: [i64; 3] = [3, 7, 21];
        let mut dst: [f32; 3] = [0.0; 3];
        // SAFETY: cells valid for 3 elements.
        unsafe {
            strided.unary_strided().call(
                dst.as_mut_ptr() as *mut u8,
                4,
                src.as_ptr() as *const u8,
                8,
                3,
            );
        }
        assert_eq!(dst, [3.0, 7.0, 21.0]);
    }
}
