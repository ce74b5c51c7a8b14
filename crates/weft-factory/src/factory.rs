//! The [`KernelFactory`] trait.

use weft_buffer::KernelBuilder;
use weft_core::{ArgMetadata, BuildError, KernelRequest};

/// A reusable, instantiation-agnostic kernel description.
///
/// # Contract
///
/// - `instantiate` writes one or more frames starting at `offset`,
///   growing the builder through its `ensure_capacity` family; on
///   success the frame at `offset` matches `request` exactly, and when
///   `offset` is zero the kernel is retrievable through the builder's
///   shape-checked accessors.
/// - A factory is stateless with respect to any particular builder:
///   the same factory may instantiate into unlimited builders, and
///   concurrently (`Send + Sync`).
/// - Failures are reported before any frame the caller could observe
///   is left half-built: metadata is validated first, and an
///   unsupported request writes nothing.
///
/// # Object safety
///
/// The trait is object-safe; callers typically hold factories as
/// `Arc<dyn KernelFactory>`.
pub trait KernelFactory: Send + Sync {
    /// Human-readable name for error reporting and diagnostics.
    fn name(&self) -> &str;

    /// Number of source operands of the kernels this factory builds.
    fn arity(&self) -> usize;

    /// Build a kernel for `request` into `ckb` at byte `offset`.
    ///
    /// `meta` supplies one opaque descriptor per operand, destination
    /// first — `arity() + 1` entries. Returns the number of bytes
    /// written at `offset`.
    fn instantiate(
        &self,
        ckb: &mut KernelBuilder,
        offset: usize,
        meta: &[ArgMetadata],
        request: KernelRequest,
    ) -> Result<usize, BuildError>;
}

/// Validate an instantiation metadata array against a factory's arity.
///
/// Factories call this before writing any bytes; a mismatch is
/// recoverable and leaves the builder untouched.
pub fn check_metadata(arity: usize, meta: &[ArgMetadata]) -> Result<(), BuildError> {
    let expected = arity + 1;
    if meta.len() != expected {
        return Err(BuildError::MetadataMismatch {
            expected,
            actual: meta.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_count_must_be_arity_plus_one() {
        assert!(check_metadata(1, &[ArgMetadata::NONE; 2]).is_ok());
        assert_eq!(
            check_metadata(2, &[ArgMetadata::NONE; 2]),
            Err(BuildError::MetadataMismatch {
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn factory_trait_is_object_safe() {
        struct Refusing;
        impl KernelFactory for Refusing {
            fn name(&self) -> &str {
                "refusing"
            }
            fn arity(&self) -> usize {
                1
            }
            fn instantiate(
                &self,
                _ckb: &mut KernelBuilder,
                _offset: usize,
                meta: &[ArgMetadata],
                request: KernelRequest,
            ) -> Result<usize, BuildError> {
                check_metadata(self.arity(), meta)?;
                Err(BuildError::UnsupportedCallingConvention {
                    factory: self.name().into(),
                    requested: request,
                })
            }
        }

        let factory: Box<dyn KernelFactory> = Box::new(Refusing);
        let mut ckb = KernelBuilder::new();
        let err = factory
            .instantiate(&mut ckb, 0, &[ArgMetadata::NONE; 2], KernelRequest::Single)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnsupportedCallingConvention { .. }
        ));
        // A refused request leaves no partial frame behind.
        assert_eq!(ckb.used(), 0);
        assert!(ckb.root_shape().is_none());
    }
}
