//! Error taxonomy for kernel construction.
//!
//! Construction-time failures are recoverable and reported through
//! [`BuildError`]; the builder is always left in its last valid state,
//! with every already-written frame still reachable for cleanup.
//! Contract violations — retrieving a kernel with the wrong calling
//! convention, retrieving from an empty builder, pushing a misaligned
//! frame — are programming errors and panic instead of returning.
//!
//! Invocation-time numeric errors belong to the wrapped operations, not
//! to this taxonomy.

use std::error::Error;
use std::fmt;

use crate::request::KernelRequest;
use crate::types::TypeKey;

/// Errors that can occur while constructing a kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// Dynamic growth of the kernel buffer could not obtain memory.
    AllocationFailed {
        /// Capacity in bytes the buffer attempted to allocate.
        requested: usize,
    },
    /// The factory cannot produce the requested invocation shape.
    ///
    /// No partial frame is left behind.
    UnsupportedCallingConvention {
        /// Name of the refusing factory.
        factory: String,
        /// The shape that was requested.
        requested: KernelRequest,
    },
    /// The supplied metadata disagrees with the factory's operand count.
    ///
    /// Reported before any bytes are written.
    MetadataMismatch {
        /// Number of entries the factory requires (arity + 1).
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },
    /// No conversion kernel is registered for the requested type pair.
    UnsupportedConversion {
        /// Destination type key.
        dst: TypeKey,
        /// Source type key.
        src: TypeKey,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { requested } => {
                write!(f, "kernel buffer allocation failed: requested {requested} bytes")
            }
            Self::UnsupportedCallingConvention { factory, requested } => {
                write!(f, "factory '{factory}' cannot instantiate a {requested} kernel")
            }
            Self::MetadataMismatch { expected, actual } => {
                write!(
                    f,
                    "instantiation metadata mismatch: expected {expected} entries, got {actual}"
                )
            }
            Self::UnsupportedConversion { dst, src } => {
                write!(f, "no assignment kernel from {src} to {dst}")
            }
        }
    }
}

impl Error for BuildError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_shape() {
        let e = BuildError::UnsupportedCallingConvention {
            factory: "elementwise".into(),
            requested: KernelRequest::Strided,
        };
        assert_eq!(
            e.to_string(),
            "factory 'elementwise' cannot instantiate a strided kernel"
        );
    }

    #[test]
    fn display_reports_metadata_counts() {
        let e = BuildError::MetadataMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            e.to_string(),
            "instantiation metadata mismatch: expected 3 entries, got 2"
        );
    }
}
