//! Calling-convention selectors and entry-point shapes.
//!
//! A [`KernelRequest`] is what callers pass to `instantiate`: whether the
//! kernel should process one element per call or a strided run of
//! elements. An [`EntryShape`] describes the concrete signature a
//! constructed kernel's entry point implements; it is the product of the
//! request and the factory's signature family (unary for fixed
//! one-source operations, expression for generalized arity). A factory
//! with expression semantics instantiated as `Single` produces an
//! `ExprSingle` kernel, not a `UnarySingle` one.

use std::fmt;

/// Invocation shape requested at kernel instantiation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KernelRequest {
    /// One element per call.
    Single,
    /// A strided run of elements per call, amortizing dispatch overhead.
    Strided,
}

impl fmt::Display for KernelRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Strided => write!(f, "strided"),
        }
    }
}

/// Concrete signature shape of a constructed kernel's entry point.
///
/// The unary shapes take exactly one source location; the expression
/// shapes take an array of source locations whose length is fixed by
/// the constructed kernel (not by the ABI).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryShape {
    /// `(dst, src, kernel)` — one destination, one source, one element.
    UnarySingle,
    /// `(dst, dst_stride, src, src_stride, count, kernel)`.
    UnaryStrided,
    /// `(dst, src_array, kernel)` — generalized arity, one element.
    ExprSingle,
    /// `(dst, dst_stride, src_array, src_stride_array, count, kernel)`.
    ExprStrided,
}

impl fmt::Display for EntryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnarySingle => write!(f, "unary single"),
            Self::UnaryStrided => write!(f, "unary strided"),
            Self::ExprSingle => write!(f, "expression single"),
            Self::ExprStrided => write!(f, "expression strided"),
        }
    }
}

impl EntryShape {
    /// The request this shape satisfies.
    pub fn request(&self) -> KernelRequest {
        match self {
            Self::UnarySingle | Self::ExprSingle => KernelRequest::Single,
            Self::UnaryStrided | Self::ExprStrided => KernelRequest::Strided,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_maps_back_to_request() {
        assert_eq!(EntryShape::UnarySingle.request(), KernelRequest::Single);
        assert_eq!(EntryShape::ExprSingle.request(), KernelRequest::Single);
        assert_eq!(EntryShape::UnaryStrided.request(), KernelRequest::Strided);
        assert_eq!(EntryShape::ExprStrided.request(), KernelRequest::Strided);
    }

    #[test]
    fn display_is_lowercase_words() {
        assert_eq!(KernelRequest::Single.to_string(), "single");
        assert_eq!(EntryShape::ExprStrided.to_string(), "expression strided");
    }
}
