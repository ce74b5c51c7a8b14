//! Opaque type identities supplied by the type-system collaborator.
//!
//! The kernel layer never interprets types structurally. A
//! [`TypeHandle`] is an opaque key plus a byte-size contract: how many
//! bytes one element occupies, how it is aligned, and how many bytes of
//! per-argument metadata an instantiation must supply for it. Concrete
//! key values and their meanings belong to whoever registers kernels
//! for them (the builtin scalar set lives in `weft-kernels`).

use std::fmt;

/// Opaque identity of an operand type.
///
/// Keys are compared for equality and used as registry lookups; the
/// kernel layer attaches no meaning to the bit pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(pub u64);

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type:{:#010x}", self.0)
    }
}

/// An opaque type identity together with its byte-size contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeHandle {
    key: TypeKey,
    data_size: usize,
    data_align: usize,
    metadata_size: usize,
}

impl TypeHandle {
    /// Create a handle from a key and its size contract.
    ///
    /// `data_align` must be a nonzero power of two; this is the
    /// collaborator's contract and is not re-validated here.
    pub const fn new(
        key: TypeKey,
        data_size: usize,
        data_align: usize,
        metadata_size: usize,
    ) -> Self {
        Self {
            key,
            data_size,
            data_align,
            metadata_size,
        }
    }

    /// The opaque identity of this type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Bytes occupied by one element of this type.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Preferred alignment of element storage.
    ///
    /// Kernels do not rely on it — operand locations are accessed
    /// unaligned — but callers laying out arrays may.
    pub fn data_align(&self) -> usize {
        self.data_align
    }

    /// Bytes of per-argument metadata required at instantiation.
    pub fn metadata_size(&self) -> usize {
        self.metadata_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_round_trips_contract() {
        let h = TypeHandle::new(TypeKey(7), 4, 4, 0);
        assert_eq!(h.key(), TypeKey(7));
        assert_eq!(h.data_size(), 4);
        assert_eq!(h.data_align(), 4);
        assert_eq!(h.metadata_size(), 0);
    }

    #[test]
    fn key_display_is_hex() {
        assert_eq!(TypeKey(0x12).to_string(), "type:0x00000012");
    }
}
