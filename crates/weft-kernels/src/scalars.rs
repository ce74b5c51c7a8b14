//! Well-known type handles for the builtin scalar set.
//!
//! The type-system collaborator behind the builtin kernels. Keys encode
//! a kind in the upper 32 bits and an optional parameter (the byte
//! width of a fixed text type) in the lower 32; the registry in
//! [`assignment`](crate::assignment) matches on kinds only, reading
//! parameters from the handle's size contract.

use std::mem;

use weft_core::{TypeHandle, TypeKey};

pub(crate) const KIND_INT32: u32 = 0x01;
pub(crate) const KIND_INT64: u32 = 0x02;
pub(crate) const KIND_UINT32: u32 = 0x03;
pub(crate) const KIND_UINT64: u32 = 0x04;
pub(crate) const KIND_FLOAT32: u32 = 0x05;
pub(crate) const KIND_FLOAT64: u32 = 0x06;
pub(crate) const KIND_FIXED_TEXT: u32 = 0x07;

const fn key(kind: u32, param: u32) -> TypeKey {
    TypeKey(((kind as u64) << 32) | param as u64)
}

pub(crate) fn kind_of(key: TypeKey) -> u32 {
    (key.0 >> 32) as u32
}

/// 32-bit signed integer.
pub const fn int32() -> TypeHandle {
    TypeHandle::new(key(KIND_INT32, 0), 4, mem::align_of::<i32>(), 0)
}

/// 64-bit signed integer.
pub const fn int64() -> TypeHandle {
    TypeHandle::new(key(KIND_INT64, 0), 8, mem::align_of::<i64>(), 0)
}

/// 32-bit unsigned integer.
pub const fn uint32() -> TypeHandle {
    TypeHandle::new(key(KIND_UINT32, 0), 4, mem::align_of::<u32>(), 0)
}

/// 64-bit unsigned integer.
pub const fn uint64() -> TypeHandle {
    TypeHandle::new(key(KIND_UINT64, 0), 8, mem::align_of::<u64>(), 0)
}

/// 32-bit IEEE float.
pub const fn float32() -> TypeHandle {
    TypeHandle::new(key(KIND_FLOAT32, 0), 4, mem::align_of::<f32>(), 0)
}

/// 64-bit IEEE float.
pub const fn float64() -> TypeHandle {
    TypeHandle::new(key(KIND_FLOAT64, 0), 8, mem::align_of::<f64>(), 0)
}

/// Fixed-width text: `width` bytes per element, NUL-padded.
pub const fn fixed_text(width: u32) -> TypeHandle {
    TypeHandle::new(key(KIND_FIXED_TEXT, width), width as usize, 1, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct() {
        let keys = [
            int32().key(),
            int64().key(),
            uint32().key(),
            uint64().key(),
            float32().key(),
            float64().key(),
            fixed_text(15).key(),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn fixed_text_width_is_the_data_size() {
        let h = fixed_text(15);
        assert_eq!(h.data_size(), 15);
        assert_eq!(h.data_align(), 1);
        assert_eq!(kind_of(h.key()), KIND_FIXED_TEXT);
    }

    #[test]
    fn kinds_decode_from_keys() {
        assert_eq!(kind_of(int32().key()), KIND_INT32);
        assert_eq!(kind_of(float64().key()), KIND_FLOAT64);
    }
}
