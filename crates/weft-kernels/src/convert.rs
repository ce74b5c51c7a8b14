//! Scalar conversion kernels.
//!
//! Numeric conversions are zero-payload frames whose entries are
//! monomorphized over the (source, destination) pair; they carry native
//! single and strided entry points. Fixed-width text parsing is defined
//! only element-at-a-time, so strided requests are lowered through the
//! strided-over-single chain adaptor — the one builtin exercise of
//! composite frames.
//!
//! All operand access is unaligned: kernels make no assumption about
//! how callers lay out their cells.

use std::marker::PhantomData;
use std::ptr;
use std::slice;
use std::str;

use weft_buffer::{push_strided_over_single, Entry, Frame, KernelBuilder, KernelPrefix};
use weft_core::{BuildError, KernelRequest};

/// Numeric cast between two builtin scalar representations.
///
/// Semantics are Rust `as` casts: float-to-int truncates toward zero
/// and saturates at the destination's bounds.
pub trait CastTo<D>: Copy {
    /// Convert one element.
    fn cast(self) -> D;
}

macro_rules! cast_to {
    ($($src:ty),* => $dst:ty) => {
        $(
            impl CastTo<$dst> for $src {
                #[inline]
                fn cast(self) -> $dst {
                    self as $dst
                }
            }
        )*
    };
}

cast_to!(i32, i64, u32, u64, f32, f64 => i32);
cast_to!(i32, i64, u32, u64, f32, f64 => i64);
cast_to!(i32, i64, u32, u64, f32, f64 => u32);
cast_to!(i32, i64, u32, u64, f32, f64 => u64);
cast_to!(i32, i64, u32, u64, f32, f64 => f32);
cast_to!(i32, i64, u32, u64, f32, f64 => f64);

/// Zero-sized payload of a numeric conversion frame.
struct Convert<S, D>(PhantomData<fn(S) -> D>);

unsafe extern "C" fn convert_single<S, D>(
    dst: *mut u8,
    src: *const u8,
    _kernel: *const KernelPrefix,
) where
    S: CastTo<D>,
{
    // SAFETY: caller passes a readable S cell and a writable D cell;
    // alignment is not assumed.
    unsafe {
        let v = ptr::read_unaligned(src as *const S);
        ptr::write_unaligned(dst as *mut D, v.cast());
    }
}

unsafe extern "C" fn convert_strided<S, D>(
    dst: *mut u8,
    dst_stride: isize,
    src: *const u8,
    src_stride: isize,
    count: usize,
    _kernel: *const KernelPrefix,
) where
    S: CastTo<D>,
{
    // SAFETY: caller passes cells valid for `count` elements at the
    // given byte strides; alignment is not assumed.
    unsafe {
        let mut dst = dst;
        let mut src = src;
        for _ in 0..count {
            let v = ptr::read_unaligned(src as *const S);
            ptr::write_unaligned(dst as *mut D, v.cast());
            dst = dst.offset(dst_stride);
            src = src.offset(src_stride);
        }
    }
}

/// Build a numeric conversion frame at `offset`.
///
/// The frame is a chain leaf: both entries are native, no child is
/// ever constructed after it.
pub(crate) fn build_convert<S, D>(
    ckb: &mut KernelBuilder,
    offset: usize,
    request: KernelRequest,
) -> Result<usize, BuildError>
where
    S: CastTo<D>,
{
    let entry = match request {
        KernelRequest::Single => Entry::unary_single(convert_single::<S, D>),
        KernelRequest::Strided => Entry::unary_strided(convert_strided::<S, D>),
    };
    // SAFETY: both entries ignore their payload; the frame they receive
    // is the Frame<Convert<S, D>> pushed here.
    unsafe { ckb.push_frame(offset, entry, Convert::<S, D>(PhantomData), true) }
}

/// Scalar types parseable from fixed-width text.
pub trait ParseScalar: Sized {
    /// Parse one element from a NUL-padded byte field.
    ///
    /// Unparseable fields yield the type's quiet failure value (NaN
    /// for floats); parse failures are the operation's business, not
    /// the dispatch layer's.
    fn parse_text(bytes: &[u8]) -> Self;
}

fn trimmed(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    str::from_utf8(&bytes[..end]).unwrap_or("").trim()
}

impl ParseScalar for f32 {
    fn parse_text(bytes: &[u8]) -> Self {
        trimmed(bytes).parse().unwrap_or(f32::NAN)
    }
}

impl ParseScalar for f64 {
    fn parse_text(bytes: &[u8]) -> Self {
        trimmed(bytes).parse().unwrap_or(f64::NAN)
    }
}

/// Payload of a fixed-width text parsing frame.
struct ParseText<D> {
    width: usize,
    _target: PhantomData<fn() -> D>,
}

unsafe extern "C" fn parse_text_single<D: ParseScalar>(
    dst: *mut u8,
    src: *const u8,
    kernel: *const KernelPrefix,
) {
    // SAFETY: kernel is the prefix of the Frame<ParseText<D>> pushed by
    // build_parse_text; src is readable for `width` bytes and dst
    // writable for one D, unaligned.
    unsafe {
        let frame = Frame::<ParseText<D>>::from_prefix(kernel);
        let bytes = slice::from_raw_parts(src, frame.payload().width);
        ptr::write_unaligned(dst as *mut D, D::parse_text(bytes));
    }
}

/// Build a text-parsing kernel at `offset`.
///
/// Single requests are one leaf frame. Strided requests chain the
/// adaptor in front of the single frame, so the composite presents the
/// unary strided shape while the parse itself stays element-at-a-time.
pub(crate) fn build_parse_text<D: ParseScalar>(
    ckb: &mut KernelBuilder,
    offset: usize,
    width: usize,
    request: KernelRequest,
) -> Result<usize, BuildError> {
    let payload = ParseText::<D> {
        width,
        _target: PhantomData,
    };
    match request {
        KernelRequest::Single => {
            // SAFETY: parse_text_single::<D> reads its frame as
            // Frame<ParseText<D>>, pushed here.
            unsafe { ckb.push_frame(offset, Entry::unary_single(parse_text_single::<D>), payload, true) }
        }
        KernelRequest::Strided => {
            let child = push_strided_over_single(ckb, offset)?;
            // SAFETY: as above; the child frame is the adaptor's target.
            let child_size = unsafe {
                ckb.push_frame(child, Entry::unary_single(parse_text_single::<D>), payload, true)?
            };
            Ok(child - offset + child_size)
        }
    }
}
