//! The growable, owning kernel buffer.
//!
//! [`KernelBuilder`] owns a contiguous byte region that hosts one or
//! more kernel frames. Small kernels live entirely in an inline block
//! of sixteen pointer widths; the first growth beyond that moves the
//! committed bytes to a heap region, and further growth reallocates.
//! Offsets into the buffer survive growth; absolute addresses do not,
//! which is why frames reference their children by offset.
//!
//! The builder is single-owner: construction takes `&mut self`, and
//! the destructor chain rooted at offset 0 runs exactly once, on
//! [`KernelBuilder::reset`] or on drop.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};

use weft_core::{BuildError, EntryShape};

use crate::prefix::{drop_frame_payload, DestructorFn, Entry, Frame, KernelPrefix};

/// Inline storage size in bytes: sixteen pointer widths.
pub const INLINE_CAPACITY: usize = 16 * mem::size_of::<usize>();

/// Strictest frame alignment the buffer supports.
///
/// Both the inline block and heap regions are aligned to this, so any
/// frame whose payload needs at most 8-byte alignment can be placed at
/// any 8-byte-aligned offset regardless of the target's pointer width.
pub const MAX_FRAME_ALIGN: usize = 8;

const INLINE_WORDS: usize = 16;

/// The inline block. `[usize; 16]` gives the sixteen-pointer-width size
/// contract; the explicit alignment keeps 8-byte payloads valid on
/// 32-bit targets too.
#[repr(C, align(8))]
struct InlineBlock([usize; INLINE_WORDS]);

/// Where the buffer's bytes currently live.
#[derive(Clone, Copy)]
enum Storage {
    /// Never grown beyond the inline block.
    Inline,
    /// Grown at least once; bytes live in a heap region.
    Heap { ptr: NonNull<u8>, capacity: usize },
}

/// An owning, growable buffer of constructed kernel frames.
///
/// Created empty in the inline state; grown on demand by the
/// `ensure_capacity` family; restored to pristine by [`reset`]
/// (which also runs the destructor chain). Dropping the builder is
/// equivalent to `reset` — every exit path, including construction
/// errors, releases each constructed frame exactly once.
///
/// [`reset`]: KernelBuilder::reset
pub struct KernelBuilder {
    storage: Storage,
    used: usize,
    root_shape: Option<EntryShape>,
    inline: InlineBlock,
}

impl KernelBuilder {
    /// Create an empty builder in the inline state.
    pub fn new() -> Self {
        Self {
            storage: Storage::Inline,
            used: 0,
            root_shape: None,
            inline: InlineBlock([0; INLINE_WORDS]),
        }
    }

    /// Bytes available before the next growth.
    pub fn capacity(&self) -> usize {
        match self.storage {
            Storage::Inline => INLINE_CAPACITY,
            Storage::Heap { capacity, .. } => capacity,
        }
    }

    /// Bytes committed to constructed frames.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Whether the buffer has never required capacity beyond the
    /// inline block.
    pub fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline)
    }

    /// Base address of the buffer's bytes.
    ///
    /// Valid only until the next growth; diagnostic and invocation use
    /// only. Equal to the inline block's address iff [`is_inline`]
    /// holds.
    ///
    /// [`is_inline`]: KernelBuilder::is_inline
    pub fn data(&self) -> *const u8 {
        match self.storage {
            Storage::Inline => self.inline.0.as_ptr() as *const u8,
            Storage::Heap { ptr, .. } => ptr.as_ptr() as *const u8,
        }
    }

    fn data_mut(&mut self) -> *mut u8 {
        match self.storage {
            Storage::Inline => self.inline.0.as_mut_ptr() as *mut u8,
            Storage::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Entry shape of the root frame, if one has been constructed.
    pub fn root_shape(&self) -> Option<EntryShape> {
        self.root_shape
    }

    /// Guarantee at least `requested` bytes plus headroom for one
    /// trailing prefix, so a nested frame can always be appended after
    /// the one being constructed.
    ///
    /// No-op if already satisfied. On growth, previously cached
    /// absolute addresses into the buffer are invalidated; offsets
    /// remain valid.
    pub fn ensure_capacity(&mut self, requested: usize) -> Result<(), BuildError> {
        let with_headroom = requested
            .checked_add(mem::size_of::<KernelPrefix>())
            .ok_or(BuildError::AllocationFailed { requested })?;
        self.ensure_capacity_leaf(with_headroom)
    }

    /// Guarantee at least `requested` bytes, with no trailing-prefix
    /// headroom. Used when constructing the terminal frame of a chain.
    pub fn ensure_capacity_leaf(&mut self, requested: usize) -> Result<(), BuildError> {
        if requested <= self.capacity() {
            return Ok(());
        }
        // Amortized doubling, rounded up to a whole number of words.
        let doubled = self.capacity().saturating_mul(2);
        let new_capacity = round_up_to_word(requested.max(doubled))
            .ok_or(BuildError::AllocationFailed { requested })?;
        let layout = Layout::from_size_align(new_capacity, MAX_FRAME_ALIGN)
            .map_err(|_| BuildError::AllocationFailed {
                requested: new_capacity,
            })?;
        // SAFETY: layout has nonzero size (new_capacity > capacity() >= 1).
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(new_ptr) = NonNull::new(raw) else {
            return Err(BuildError::AllocationFailed {
                requested: new_capacity,
            });
        };
        // SAFETY: source is valid for capacity() bytes, destination for
        // new_capacity > capacity() bytes, and the regions are distinct
        // allocations. The zeroed tail beyond the copy preserves the
        // zero-fill invariant.
        unsafe {
            ptr::copy_nonoverlapping(self.data(), new_ptr.as_ptr(), self.capacity());
        }
        self.release_heap();
        self.storage = Storage::Heap {
            ptr: new_ptr,
            capacity: new_capacity,
        };
        Ok(())
    }

    /// Write a frame at `offset`, growing the buffer as needed.
    ///
    /// Reserves trailing-prefix headroom unless `leaf` is set. The
    /// destructor is wired automatically: payloads that need dropping
    /// get a shim that runs `P`'s `Drop`, trivial payloads get none.
    /// Records the root entry shape when `offset` is zero. Returns the
    /// frame size in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is misaligned for the frame or the payload
    /// requires alignment above [`MAX_FRAME_ALIGN`] — both programming
    /// errors.
    ///
    /// # Safety
    ///
    /// `entry`'s function must interpret the kernel prefix it receives
    /// as the prefix of a `Frame<P>` holding `payload`. The region at
    /// `offset` must not hold an already-constructed frame (it would be
    /// overwritten without being dropped).
    pub unsafe fn push_frame<P>(
        &mut self,
        offset: usize,
        entry: Entry,
        payload: P,
        leaf: bool,
    ) -> Result<usize, BuildError> {
        let size = mem::size_of::<Frame<P>>();
        let align = mem::align_of::<Frame<P>>();
        assert!(
            align <= MAX_FRAME_ALIGN,
            "frame alignment {align} exceeds the buffer alignment {MAX_FRAME_ALIGN}"
        );
        assert!(
            offset % align == 0,
            "frame offset {offset} is not aligned to {align}"
        );
        let end = offset
            .checked_add(size)
            .ok_or(BuildError::AllocationFailed { requested: size })?;
        if leaf {
            self.ensure_capacity_leaf(end)?;
        } else {
            self.ensure_capacity(end)?;
        }
        let destructor: Option<DestructorFn> = if mem::needs_drop::<P>() {
            Some(drop_frame_payload::<P>)
        } else {
            None
        };
        // SAFETY: capacity was ensured above, the offset is in bounds
        // and aligned, and the destination holds no constructed frame.
        unsafe {
            let at = self.data_mut().add(offset) as *mut Frame<P>;
            ptr::write(at, Frame::new(KernelPrefix::new(entry.function(), destructor), payload));
        }
        self.used = self.used.max(end);
        if offset == 0 {
            self.root_shape = Some(entry.shape());
        }
        Ok(size)
    }

    /// Destroy every constructed frame and return the buffer to the
    /// pristine inline state.
    ///
    /// Runs the destructor chain rooted at offset 0 (root first;
    /// composite frames destroy their children from their own
    /// destructors), releases any heap region, and zeroes the inline
    /// block.
    pub fn reset(&mut self) {
        self.destroy_frames();
        self.release_heap();
        self.inline.0 = [0; INLINE_WORDS];
        self.used = 0;
        self.root_shape = None;
    }

    pub(crate) fn require_shape(&self, want: EntryShape) -> &KernelPrefix {
        match self.root_shape {
            None => panic!("no kernel has been constructed in this builder"),
            Some(built) if built != want => {
                panic!("calling convention mismatch: kernel was built as {built}, requested {want}")
            }
            Some(_) => {
                // SAFETY: root_shape is Some only after push_frame wrote
                // a constructed frame at offset 0, and the prefix stays
                // valid until reset/drop, which take &mut self.
                unsafe { &*(self.data() as *const KernelPrefix) }
            }
        }
    }

    fn destroy_frames(&mut self) {
        if self.used >= mem::size_of::<KernelPrefix>() {
            // SAFETY: offset 0 holds either a constructed prefix or
            // still-zeroed bytes (interrupted construction); both are
            // valid to destroy, and this is the only call site per
            // committed chain.
            unsafe { KernelPrefix::destroy(self.data_mut() as *mut KernelPrefix) };
        }
    }

    fn release_heap(&mut self) {
        if let Storage::Heap { ptr, capacity } = self.storage {
            // SAFETY: the region was allocated in ensure_capacity_leaf
            // with exactly this size and alignment.
            unsafe {
                dealloc(
                    ptr.as_ptr(),
                    Layout::from_size_align_unchecked(capacity, MAX_FRAME_ALIGN),
                );
            }
            self.storage = Storage::Inline;
        }
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for KernelBuilder {
    fn drop(&mut self) {
        self.destroy_frames();
        self.release_heap();
    }
}

impl fmt::Debug for KernelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelBuilder")
            .field("capacity", &self.capacity())
            .field("used", &self.used)
            .field("inline", &self.is_inline())
            .field("root_shape", &self.root_shape)
            .finish()
    }
}

fn round_up_to_word(bytes: usize) -> Option<usize> {
    let word = mem::size_of::<usize>();
    Some(bytes.checked_add(word - 1)? / word * word)
}
