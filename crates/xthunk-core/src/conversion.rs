//! Scratch memory for marshaled structures.

use std::ptr::NonNull;

/// Bytes in the inline first block.
pub const INLINE_BYTES: usize = 2048;

const WORD: usize = std::mem::size_of::<u64>();

/// Bump allocator whose allocations live until the context is dropped.
///
/// The first 2048 bytes come from one boxed block; anything that does not
/// fit goes to a separate heap block. Blocks never move, so handed-out
/// pointers stay valid when the context itself is moved (for example into a
/// deferred operation that outlives the call that filled it).
pub struct ConversionContext {
    inline: Box<[u64; INLINE_BYTES / WORD]>,
    used: usize,
    overflow: Vec<Box<[u64]>>,
}

impl ConversionContext {
    pub fn new() -> Self {
        Self {
            inline: Box::new([0; INLINE_BYTES / WORD]),
            used: 0,
            overflow: Vec::new(),
        }
    }

    /// Zeroed, 8-byte aligned memory for `size` bytes.
    pub fn alloc(&mut self, size: usize) -> NonNull<u8> {
        let words = size.div_ceil(WORD).max(1);
        let start = self.used;
        if start + words * WORD <= INLINE_BYTES {
            self.used += words * WORD;
            let base = self.inline.as_mut_ptr().cast::<u8>();
            // SAFETY: start + size is within the inline block.
            return unsafe { NonNull::new_unchecked(base.add(start)) };
        }
        let mut block = vec![0u64; words].into_boxed_slice();
        let ptr = block.as_mut_ptr().cast::<u8>();
        self.overflow.push(block);
        // SAFETY: a boxed slice of at least one word is never null.
        unsafe { NonNull::new_unchecked(ptr) }
    }

    /// Copies `items` into the context.
    pub fn alloc_slice<T: Copy>(&mut self, items: &[T]) -> *mut T {
        debug_assert!(std::mem::align_of::<T>() <= WORD);
        let dst = self.alloc(std::mem::size_of_val(items)).cast::<T>().as_ptr();
        // SAFETY: dst has room for items.len() values and does not overlap.
        unsafe { std::ptr::copy_nonoverlapping(items.as_ptr(), dst, items.len()) };
        dst
    }

    /// Zeroed array of `count` values.
    pub fn alloc_array<T>(&mut self, count: usize) -> *mut T {
        debug_assert!(std::mem::align_of::<T>() <= WORD);
        self.alloc(count * std::mem::size_of::<T>()).cast::<T>().as_ptr()
    }

    pub fn inline_used(&self) -> usize {
        self.used
    }

    pub fn overflow_blocks(&self) -> usize {
        self.overflow.len()
    }
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionContext")
            .field("inline_used", &self.used)
            .field("overflow_blocks", &self.overflow.len())
            .finish()
    }
}
