use std::ptr::NonNull;

use bytemuck::Pod;
use parking_lot::Mutex;
use xthunk_protocol::Ptr32;

/// Maps a 32-bit client's pointers into the host address space.
pub trait AddressSpace32: Send + Sync {
    /// Host address of `ptr`; null for 0 or an address outside the space.
    fn widen(&self, ptr: Ptr32) -> *mut u8;

    /// 32-bit address of a host pointer, if it lies in the space.
    fn narrow(&self, ptr: *const u8) -> Option<Ptr32>;
}

/// A real 32-bit process: its addresses are valid host addresses below 4 GiB.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity32;

impl AddressSpace32 for Identity32 {
    fn widen(&self, ptr: Ptr32) -> *mut u8 {
        ptr as usize as *mut u8
    }

    fn narrow(&self, ptr: *const u8) -> Option<Ptr32> {
        u32::try_from(ptr as usize).ok()
    }
}

/// Reserved at the bottom of an arena so no allocation gets address 0.
const ARENA_RESERVED: usize = 16;

/// A self-contained 32-bit address window backed by host memory.
///
/// Addresses are offsets into the window. Used to emulate a 32-bit client's
/// memory when no real one exists (tooling, tests).
pub struct Arena32 {
    base: NonNull<u64>,
    words: usize,
    next: Mutex<usize>,
}

// SAFETY: the arena owns its memory; concurrent access to the same bytes is
// the callers' business, exactly as with a real client address space.
unsafe impl Send for Arena32 {}
unsafe impl Sync for Arena32 {}

impl Arena32 {
    pub fn new(size: usize) -> Self {
        let words = size.div_ceil(8).max(ARENA_RESERVED / 8 + 1);
        let memory = vec![0u64; words].into_boxed_slice();
        let base = NonNull::from(Box::leak(memory)).cast::<u64>();
        Self {
            base,
            words,
            next: Mutex::new(ARENA_RESERVED),
        }
    }

    pub fn len(&self) -> usize {
        self.words * 8
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Zeroed block of `size` bytes. `None` when the arena is exhausted.
    pub fn alloc(&self, size: usize, align: usize) -> Option<Ptr32> {
        let align = align.max(1);
        let mut next = self.next.lock();
        let start = next.checked_next_multiple_of(align)?;
        let end = start.checked_add(size.max(1))?;
        if end > self.len() {
            return None;
        }
        *next = end;
        u32::try_from(start).ok()
    }

    pub fn alloc_value<T: Pod>(&self, value: &T) -> Option<Ptr32> {
        let ptr = self.alloc(std::mem::size_of::<T>(), std::mem::align_of::<T>())?;
        self.write(ptr, value);
        Some(ptr)
    }

    pub fn alloc_slice<T: Pod>(&self, values: &[T]) -> Option<Ptr32> {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        let ptr = self.alloc(bytes.len(), std::mem::align_of::<T>())?;
        self.write_bytes(ptr, bytes);
        Some(ptr)
    }

    /// NUL-terminated copy of `s`.
    pub fn alloc_cstr(&self, s: &str) -> Option<Ptr32> {
        let ptr = self.alloc(s.len() + 1, 1)?;
        self.write_bytes(ptr, s.as_bytes());
        Some(ptr)
    }

    pub fn read<T: Pod>(&self, ptr: Ptr32) -> T {
        let src = self.checked(ptr, std::mem::size_of::<T>());
        // SAFETY: range checked against the arena.
        unsafe { src.cast::<T>().read_unaligned() }
    }

    pub fn write<T: Pod>(&self, ptr: Ptr32, value: &T) {
        self.write_bytes(ptr, bytemuck::bytes_of(value));
    }

    fn write_bytes(&self, ptr: Ptr32, bytes: &[u8]) {
        let dst = self.checked(ptr, bytes.len());
        // SAFETY: range checked against the arena.
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len()) };
    }

    fn checked(&self, ptr: Ptr32, size: usize) -> *mut u8 {
        let start = ptr as usize;
        assert!(
            start != 0 && start + size <= self.len(),
            "arena access {start:#x}+{size} out of bounds"
        );
        // SAFETY: in bounds per the assert above.
        unsafe { self.base.as_ptr().cast::<u8>().add(start) }
    }
}

impl AddressSpace32 for Arena32 {
    fn widen(&self, ptr: Ptr32) -> *mut u8 {
        if ptr == 0 || ptr as usize >= self.len() {
            return std::ptr::null_mut();
        }
        // SAFETY: in bounds.
        unsafe { self.base.as_ptr().cast::<u8>().add(ptr as usize) }
    }

    fn narrow(&self, ptr: *const u8) -> Option<Ptr32> {
        let base = self.base.as_ptr() as usize;
        let addr = ptr as usize;
        if addr <= base || addr >= base + self.len() {
            return None;
        }
        u32::try_from(addr - base).ok()
    }
}

impl Drop for Arena32 {
    fn drop(&mut self) {
        // SAFETY: reconstitutes the boxed slice leaked in `new`.
        unsafe {
            let slice = std::ptr::slice_from_raw_parts_mut(self.base.as_ptr(), self.words);
            drop(Box::from_raw(slice));
        }
    }
}

impl std::fmt::Debug for Arena32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena32")
            .field("len", &self.len())
            .field("used", &*self.next.lock())
            .finish()
    }
}

/// Reads a `T` at a 32-bit address. `None` for a null address.
///
/// # Safety
/// `ptr` must address at least `size_of::<T>()` readable bytes.
pub unsafe fn read_pod<T: Pod>(space: &dyn AddressSpace32, ptr: Ptr32) -> Option<T> {
    let src = space.widen(ptr);
    if src.is_null() {
        return None;
    }
    // SAFETY: caller guarantees the range is readable.
    Some(unsafe { src.cast::<T>().read_unaligned() })
}

/// Writes a `T` at a 32-bit address. Returns false for a null address.
///
/// # Safety
/// `ptr` must address at least `size_of::<T>()` writable bytes.
pub unsafe fn write_pod<T: Pod>(space: &dyn AddressSpace32, ptr: Ptr32, value: T) -> bool {
    let dst = space.widen(ptr);
    if dst.is_null() {
        return false;
    }
    // SAFETY: caller guarantees the range is writable.
    unsafe { dst.cast::<T>().write_unaligned(value) };
    true
}
