//! Client-side object layouts shared with the host.
//!
//! Every dispatchable handle handed to the application points at a
//! [`ClientObject`] header. The Vulkan loader expects the first word to be
//! the ICD magic at creation and then replaces it with its own dispatch
//! pointer; the second word names the host wrapper.
//!
//! Both fields are 64 bits wide so 32-bit and 64-bit clients share the
//! layout.

use std::alloc::Layout;
use std::ptr::{addr_of_mut, NonNull};

/// The ICD loader magic value. The loader expects this in new dispatchable handles.
pub const LOADER_MAGIC: u64 = 0x01CD_C0DE;

#[repr(C)]
#[derive(Debug)]
pub struct ClientObject {
    pub loader_magic: u64,
    /// Address of the host wrapper, written by the host during creation.
    pub unix_handle: u64,
}

impl ClientObject {
    pub const fn new() -> Self {
        Self {
            loader_magic: LOADER_MAGIC,
            unix_handle: 0,
        }
    }
}

impl Default for ClientObject {
    fn default() -> Self {
        Self::new()
    }
}

bitflags::bitflags! {
    /// Per-device behavior switches applied by the client stubs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LoaderQuirks: u32 {
        /// `vkGetDeviceProcAddr` also answers instance-level names.
        const GET_DEVICE_PROC_ADDR = 0x0000_0001;
    }
}

/// Instance header followed by `capacity` physical device headers.
///
/// The host writes the real physical device count into `phys_dev_count`.
/// When it exceeds `capacity` the host fails the creation and the client
/// retries with a larger allocation.
#[repr(C)]
#[derive(Debug)]
pub struct ClientInstance {
    pub obj: ClientObject,
    pub phys_dev_count: u32,
    pub capacity: u32,
    phys_devs: [ClientObject; 0],
}

impl ClientInstance {
    pub fn layout(capacity: usize) -> Layout {
        trailing_layout::<Self>(capacity)
    }

    /// # Safety
    /// `this` must point to an instance allocated with at least
    /// `index + 1` trailing slots.
    pub unsafe fn phys_dev(this: NonNull<Self>, index: usize) -> NonNull<ClientObject> {
        // SAFETY: caller guarantees the trailing array holds `index`.
        unsafe {
            let base = addr_of_mut!((*this.as_ptr()).phys_devs).cast::<ClientObject>();
            NonNull::new_unchecked(base.add(index))
        }
    }
}

/// Device header followed by `queue_count` queue headers.
#[repr(C)]
#[derive(Debug)]
pub struct ClientDevice {
    pub obj: ClientObject,
    pub quirks: u32,
    pub queue_count: u32,
    queues: [ClientObject; 0],
}

impl ClientDevice {
    pub fn layout(queue_count: usize) -> Layout {
        trailing_layout::<Self>(queue_count)
    }

    pub fn quirks(&self) -> LoaderQuirks {
        LoaderQuirks::from_bits_truncate(self.quirks)
    }

    /// # Safety
    /// `this` must point to a device allocated with at least `index + 1`
    /// trailing queue slots.
    pub unsafe fn queue(this: NonNull<Self>, index: usize) -> NonNull<ClientObject> {
        // SAFETY: caller guarantees the trailing array holds `index`.
        unsafe {
            let base = addr_of_mut!((*this.as_ptr()).queues).cast::<ClientObject>();
            NonNull::new_unchecked(base.add(index))
        }
    }
}

fn trailing_layout<T>(count: usize) -> Layout {
    let size = std::mem::size_of::<T>() + count * std::mem::size_of::<ClientObject>();
    // Header alignment is 8 and the size is a multiple of 8.
    Layout::from_size_align(size, std::mem::align_of::<T>())
        .unwrap_or_else(|_| Layout::new::<T>())
}

/// Allocates a zeroed trailing-array object and stamps every header with the
/// loader magic. Returns `None` on allocation failure.
///
/// # Safety
/// `T` must be one of the trailing-array client types of this module.
pub unsafe fn alloc_trailing<T>(layout: Layout, headers: usize) -> Option<NonNull<T>> {
    // SAFETY: layout has non-zero size (at least one header).
    let raw = unsafe { std::alloc::alloc_zeroed(layout) };
    let ptr = NonNull::new(raw)?;
    let first = ptr.cast::<ClientObject>();
    // The object header comes first.
    unsafe { first.as_ptr().write(ClientObject::new()) };
    let trailing = unsafe {
        raw.add(std::mem::size_of::<T>()).cast::<ClientObject>()
    };
    for i in 0..headers {
        unsafe { trailing.add(i).write(ClientObject::new()) };
    }
    Some(ptr.cast())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_first_and_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<ClientObject>(), 16);
        assert_eq!(std::mem::offset_of!(ClientInstance, obj), 0);
        assert_eq!(std::mem::offset_of!(ClientDevice, obj), 0);
        assert_eq!(std::mem::size_of::<ClientInstance>(), 24);
    }

    #[test]
    fn trailing_slots_are_stamped() {
        let layout = ClientInstance::layout(3);
        let inst = unsafe { alloc_trailing::<ClientInstance>(layout, 3) }.unwrap();
        for i in 0..3 {
            let pd = unsafe { ClientInstance::phys_dev(inst, i) };
            assert_eq!(unsafe { pd.as_ref() }.loader_magic, LOADER_MAGIC);
        }
        unsafe { std::alloc::dealloc(inst.as_ptr().cast(), layout) };
    }
}
