use std::ffi::c_void;
use std::ptr::NonNull;

use ash::vk;
use xthunk_protocol::Ptr32;

use super::space::{read_pod, AddressSpace32};

/// Common head of every extensible structure, as a 32-bit client lays it out.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BaseStructure32 {
    pub s_type: i32,
    pub next: Ptr32,
}

/// First structure in a 32-bit chain (starting at `head` itself) tagged
/// `s_type`. Unrecognized tags are simply walked past.
///
/// # Safety
/// Every link of the chain must address a readable structure.
pub unsafe fn find_next_struct32(
    space: &dyn AddressSpace32,
    head: Ptr32,
    s_type: vk::StructureType,
) -> Option<Ptr32> {
    let mut cur = head;
    while cur != 0 {
        // SAFETY: caller guarantees the link is readable.
        let base: BaseStructure32 = unsafe { read_pod(space, cur) }?;
        if base.s_type == s_type.as_raw() {
            return Some(cur);
        }
        cur = base.next;
    }
    None
}

/// Native-width counterpart of [`find_next_struct32`].
///
/// # Safety
/// Every link of the chain must address a readable structure.
pub unsafe fn find_next_struct(
    head: *const c_void,
    s_type: vk::StructureType,
) -> Option<NonNull<vk::BaseInStructure<'static>>> {
    let mut cur = head.cast::<vk::BaseInStructure<'static>>();
    while let Some(node) = NonNull::new(cur.cast_mut()) {
        // SAFETY: caller guarantees the link is readable.
        let base = unsafe { node.as_ref() };
        if base.s_type == s_type {
            return Some(node);
        }
        cur = base.p_next;
    }
    None
}
