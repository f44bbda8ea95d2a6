//! Client-side dispatchable objects.
//!
//! Each dispatchable handle the application sees is the address of a
//! [`ClientObject`] header allocated here before the host create call. The
//! Vulkan loader overwrites the first word with its dispatch pointer; the
//! host fills the second.

use std::alloc::dealloc;
use std::ptr::NonNull;

use ash::vk;
use xthunk_protocol::client::{alloc_trailing, ClientDevice, ClientInstance, ClientObject};

pub fn alloc_object() -> NonNull<ClientObject> {
    NonNull::from(Box::leak(Box::new(ClientObject::new())))
}

/// # Safety
/// `object` must come from [`alloc_object`] and not be used afterwards.
pub unsafe fn free_object(object: NonNull<ClientObject>) {
    // SAFETY: per caller.
    drop(unsafe { Box::from_raw(object.as_ptr()) });
}

/// Instance header with room for `capacity` physical devices.
pub fn alloc_instance(capacity: u32) -> Option<NonNull<ClientInstance>> {
    // SAFETY: ClientInstance is a trailing-array type.
    let instance = unsafe { alloc_trailing::<ClientInstance>(ClientInstance::layout(capacity as usize), capacity as usize) }?;
    // SAFETY: freshly allocated.
    unsafe { (*instance.as_ptr()).capacity = capacity };
    Some(instance)
}

/// # Safety
/// `instance` must come from [`alloc_instance`] and not be used afterwards.
pub unsafe fn free_instance(instance: NonNull<ClientInstance>) {
    // SAFETY: per caller; capacity is what the allocation was sized for.
    unsafe {
        let capacity = instance.as_ref().capacity as usize;
        dealloc(instance.as_ptr().cast(), ClientInstance::layout(capacity));
    }
}

/// Device header with room for `queue_count` queues.
pub fn alloc_device(queue_count: u32) -> Option<NonNull<ClientDevice>> {
    // SAFETY: ClientDevice is a trailing-array type.
    let device = unsafe { alloc_trailing::<ClientDevice>(ClientDevice::layout(queue_count as usize), queue_count as usize) }?;
    // SAFETY: freshly allocated.
    unsafe { (*device.as_ptr()).queue_count = queue_count };
    Some(device)
}

/// # Safety
/// `device` must come from [`alloc_device`] and not be used afterwards.
pub unsafe fn free_device(device: NonNull<ClientDevice>) {
    // SAFETY: per caller.
    unsafe {
        let queues = device.as_ref().queue_count as usize;
        dealloc(device.as_ptr().cast(), ClientDevice::layout(queues));
    }
}

/// Header behind a dispatchable Vulkan handle.
pub fn header<H: vk::Handle>(handle: H) -> Option<NonNull<ClientObject>> {
    NonNull::new(handle.as_raw() as usize as *mut ClientObject)
}

pub fn raw<T>(ptr: NonNull<T>) -> u64 {
    ptr.as_ptr() as usize as u64
}

/// Total queues requested by a device create info.
///
/// # Safety
/// `info` must be a valid create info.
pub unsafe fn requested_queue_count(info: &vk::DeviceCreateInfo<'_>) -> u32 {
    if info.p_queue_create_infos.is_null() {
        return 0;
    }
    // SAFETY: the create info lists this many entries.
    unsafe { std::slice::from_raw_parts(info.p_queue_create_infos, info.queue_create_info_count as usize) }
        .iter()
        .map(|q| q.queue_count)
        .sum()
}
