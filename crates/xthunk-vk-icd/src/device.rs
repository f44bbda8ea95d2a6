//! Device and queue stubs.

use std::ptr::NonNull;

use ash::vk;
use ash::vk::Handle;
use tracing::trace;
use xthunk_protocol::client::ClientDevice;
use xthunk_protocol::params::*;
use xthunk_protocol::FuncCode;

use crate::loader::unix_call;
use crate::objects::{alloc_device, free_device, raw, requested_queue_count};

/// Allocates the client device with one queue header per requested queue
/// before crossing; the host fills every header.
#[no_mangle]
pub unsafe extern "system" fn vkCreateDevice(
    physical_device: vk::PhysicalDevice,
    create_info: *const vk::DeviceCreateInfo<'_>,
    allocator: *const vk::AllocationCallbacks<'_>,
    device: *mut vk::Device,
) -> vk::Result {
    // SAFETY: valid per API contract.
    let queues = unsafe { requested_queue_count(&*create_info) };
    let Some(client) = alloc_device(queues) else {
        return vk::Result::ERROR_OUT_OF_HOST_MEMORY;
    };
    let mut slot = client.as_ptr();
    let mut params = CreateDeviceParams {
        physical_device,
        create_info: create_info.cast(),
        allocator: allocator.cast(),
        device: &mut slot,
        result: vk::Result::ERROR_INITIALIZATION_FAILED,
    };
    unix_call(FuncCode::CreateDevice, &mut params);
    if params.result != vk::Result::SUCCESS {
        // SAFETY: the host bound nothing to the header.
        unsafe { free_device(client) };
        return params.result;
    }
    trace!("device {:p} with {} queues", client, queues);
    // SAFETY: out pointer per API contract.
    unsafe { *device = vk::Device::from_raw(raw(client)) };
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyDevice(device: vk::Device, allocator: *const vk::AllocationCallbacks<'_>) {
    let mut params = DestroyDeviceParams {
        device,
        allocator: allocator.cast(),
    };
    unix_call(FuncCode::DestroyDevice, &mut params);
    if let Some(client) = NonNull::new(device.as_raw() as usize as *mut ClientDevice) {
        // SAFETY: the host has dropped the device and its queues.
        unsafe { free_device(client) };
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkGetDeviceQueue(
    device: vk::Device,
    queue_family_index: u32,
    queue_index: u32,
    queue: *mut vk::Queue,
) {
    let mut params = GetDeviceQueueParams {
        device,
        queue_family_index,
        queue_index,
        queue,
    };
    unix_call(FuncCode::GetDeviceQueue, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkDeviceWaitIdle(device: vk::Device) -> vk::Result {
    let mut params = DeviceWaitIdleParams {
        device,
        result: vk::Result::ERROR_DEVICE_LOST,
    };
    unix_call(FuncCode::DeviceWaitIdle, &mut params);
    params.result
}

/// Quirks the host stamped on a client device.
///
/// # Safety
/// `device` must be null or a live client device handle.
pub(crate) unsafe fn quirks(device: vk::Device) -> xthunk_protocol::client::LoaderQuirks {
    match NonNull::new(device.as_raw() as usize as *mut ClientDevice) {
        // SAFETY: live per caller.
        Some(client) => unsafe { client.as_ref() }.quirks(),
        None => xthunk_protocol::client::LoaderQuirks::empty(),
    }
}
