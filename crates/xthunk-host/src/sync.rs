//! Fences, semaphores and queue submission. Fences and semaphores are not
//! wrapped; their handles pass straight through.

use std::ptr;

use ash::vk;

use crate::funcs::require;
use crate::objects::{HostDevice, HostQueue};
use crate::HostResult;

/// # Safety
/// `info` valid; `out` writable for one handle.
pub(crate) unsafe fn create_fence(
    device: &HostDevice,
    info: *const vk::FenceCreateInfo<'_>,
    out: *mut vk::Fence,
) -> HostResult<vk::Result> {
    let create = require(device.funcs.create_fence, "vkCreateFence")?;
    let mut fence = vk::Fence::null();
    // SAFETY: forwarded from caller.
    let res = unsafe { create(device.handle, info, ptr::null(), &mut fence) };
    // SAFETY: out per caller.
    unsafe { out.write_unaligned(fence) };
    Ok(res)
}

pub(crate) fn destroy_fence(device: &HostDevice, fence: vk::Fence) -> HostResult<()> {
    let destroy = require(device.funcs.destroy_fence, "vkDestroyFence")?;
    // SAFETY: the client owns the fence.
    unsafe { destroy(device.handle, fence, ptr::null()) };
    Ok(())
}

pub(crate) fn wait_for_fences(
    device: &HostDevice,
    fences: &[vk::Fence],
    wait_all: vk::Bool32,
    timeout: u64,
) -> HostResult<vk::Result> {
    let wait = require(device.funcs.wait_for_fences, "vkWaitForFences")?;
    // SAFETY: fences belong to the device.
    Ok(unsafe { wait(device.handle, fences.len() as u32, fences.as_ptr(), wait_all, timeout) })
}

/// # Safety
/// `info` valid; `out` writable for one handle.
pub(crate) unsafe fn create_semaphore(
    device: &HostDevice,
    info: *const vk::SemaphoreCreateInfo<'_>,
    out: *mut vk::Semaphore,
) -> HostResult<vk::Result> {
    let create = require(device.funcs.create_semaphore, "vkCreateSemaphore")?;
    let mut semaphore = vk::Semaphore::null();
    // SAFETY: forwarded from caller.
    let res = unsafe { create(device.handle, info, ptr::null(), &mut semaphore) };
    // SAFETY: out per caller.
    unsafe { out.write_unaligned(semaphore) };
    Ok(res)
}

pub(crate) fn destroy_semaphore(device: &HostDevice, semaphore: vk::Semaphore) -> HostResult<()> {
    let destroy = require(device.funcs.destroy_semaphore, "vkDestroySemaphore")?;
    // SAFETY: the client owns the semaphore.
    unsafe { destroy(device.handle, semaphore, ptr::null()) };
    Ok(())
}

/// # Safety
/// `submits` must be `count` host-layout submit infos whose command buffers
/// are already host handles.
pub(crate) unsafe fn queue_submit(
    queue: &HostQueue,
    count: u32,
    submits: *const vk::SubmitInfo<'_>,
    fence: vk::Fence,
) -> HostResult<vk::Result> {
    let submit = require(queue.device().funcs.queue_submit, "vkQueueSubmit")?;
    // SAFETY: forwarded from caller.
    Ok(unsafe { submit(queue.handle, count, submits, fence) })
}

pub(crate) fn queue_wait_idle(queue: &HostQueue) -> HostResult<vk::Result> {
    let wait = require(queue.device().funcs.queue_wait_idle, "vkQueueWaitIdle")?;
    // SAFETY: live queue.
    Ok(unsafe { wait(queue.handle) })
}
