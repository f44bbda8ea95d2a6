//! Deferred host operations.
//!
//! A deferred operation may still read its parameters after the call that
//! started it returns. Structures converted for such a call are built in the
//! operation's own context instead of the per-call one, so they live until
//! the operation is destroyed.

use std::ptr;

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;
use tracing::debug;
use xthunk_core::registry::{lookup_by_client, register, unregister};
use xthunk_core::{ClientHandle, ConversionContext, VulkanObject};

use crate::funcs::require;
use crate::objects::{HostDeferredOperation, HostDevice};
use crate::HostResult;

/// # Safety
/// `out` writable for one handle.
pub(crate) unsafe fn create_deferred_operation(
    device: &HostDevice,
    out: *mut vk::DeferredOperationKHR,
) -> HostResult<vk::Result> {
    let create = require(device.funcs.create_deferred_operation_khr, "vkCreateDeferredOperationKHR")?;
    let mut handle = vk::DeferredOperationKHR::null();
    // SAFETY: live device.
    let res = unsafe { create(device.handle, ptr::null(), &mut handle) };
    if res != vk::Result::SUCCESS {
        return Ok(res);
    }
    let wrapper = Box::new(HostDeferredOperation {
        obj: VulkanObject::new(handle.as_raw()),
        handle,
        ctx: Mutex::new(ConversionContext::new()),
    });
    // SAFETY: the wrapper address becomes the client handle.
    unsafe {
        let op = register(wrapper, None, Some(&device.instance().registry));
        out.write_unaligned(vk::DeferredOperationKHR::from_raw(op.as_ref().obj.client_handle));
    }
    Ok(vk::Result::SUCCESS)
}

/// # Safety
/// `raw` must be 0 or a live, completed operation of `device`.
pub(crate) unsafe fn destroy_deferred_operation(device: &HostDevice, raw: u64) -> HostResult<()> {
    let Some(handle) = ClientHandle::opaque(raw) else {
        return Ok(());
    };
    let destroy = require(device.funcs.destroy_deferred_operation_khr, "vkDestroyDeferredOperationKHR")?;
    // SAFETY: live per caller.
    unsafe {
        let op = lookup_by_client::<HostDeferredOperation>(handle);
        destroy(device.handle, op.as_ref().handle, ptr::null());
        let wrapper = unregister(op, Some(&device.instance().registry));
        let ctx = wrapper.ctx.lock();
        debug!(
            "destroyed deferred operation {:#x}, released {} scratch bytes",
            wrapper.handle.as_raw(),
            ctx.inline_used()
        );
    }
    Ok(())
}

pub(crate) fn deferred_operation_result(device: &HostDevice, op: &HostDeferredOperation) -> HostResult<vk::Result> {
    let get = require(device.funcs.get_deferred_operation_result_khr, "vkGetDeferredOperationResultKHR")?;
    // SAFETY: live operation.
    Ok(unsafe { get(device.handle, op.handle) })
}

/// Runs `convert` in the context that must own the converted structures:
/// the operation's when one is given, otherwise `local`.
pub(crate) fn with_context<R>(
    op: Option<&HostDeferredOperation>,
    local: &mut ConversionContext,
    convert: impl FnOnce(&mut ConversionContext) -> R,
) -> R {
    match op {
        Some(op) => convert(&mut op.ctx.lock()),
        None => convert(local),
    }
}

/// # Safety
/// `info` must be a host-layout copy info that stays valid for as long as
/// the operation may run.
pub(crate) unsafe fn copy_acceleration_structure(
    device: &HostDevice,
    op: Option<&HostDeferredOperation>,
    info: *const vk::CopyAccelerationStructureInfoKHR<'_>,
) -> HostResult<vk::Result> {
    let copy = require(device.funcs.copy_acceleration_structure_khr, "vkCopyAccelerationStructureKHR")?;
    let op_handle = op.map_or(vk::DeferredOperationKHR::null(), |op| op.handle);
    // SAFETY: forwarded from caller.
    Ok(unsafe { copy(device.handle, op_handle, info) })
}

/// Inline scratch bytes a deferred operation is keeping alive.
///
/// # Safety
/// `raw` must be 0 or a live deferred operation handle from this library.
pub unsafe fn deferred_scratch_bytes(raw: u64) -> Option<usize> {
    let handle = ClientHandle::opaque(raw)?;
    // SAFETY: forwarded from caller.
    let op = unsafe { lookup_by_client::<HostDeferredOperation>(handle).as_ref() };
    let used = op.ctx.lock().inline_used();
    Some(used)
}
