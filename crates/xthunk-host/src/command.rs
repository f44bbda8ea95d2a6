//! Command pools, command buffers and recording.

use std::ptr::{self, NonNull};

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;
use tracing::{debug, trace};
use xthunk_core::registry::{lookup_by_client, register, unregister};
use xthunk_core::{ClientHandle, VulkanObject};
use xthunk_protocol::client::ClientObject;

use crate::funcs::require;
use crate::objects::{opaque, HostCommandBuffer, HostCommandPool, HostDevice};
use crate::HostResult;

/// # Safety
/// `info` must be a valid create info; `out` writable for one handle.
pub(crate) unsafe fn create_command_pool(
    device: &HostDevice,
    info: *const vk::CommandPoolCreateInfo<'_>,
    out: *mut vk::CommandPool,
) -> HostResult<vk::Result> {
    let create = require(device.funcs.create_command_pool, "vkCreateCommandPool")?;
    let mut handle = vk::CommandPool::null();
    // SAFETY: forwarded from caller.
    let res = unsafe { create(device.handle, info, ptr::null(), &mut handle) };
    if res != vk::Result::SUCCESS {
        return Ok(res);
    }
    let wrapper = Box::new(HostCommandPool {
        obj: VulkanObject::new(handle.as_raw()),
        handle,
        device: NonNull::from(device),
        buffers: Mutex::new(Vec::new()),
    });
    // SAFETY: no client header; the wrapper address becomes the handle.
    let pool = unsafe { register(wrapper, None, Some(&device.instance().registry)) };
    // SAFETY: out per caller; 32-bit clients may only 4-align it.
    unsafe { out.write_unaligned(vk::CommandPool::from_raw(pool.as_ref().obj.client_handle)) };
    trace!("command pool {:#x} -> {:p}", handle.as_raw(), pool);
    Ok(vk::Result::SUCCESS)
}

/// # Safety
/// `raw` must be 0 or a live pool of `device` with no pending work.
pub(crate) unsafe fn destroy_command_pool(device: &HostDevice, raw: u64) -> HostResult<()> {
    let Some(handle) = ClientHandle::opaque(raw) else {
        return Ok(());
    };
    let destroy = require(device.funcs.destroy_command_pool, "vkDestroyCommandPool")?;
    let registry = &device.instance().registry;
    // SAFETY: live per caller.
    unsafe {
        let pool = lookup_by_client::<HostCommandPool>(handle);
        destroy(device.handle, pool.as_ref().handle, ptr::null());
        let wrapper = unregister(pool, Some(registry));
        let buffers = std::mem::take(&mut *wrapper.buffers.lock());
        debug!("destroyed command pool {:#x} with {} buffers", wrapper.handle.as_raw(), buffers.len());
        for cb in buffers {
            drop(unregister(cb, Some(registry)));
        }
    }
    Ok(())
}

/// Allocates host command buffers and binds them to the client headers the
/// stub allocated, one per requested buffer.
///
/// # Safety
/// `info` must be valid with the client's pool handle; `headers` must be
/// live client headers, `info.command_buffer_count` of them.
pub(crate) unsafe fn allocate_command_buffers(
    device: &HostDevice,
    info: *const vk::CommandBufferAllocateInfo<'_>,
    headers: &[NonNull<ClientObject>],
) -> HostResult<vk::Result> {
    let allocate = require(device.funcs.allocate_command_buffers, "vkAllocateCommandBuffers")?;
    // SAFETY: valid per caller.
    let info = unsafe { &*info };
    // SAFETY: the pool handle came from create_command_pool.
    let pool = unsafe { opaque::<HostCommandPool>(info.command_pool.as_raw()) }?;
    debug_assert_eq!(headers.len(), info.command_buffer_count as usize);

    let mut host_info = *info;
    host_info.command_pool = pool.handle;
    let mut handles = vec![vk::CommandBuffer::null(); headers.len()];
    // SAFETY: handles has room for every requested buffer.
    let res = unsafe { allocate(device.handle, &host_info, handles.as_mut_ptr()) };
    if res != vk::Result::SUCCESS {
        return Ok(res);
    }

    let registry = &device.instance().registry;
    let mut buffers = pool.buffers.lock();
    for (handle, header) in handles.into_iter().zip(headers) {
        let wrapper = Box::new(HostCommandBuffer {
            obj: VulkanObject::new(handle.as_raw()),
            handle,
            device: NonNull::from(device),
            pool: NonNull::from(pool),
        });
        // SAFETY: headers are live per caller.
        buffers.push(unsafe { register(wrapper, Some(*header), Some(registry)) });
    }
    Ok(vk::Result::SUCCESS)
}

/// # Safety
/// `buffers` must be null or live client command buffers of the pool.
pub(crate) unsafe fn free_command_buffers(device: &HostDevice, pool_raw: u64, buffers: &[u64]) -> HostResult<()> {
    let free = require(device.funcs.free_command_buffers, "vkFreeCommandBuffers")?;
    // SAFETY: the pool handle came from create_command_pool.
    let pool = unsafe { opaque::<HostCommandPool>(pool_raw) }?;
    let wrappers: Vec<NonNull<HostCommandBuffer>> = buffers
        .iter()
        .filter_map(|raw| ClientHandle::dispatchable(*raw))
        // SAFETY: live per caller.
        .map(|handle| unsafe { lookup_by_client::<HostCommandBuffer>(handle) })
        .collect();
    // SAFETY: live per caller.
    let handles: Vec<vk::CommandBuffer> = wrappers.iter().map(|w| unsafe { w.as_ref() }.handle).collect();
    // SAFETY: every handle belongs to the pool.
    unsafe { free(device.handle, pool.handle, handles.len() as u32, handles.as_ptr()) };

    let registry = &device.instance().registry;
    let mut live = pool.buffers.lock();
    live.retain(|cb| !wrappers.contains(cb));
    for cb in wrappers {
        // SAFETY: unlinked from the pool above.
        drop(unsafe { unregister(cb, Some(registry)) });
    }
    Ok(())
}

pub(crate) unsafe fn begin_command_buffer(
    cb: &HostCommandBuffer,
    info: *const vk::CommandBufferBeginInfo<'_>,
) -> HostResult<vk::Result> {
    let begin = require(cb.device().funcs.begin_command_buffer, "vkBeginCommandBuffer")?;
    // SAFETY: forwarded from caller.
    Ok(unsafe { begin(cb.handle, info) })
}

pub(crate) fn end_command_buffer(cb: &HostCommandBuffer) -> HostResult<vk::Result> {
    let end = require(cb.device().funcs.end_command_buffer, "vkEndCommandBuffer")?;
    // SAFETY: live command buffer.
    Ok(unsafe { end(cb.handle) })
}

pub(crate) fn cmd_draw(
    cb: &HostCommandBuffer,
    vertex_count: u32,
    instance_count: u32,
    first_vertex: u32,
    first_instance: u32,
) -> HostResult<()> {
    let draw = require(cb.device().funcs.cmd_draw, "vkCmdDraw")?;
    // SAFETY: live command buffer in the recording state per API contract.
    unsafe { draw(cb.handle, vertex_count, instance_count, first_vertex, first_instance) };
    Ok(())
}

pub(crate) fn cmd_draw_indexed(
    cb: &HostCommandBuffer,
    index_count: u32,
    instance_count: u32,
    first_index: u32,
    vertex_offset: i32,
    first_instance: u32,
) -> HostResult<()> {
    let draw = require(cb.device().funcs.cmd_draw_indexed, "vkCmdDrawIndexed")?;
    // SAFETY: as above.
    unsafe { draw(cb.handle, index_count, instance_count, first_index, vertex_offset, first_instance) };
    Ok(())
}

pub(crate) fn cmd_dispatch(cb: &HostCommandBuffer, x: u32, y: u32, z: u32) -> HostResult<()> {
    let dispatch = require(cb.device().funcs.cmd_dispatch, "vkCmdDispatch")?;
    // SAFETY: as above.
    unsafe { dispatch(cb.handle, x, y, z) };
    Ok(())
}

pub(crate) fn cmd_set_line_width(cb: &HostCommandBuffer, width: f32) -> HostResult<()> {
    let set = require(cb.device().funcs.cmd_set_line_width, "vkCmdSetLineWidth")?;
    // SAFETY: as above.
    unsafe { set(cb.handle, width) };
    Ok(())
}

pub(crate) fn cmd_set_depth_bias(cb: &HostCommandBuffer, constant: f32, clamp: f32, slope: f32) -> HostResult<()> {
    let set = require(cb.device().funcs.cmd_set_depth_bias, "vkCmdSetDepthBias")?;
    // SAFETY: as above.
    unsafe { set(cb.handle, constant, clamp, slope) };
    Ok(())
}

pub(crate) fn cmd_set_stencil_reference(
    cb: &HostCommandBuffer,
    face_mask: vk::StencilFaceFlags,
    reference: u32,
) -> HostResult<()> {
    let set = require(cb.device().funcs.cmd_set_stencil_reference, "vkCmdSetStencilReference")?;
    // SAFETY: as above.
    unsafe { set(cb.handle, face_mask, reference) };
    Ok(())
}

pub(crate) fn cmd_set_blend_constants(cb: &HostCommandBuffer, constants: &[f32; 4]) -> HostResult<()> {
    let set = require(cb.device().funcs.cmd_set_blend_constants, "vkCmdSetBlendConstants")?;
    // SAFETY: as above.
    unsafe { set(cb.handle, constants) };
    Ok(())
}

pub(crate) fn cmd_bind_pipeline(
    cb: &HostCommandBuffer,
    bind_point: vk::PipelineBindPoint,
    pipeline: vk::Pipeline,
) -> HostResult<()> {
    let bind = require(cb.device().funcs.cmd_bind_pipeline, "vkCmdBindPipeline")?;
    // SAFETY: as above.
    unsafe { bind(cb.handle, bind_point, pipeline) };
    Ok(())
}
