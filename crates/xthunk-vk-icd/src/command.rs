//! Command pool, command buffer and recording stubs.
//!
//! Command buffers are dispatchable, so each one gets a client header here.
//! The host frees its own wrappers when a pool goes away; the headers are
//! tracked per pool so they can be released alongside.

use std::sync::OnceLock;

use ash::vk;
use ash::vk::Handle;
use dashmap::DashMap;
use tracing::{debug, trace};
use xthunk_protocol::params::*;
use xthunk_protocol::fast::pack_f32_pair;
use xthunk_protocol::{fast_args, FastCode, FuncCode};

use crate::loader::{fast_call, fast_path, unix_call};
use crate::objects::{alloc_object, free_object, header, raw};

/// Client command buffer headers per pool handle.
static POOL_BUFFERS: OnceLock<DashMap<u64, Vec<u64>>> = OnceLock::new();

fn pool_buffers() -> &'static DashMap<u64, Vec<u64>> {
    POOL_BUFFERS.get_or_init(DashMap::new)
}

/// Number of command buffer headers the client holds for `pool`.
pub fn live_command_buffers(pool: vk::CommandPool) -> usize {
    pool_buffers().get(&pool.as_raw()).map_or(0, |b| b.len())
}

unsafe fn release(buffers: impl IntoIterator<Item = u64>) {
    for cb in buffers {
        if let Some(obj) = header(vk::CommandBuffer::from_raw(cb)) {
            // SAFETY: the host no longer references the header.
            unsafe { free_object(obj) };
        }
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateCommandPool(
    device: vk::Device,
    create_info: *const vk::CommandPoolCreateInfo<'_>,
    allocator: *const vk::AllocationCallbacks<'_>,
    command_pool: *mut vk::CommandPool,
) -> vk::Result {
    let mut params = CreateCommandPoolParams {
        device,
        create_info: create_info.cast(),
        allocator: allocator.cast(),
        command_pool,
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::CreateCommandPool, &mut params);
    if params.result == vk::Result::SUCCESS {
        // SAFETY: written by the host.
        let pool = unsafe { *command_pool };
        pool_buffers().insert(pool.as_raw(), Vec::new());
    }
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyCommandPool(
    device: vk::Device,
    command_pool: vk::CommandPool,
    allocator: *const vk::AllocationCallbacks<'_>,
) {
    let mut params = DestroyCommandPoolParams {
        device,
        command_pool,
        allocator: allocator.cast(),
    };
    unix_call(FuncCode::DestroyCommandPool, &mut params);
    if let Some((_, buffers)) = pool_buffers().remove(&command_pool.as_raw()) {
        debug!("pool {:#x} released {} command buffers", command_pool.as_raw(), buffers.len());
        // SAFETY: the host unregistered every buffer of the pool.
        unsafe { release(buffers) };
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkAllocateCommandBuffers(
    device: vk::Device,
    allocate_info: *const vk::CommandBufferAllocateInfo<'_>,
    command_buffers: *mut vk::CommandBuffer,
) -> vk::Result {
    // SAFETY: valid per API contract.
    let info = unsafe { &*allocate_info };
    let count = info.command_buffer_count as usize;
    if count == 0 {
        return vk::Result::SUCCESS;
    }
    // SAFETY: the caller provides room for `count` handles.
    let out = unsafe { std::slice::from_raw_parts_mut(command_buffers, count) };
    for slot in out.iter_mut() {
        *slot = vk::CommandBuffer::from_raw(raw(alloc_object()));
    }

    let mut params = AllocateCommandBuffersParams {
        device,
        allocate_info: allocate_info.cast(),
        command_buffers,
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::AllocateCommandBuffers, &mut params);

    if params.result != vk::Result::SUCCESS {
        // SAFETY: the host bound none of the headers.
        unsafe { release(out.iter().map(|cb| cb.as_raw())) };
        out.fill(vk::CommandBuffer::null());
        return params.result;
    }
    pool_buffers()
        .entry(info.command_pool.as_raw())
        .or_default()
        .extend(out.iter().map(|cb| cb.as_raw()));
    trace!("allocated {} command buffers", count);
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkFreeCommandBuffers(
    device: vk::Device,
    command_pool: vk::CommandPool,
    command_buffer_count: u32,
    command_buffers: *const vk::CommandBuffer,
) {
    let mut params = FreeCommandBuffersParams {
        device,
        command_pool,
        command_buffer_count,
        command_buffers,
    };
    unix_call(FuncCode::FreeCommandBuffers, &mut params);
    if command_buffers.is_null() {
        return;
    }
    // SAFETY: the caller passes this many handles.
    let freed = unsafe { std::slice::from_raw_parts(command_buffers, command_buffer_count as usize) };
    let freed: Vec<u64> = freed.iter().map(|cb| cb.as_raw()).filter(|raw| *raw != 0).collect();
    if let Some(mut live) = pool_buffers().get_mut(&command_pool.as_raw()) {
        live.retain(|cb| !freed.contains(cb));
    }
    // SAFETY: the host unregistered these buffers.
    unsafe { release(freed) };
}

#[no_mangle]
pub unsafe extern "system" fn vkBeginCommandBuffer(
    command_buffer: vk::CommandBuffer,
    begin_info: *const vk::CommandBufferBeginInfo<'_>,
) -> vk::Result {
    let mut params = BeginCommandBufferParams {
        command_buffer,
        begin_info: begin_info.cast(),
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::BeginCommandBuffer, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkEndCommandBuffer(command_buffer: vk::CommandBuffer) -> vk::Result {
    let mut params = EndCommandBufferParams {
        command_buffer,
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::EndCommandBuffer, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDraw(
    command_buffer: vk::CommandBuffer,
    vertex_count: u32,
    instance_count: u32,
    first_vertex: u32,
    first_instance: u32,
) {
    if fast_path() {
        return fast_call(
            FastCode::CmdDraw,
            fast_args![command_buffer, vertex_count, instance_count, first_vertex, first_instance],
        );
    }
    let mut params = CmdDrawParams {
        command_buffer,
        vertex_count,
        instance_count,
        first_vertex,
        first_instance,
    };
    unix_call(FuncCode::CmdDraw, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDrawIndexed(
    command_buffer: vk::CommandBuffer,
    index_count: u32,
    instance_count: u32,
    first_index: u32,
    vertex_offset: i32,
    first_instance: u32,
) {
    if fast_path() {
        return fast_call(
            FastCode::CmdDrawIndexed,
            fast_args![command_buffer, index_count, instance_count, first_index, vertex_offset, first_instance],
        );
    }
    let mut params = CmdDrawIndexedParams {
        command_buffer,
        index_count,
        instance_count,
        first_index,
        vertex_offset,
        first_instance,
    };
    unix_call(FuncCode::CmdDrawIndexed, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDispatch(
    command_buffer: vk::CommandBuffer,
    group_count_x: u32,
    group_count_y: u32,
    group_count_z: u32,
) {
    if fast_path() {
        return fast_call(
            FastCode::CmdDispatch,
            fast_args![command_buffer, group_count_x, group_count_y, group_count_z],
        );
    }
    let mut params = CmdDispatchParams {
        command_buffer,
        group_count_x,
        group_count_y,
        group_count_z,
    };
    unix_call(FuncCode::CmdDispatch, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetLineWidth(command_buffer: vk::CommandBuffer, line_width: f32) {
    if fast_path() {
        return fast_call(FastCode::CmdSetLineWidth, fast_args![command_buffer, line_width]);
    }
    let mut params = CmdSetLineWidthParams {
        command_buffer,
        line_width,
    };
    unix_call(FuncCode::CmdSetLineWidth, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetDepthBias(
    command_buffer: vk::CommandBuffer,
    depth_bias_constant_factor: f32,
    depth_bias_clamp: f32,
    depth_bias_slope_factor: f32,
) {
    if fast_path() {
        return fast_call(
            FastCode::CmdSetDepthBias,
            fast_args![command_buffer, depth_bias_constant_factor, depth_bias_clamp, depth_bias_slope_factor],
        );
    }
    let mut params = CmdSetDepthBiasParams {
        command_buffer,
        depth_bias_constant_factor,
        depth_bias_clamp,
        depth_bias_slope_factor,
    };
    unix_call(FuncCode::CmdSetDepthBias, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetStencilReference(
    command_buffer: vk::CommandBuffer,
    face_mask: vk::StencilFaceFlags,
    reference: u32,
) {
    if fast_path() {
        return fast_call(FastCode::CmdSetStencilReference, fast_args![command_buffer, face_mask, reference]);
    }
    let mut params = CmdSetStencilReferenceParams {
        command_buffer,
        face_mask,
        reference,
    };
    unix_call(FuncCode::CmdSetStencilReference, &mut params);
}

/// The four constants travel as two packed float pairs on the fast path.
#[no_mangle]
pub unsafe extern "system" fn vkCmdSetBlendConstants(command_buffer: vk::CommandBuffer, blend_constants: *const [f32; 4]) {
    if fast_path() {
        // SAFETY: the array is valid per API contract.
        let [r, g, b, a] = unsafe { *blend_constants };
        let rg = pack_f32_pair(r, g);
        let ba = pack_f32_pair(b, a);
        return fast_call(FastCode::CmdSetBlendConstants, fast_args![command_buffer, rg, ba]);
    }
    let mut params = CmdSetBlendConstantsParams {
        command_buffer,
        blend_constants,
    };
    unix_call(FuncCode::CmdSetBlendConstants, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdBindPipeline(
    command_buffer: vk::CommandBuffer,
    pipeline_bind_point: vk::PipelineBindPoint,
    pipeline: vk::Pipeline,
) {
    if fast_path() {
        return fast_call(
            FastCode::CmdBindPipeline,
            fast_args![command_buffer, pipeline_bind_point, pipeline],
        );
    }
    let mut params = CmdBindPipelineParams {
        command_buffer,
        pipeline_bind_point,
        pipeline,
    };
    unix_call(FuncCode::CmdBindPipeline, &mut params);
}
