//! Thunks for 32-bit clients.
//!
//! Parameter blocks follow the layouts in
//! [`params32`](xthunk_protocol::params32). Structures behind their pointers
//! are converted to host layout first; handles returned to the client are
//! narrowed back into its address space.

use std::ffi::c_void;
use std::mem::size_of;
use std::ptr::{self, NonNull};

use ash::vk;
use ash::vk::Handle;
use tracing::error;
use xthunk_core::wow64::{read_pod, schema, write_pod, ChainReader, Converter};
use xthunk_core::ConversionContext;
use xthunk_protocol::client::ClientObject;
use xthunk_protocol::params32::*;
use xthunk_protocol::xr::XrResult;
use xthunk_protocol::{NtStatus, Ptr32};

use crate::context::HostContext;
use crate::objects::{
    dispatchable, opaque, opaque_or_null, HostCommandBuffer, HostDeferredOperation, HostDevice,
    HostInstance, HostPhysicalDevice, HostQueue,
};
use crate::thunks::thunk;
use crate::{command, deferred, device, gate, instance, openxr, sync, HostResult};

/// Host address of a 32-bit pointer, as a raw handle value.
fn handle(ctx: &HostContext, ptr: Ptr32) -> u64 {
    ctx.space().widen(ptr) as usize as u64
}

fn widen<T>(ctx: &HostContext, ptr: Ptr32) -> *mut T {
    ctx.space().widen(ptr).cast()
}

fn narrow(ctx: &HostContext, raw: u64) -> HostResult<Ptr32> {
    if raw == 0 {
        return Ok(0);
    }
    ctx.space().narrow(raw as usize as *const u8).ok_or_else(|| {
        error!("host object {:#x} lies outside the client address space", raw);
        NtStatus::INVALID_PARAMETER
    })
}

/// Client object whose 32-bit address is stored in the slot at `slot`.
///
/// # Safety
/// `slot` must be 0 or address a readable 32-bit pointer.
unsafe fn client_from_slot<T>(ctx: &HostContext, slot: Ptr32) -> HostResult<NonNull<T>> {
    // SAFETY: forwarded from caller.
    let ptr = unsafe { read_pod::<u32>(ctx.space(), slot) }.unwrap_or(0);
    NonNull::new(widen::<T>(ctx, ptr)).ok_or_else(|| {
        error!("missing client object");
        NtStatus::INVALID_PARAMETER
    })
}

/// # Safety
/// `array` must address `count` readable 32-bit pointers.
unsafe fn read_ptr_array(ctx: &HostContext, array: Ptr32, count: u32) -> Vec<Ptr32> {
    let base = widen::<u32>(ctx, array);
    if base.is_null() {
        return Vec::new();
    }
    // SAFETY: forwarded from caller.
    (0..count as usize).map(|i| unsafe { base.add(i).read_unaligned() }).collect()
}

fn reader(ctx: &HostContext) -> ChainReader<'_> {
    ChainReader::wow64(ctx.space())
}

thunk!(is_available_instance_function(ctx, p: IsAvailableFunctionParams32) {
    let inst = dispatchable::<HostInstance>(handle(ctx, p.handle))?;
    p.result = gate::is_available_instance_function(ctx, inst, widen(ctx, p.name));
    Ok(())
});

thunk!(is_available_device_function(ctx, p: IsAvailableFunctionParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.handle))?;
    p.result = gate::is_available_device_function(dev, widen(ctx, p.name));
    Ok(())
});

thunk!(create_instance(ctx, p: CreateInstanceParams32) {
    let mut scratch = ConversionContext::new();
    let info = Converter::new(reader(ctx), &mut scratch).convert_in(p.create_info as u64, &schema::INSTANCE_CREATE_INFO);
    let client = client_from_slot(ctx, p.instance)?;
    p.result = instance::create_instance(ctx, info.cast(), ptr::null(), client)?;
    Ok(())
});

thunk!(destroy_instance(ctx, p: DestroyParams32) {
    instance::destroy_instance(handle(ctx, p.handle))
});

thunk!(enumerate_instance_version(ctx, p: EnumerateInstanceVersionParams32) {
    p.result = instance::enumerate_instance_version(ctx, widen(ctx, p.api_version))?;
    Ok(())
});

// VkExtensionProperties has the same layout in both widths.
thunk!(enumerate_instance_extension_properties(ctx, p: EnumerateInstanceExtensionPropertiesParams32) {
    p.result = instance::enumerate_instance_extension_properties(
        ctx,
        widen(ctx, p.layer_name),
        widen(ctx, p.property_count),
        widen(ctx, p.properties),
    )?;
    Ok(())
});

thunk!(enumerate_physical_devices(ctx, p: EnumeratePhysicalDevicesParams32) {
    let inst = dispatchable::<HostInstance>(handle(ctx, p.instance))?;
    let handles = instance::physical_device_handles(inst)
        .into_iter()
        .map(|raw| narrow(ctx, raw))
        .collect::<HostResult<Vec<Ptr32>>>()?;
    p.result = instance::fill_array(&handles, widen(ctx, p.physical_device_count), widen(ctx, p.physical_devices));
    Ok(())
});

// The one size_t member of the limits sits at an 8-aligned offset followed
// by an 8-aligned member, so the 32-bit layout matches byte for byte and a
// 32-bit client reads the low half of it.
thunk!(get_physical_device_properties(ctx, p: PhysicalDeviceQueryParams32) {
    let pd = dispatchable::<HostPhysicalDevice>(handle(ctx, p.physical_device))?;
    let dst = widen::<u8>(ctx, p.out);
    if dst.is_null() {
        return Err(NtStatus::INVALID_PARAMETER);
    }
    let mut props = vk::PhysicalDeviceProperties::default();
    instance::get_physical_device_properties(pd, &mut props)?;
    ptr::copy_nonoverlapping(
        ptr::from_ref(&props).cast::<u8>(),
        dst,
        size_of::<vk::PhysicalDeviceProperties>(),
    );
    Ok(())
});

thunk!(get_physical_device_features2(ctx, p: PhysicalDeviceQueryParams32) {
    let pd = dispatchable::<HostPhysicalDevice>(handle(ctx, p.physical_device))?;
    let mut scratch = ConversionContext::new();
    let native = Converter::new(reader(ctx), &mut scratch)
        .convert_in(p.out as u64, &schema::PHYSICAL_DEVICE_FEATURES_2)
        .cast_mut();
    if native.is_null() {
        return Err(NtStatus::INVALID_PARAMETER);
    }
    instance::get_physical_device_features2(pd, native.cast())?;
    xthunk_core::wow64::convert::copy_chain_out(reader(ctx), native, p.out as u64);
    Ok(())
});

thunk!(enumerate_device_extension_properties(ctx, p: EnumerateDeviceExtensionPropertiesParams32) {
    let pd = dispatchable::<HostPhysicalDevice>(handle(ctx, p.physical_device))?;
    p.result = instance::enumerate_device_extension_properties(
        pd,
        widen(ctx, p.layer_name),
        widen(ctx, p.property_count),
        widen(ctx, p.properties),
    );
    Ok(())
});

thunk!(create_device(ctx, p: CreateDeviceParams32) {
    let pd = dispatchable::<HostPhysicalDevice>(handle(ctx, p.physical_device))?;
    let mut scratch = ConversionContext::new();
    let info = Converter::new(reader(ctx), &mut scratch).convert_in(p.create_info as u64, &schema::DEVICE_CREATE_INFO);
    if info.is_null() {
        return Err(NtStatus::INVALID_PARAMETER);
    }
    let client = client_from_slot(ctx, p.device)?;
    p.result = device::create_device(pd, info.cast(), client)?;
    Ok(())
});

thunk!(destroy_device(ctx, p: DestroyParams32) {
    device::destroy_device(handle(ctx, p.handle))
});

thunk!(get_device_queue(ctx, p: GetDeviceQueueParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let queue = narrow(ctx, device::device_queue(dev, p.queue_family_index, p.queue_index))?;
    write_pod(ctx.space(), p.queue, queue);
    Ok(())
});

thunk!(device_wait_idle(ctx, p: HandleResultParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.handle))?;
    p.result = device::device_wait_idle(dev)?;
    Ok(())
});

thunk!(create_command_pool(ctx, p: DeviceCreateParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let mut scratch = ConversionContext::new();
    let info = Converter::new(reader(ctx), &mut scratch).convert_in(p.create_info as u64, &schema::COMMAND_POOL_CREATE_INFO);
    p.result = command::create_command_pool(dev, info.cast(), widen(ctx, p.out))?;
    Ok(())
});

thunk!(destroy_command_pool(ctx, p: DeviceDestroyParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    command::destroy_command_pool(dev, p.handle)
});

thunk!(allocate_command_buffers(ctx, p: AllocateCommandBuffersParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let mut scratch = ConversionContext::new();
    let info = Converter::new(reader(ctx), &mut scratch)
        .convert_in(p.allocate_info as u64, &schema::COMMAND_BUFFER_ALLOCATE_INFO)
        .cast::<vk::CommandBufferAllocateInfo<'_>>();
    if info.is_null() {
        return Err(NtStatus::INVALID_PARAMETER);
    }
    let headers = read_ptr_array(ctx, p.command_buffers, (*info).command_buffer_count)
        .into_iter()
        .map(|ptr| {
            NonNull::new(widen::<ClientObject>(ctx, ptr)).ok_or(NtStatus::INVALID_PARAMETER)
        })
        .collect::<HostResult<Vec<_>>>()?;
    p.result = command::allocate_command_buffers(dev, info, &headers)?;
    Ok(())
});

thunk!(free_command_buffers(ctx, p: FreeCommandBuffersParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let raw: Vec<u64> = read_ptr_array(ctx, p.command_buffers, p.command_buffer_count)
        .into_iter()
        .map(|ptr| handle(ctx, ptr))
        .collect();
    command::free_command_buffers(dev, p.command_pool, &raw)
});

thunk!(begin_command_buffer(ctx, p: BeginCommandBufferParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    let mut scratch = ConversionContext::new();
    let info = Converter::new(reader(ctx), &mut scratch).convert_in(p.begin_info as u64, &schema::COMMAND_BUFFER_BEGIN_INFO);
    p.result = command::begin_command_buffer(cb, info.cast())?;
    Ok(())
});

thunk!(end_command_buffer(ctx, p: HandleResultParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.handle))?;
    p.result = command::end_command_buffer(cb)?;
    Ok(())
});

thunk!(cmd_draw(ctx, p: CmdDrawParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    command::cmd_draw(cb, p.vertex_count, p.instance_count, p.first_vertex, p.first_instance)
});

thunk!(cmd_draw_indexed(ctx, p: CmdDrawIndexedParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    command::cmd_draw_indexed(
        cb,
        p.index_count,
        p.instance_count,
        p.first_index,
        p.vertex_offset,
        p.first_instance,
    )
});

thunk!(cmd_dispatch(ctx, p: CmdDispatchParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    command::cmd_dispatch(cb, p.group_count_x, p.group_count_y, p.group_count_z)
});

thunk!(cmd_set_line_width(ctx, p: CmdSetLineWidthParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    command::cmd_set_line_width(cb, p.line_width)
});

thunk!(cmd_set_depth_bias(ctx, p: CmdSetDepthBiasParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    command::cmd_set_depth_bias(cb, p.depth_bias_constant_factor, p.depth_bias_clamp, p.depth_bias_slope_factor)
});

thunk!(cmd_set_stencil_reference(ctx, p: CmdSetStencilReferenceParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    command::cmd_set_stencil_reference(cb, p.face_mask, p.reference)
});

thunk!(cmd_set_blend_constants(ctx, p: CmdSetBlendConstantsParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    let constants = read_pod::<[f32; 4]>(ctx.space(), p.blend_constants).ok_or(NtStatus::INVALID_PARAMETER)?;
    command::cmd_set_blend_constants(cb, &constants)
});

thunk!(cmd_bind_pipeline(ctx, p: CmdBindPipelineParams32) {
    let cb = dispatchable::<HostCommandBuffer>(handle(ctx, p.command_buffer))?;
    command::cmd_bind_pipeline(cb, p.pipeline_bind_point, vk::Pipeline::from_raw(p.pipeline))
});

thunk!(create_fence(ctx, p: DeviceCreateParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let mut scratch = ConversionContext::new();
    let info = Converter::new(reader(ctx), &mut scratch).convert_in(p.create_info as u64, &schema::FENCE_CREATE_INFO);
    p.result = sync::create_fence(dev, info.cast(), widen(ctx, p.out))?;
    Ok(())
});

thunk!(destroy_fence(ctx, p: DeviceDestroyParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    sync::destroy_fence(dev, vk::Fence::from_raw(p.handle))
});

thunk!(wait_for_fences(ctx, p: WaitForFencesParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let base = widen::<u64>(ctx, p.fences);
    let fences: Vec<vk::Fence> = if base.is_null() {
        Vec::new()
    } else {
        (0..p.fence_count as usize)
            .map(|i| vk::Fence::from_raw(base.add(i).read_unaligned()))
            .collect()
    };
    p.result = sync::wait_for_fences(dev, &fences, p.wait_all, p.timeout)?;
    Ok(())
});

thunk!(create_semaphore(ctx, p: DeviceCreateParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let mut scratch = ConversionContext::new();
    let info = Converter::new(reader(ctx), &mut scratch).convert_in(p.create_info as u64, &schema::SEMAPHORE_CREATE_INFO);
    p.result = sync::create_semaphore(dev, info.cast(), widen(ctx, p.out))?;
    Ok(())
});

thunk!(destroy_semaphore(ctx, p: DeviceDestroyParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    sync::destroy_semaphore(dev, vk::Semaphore::from_raw(p.handle))
});

thunk!(queue_submit(ctx, p: QueueSubmitParams32) {
    let queue = dispatchable::<HostQueue>(handle(ctx, p.queue))?;
    let mut scratch = ConversionContext::new();
    let submits = Converter::new(reader(ctx), &mut scratch).convert_array_in(
        p.submits as u64,
        p.submit_count,
        &schema::SUBMIT_INFO,
    );
    p.result = sync::queue_submit(queue, p.submit_count, submits.cast(), vk::Fence::from_raw(p.fence))?;
    Ok(())
});

thunk!(queue_wait_idle(ctx, p: HandleResultParams32) {
    let queue = dispatchable::<HostQueue>(handle(ctx, p.handle))?;
    p.result = sync::queue_wait_idle(queue)?;
    Ok(())
});

thunk!(create_deferred_operation_khr(ctx, p: CreateDeferredOperationKHRParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    p.result = deferred::create_deferred_operation(dev, widen(ctx, p.deferred_operation))?;
    Ok(())
});

thunk!(destroy_deferred_operation_khr(ctx, p: DeviceDestroyParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    deferred::destroy_deferred_operation(dev, p.handle)
});

thunk!(get_deferred_operation_result_khr(ctx, p: GetDeferredOperationResultKHRParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let op = opaque::<HostDeferredOperation>(p.operation)?;
    p.result = deferred::deferred_operation_result(dev, op)?;
    Ok(())
});

// The converted info must outlive this call when the copy is deferred, so
// it is built in the operation's context.
thunk!(copy_acceleration_structure_khr(ctx, p: CopyAccelerationStructureKHRParams32) {
    let dev = dispatchable::<HostDevice>(handle(ctx, p.device))?;
    let op = opaque_or_null::<HostDeferredOperation>(p.deferred_operation);
    let mut scratch = ConversionContext::new();
    let info = deferred::with_context(op, &mut scratch, |c| {
        Converter::new(reader(ctx), c).convert_in(p.info as u64, &schema::COPY_ACCELERATION_STRUCTURE_INFO_KHR)
    });
    p.result = deferred::copy_acceleration_structure(dev, op, info.cast())?;
    Ok(())
});

thunk!(xr_enumerate_instance_extension_properties(ctx, p: XrEnumerateInstanceExtensionPropertiesParams32) {
    let exts = match openxr::client_extension_list(ctx, widen(ctx, p.layer_name))? {
        Ok(exts) => exts,
        Err(err) => {
            p.result = err;
            return Ok(());
        }
    };
    write_pod(ctx.space(), p.count, exts.len() as u32);
    p.result = if p.capacity == 0 {
        XrResult::SUCCESS
    } else if (p.capacity as usize) < exts.len() {
        XrResult::ERROR_SIZE_INSUFFICIENT
    } else {
        let base = widen::<XrExtensionProperties32>(ctx, p.properties);
        if base.is_null() {
            return Err(NtStatus::INVALID_PARAMETER);
        }
        for (i, props) in exts.iter().enumerate() {
            let dst = &mut *base.add(i);
            dst.extension_name = props.extension_name.map(|c| c as u8);
            dst.extension_version = props.extension_version;
        }
        XrResult::SUCCESS
    };
    Ok(())
});

/// Entry points 32-bit clients cannot reach.
pub(crate) unsafe fn unsupported(_ctx: &HostContext, _args: *mut c_void) -> NtStatus {
    error!("entry point is not available to 32-bit clients");
    NtStatus::NOT_IMPLEMENTED
}
