//! Native-width thunks: one per [`FuncCode`](xthunk_protocol::FuncCode).
//!
//! A thunk unpacks its parameter block, resolves client handles to host
//! wrappers, calls the implementation and stores the API result back in
//! the block. The returned status only reports boundary failures.

use std::ffi::c_void;
use std::ptr::NonNull;

use ash::vk;
use ash::vk::Handle;
use xthunk_core::wow64::{schema, ChainReader, Converter};
use xthunk_core::ConversionContext;
use xthunk_protocol::client::ClientObject;
use xthunk_protocol::params::*;
use xthunk_protocol::NtStatus;

use crate::context::HostContext;
use crate::objects::{
    dispatchable, opaque, opaque_or_null, HostCommandBuffer, HostDeferredOperation, HostDevice,
    HostInstance, HostPhysicalDevice, HostQueue, XrHostInstance, XrHostSession, XrHostSpace,
    XrHostSwapchain,
};
use crate::openxr::{self, XrObject};
use crate::{command, debug, deferred, device, gate, instance, sync, HostResult};

/// Defines a thunk over parameter block `$ty`. The body runs in an unsafe
/// context and returns `HostResult<()>`.
macro_rules! thunk {
    ($name:ident($ctx:ident, $p:ident: $ty:ty) $body:block) => {
        #[allow(unused_variables, unused_unsafe)]
        pub(crate) unsafe fn $name($ctx: &HostContext, args: *mut c_void) -> NtStatus {
            // SAFETY: the dispatcher passes the block that matches this
            // code, and the client keeps every pointer in it valid for the
            // duration of the call.
            let run = || -> HostResult<()> {
                let $p = unsafe { &mut *args.cast::<$ty>() };
                unsafe { $body }
            };
            match run() {
                Ok(()) => NtStatus::SUCCESS,
                Err(status) => status,
            }
        }
    };
}
pub(crate) use thunk;

pub(crate) fn addr<T>(ptr: *const T) -> u64 {
    ptr as usize as u64
}

fn header(raw: u64) -> HostResult<NonNull<ClientObject>> {
    NonNull::new(raw as usize as *mut ClientObject).ok_or_else(|| {
        tracing::error!("missing client object");
        NtStatus::INVALID_PARAMETER
    })
}

thunk!(init_vulkan(ctx, p: InitVulkanParams) {
    xthunk_common::logging::init_logging();
    p.result = if ctx.driver().global.create_instance.is_some() {
        vk::Result::SUCCESS
    } else {
        vk::Result::ERROR_INITIALIZATION_FAILED
    };
    Ok(())
});

thunk!(init_openxr(ctx, p: InitOpenxrParams) {
    p.result = openxr::init_openxr(ctx);
    Ok(())
});

thunk!(is_available_instance_function(ctx, p: IsAvailableInstanceFunctionParams) {
    let inst = dispatchable::<HostInstance>(p.instance.as_raw())?;
    p.result = gate::is_available_instance_function(ctx, inst, p.name);
    Ok(())
});

thunk!(is_available_device_function(ctx, p: IsAvailableDeviceFunctionParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    p.result = gate::is_available_device_function(dev, p.name);
    Ok(())
});

thunk!(xr_is_available_instance_function(ctx, p: XrIsAvailableInstanceFunctionParams) {
    let inst = dispatchable::<XrHostInstance>(addr(p.instance))?;
    p.result = gate::xr_is_available_instance_function(ctx, inst, p.name);
    Ok(())
});

thunk!(create_instance(ctx, p: CreateInstanceParams) {
    let client = header(addr(*p.instance))?.cast();
    p.result = instance::create_instance(ctx, p.create_info, p.allocator, client)?;
    Ok(())
});

thunk!(destroy_instance(ctx, p: DestroyInstanceParams) {
    instance::destroy_instance(p.instance.as_raw())
});

thunk!(enumerate_instance_version(ctx, p: EnumerateInstanceVersionParams) {
    p.result = instance::enumerate_instance_version(ctx, p.api_version)?;
    Ok(())
});

thunk!(enumerate_instance_extension_properties(ctx, p: EnumerateInstanceExtensionPropertiesParams) {
    p.result = instance::enumerate_instance_extension_properties(ctx, p.layer_name, p.property_count, p.properties)?;
    Ok(())
});

thunk!(enumerate_physical_devices(ctx, p: EnumeratePhysicalDevicesParams) {
    let inst = dispatchable::<HostInstance>(p.instance.as_raw())?;
    let handles: Vec<vk::PhysicalDevice> = instance::physical_device_handles(inst)
        .into_iter()
        .map(vk::PhysicalDevice::from_raw)
        .collect();
    p.result = instance::fill_array(&handles, p.physical_device_count, p.physical_devices);
    Ok(())
});

thunk!(get_physical_device_properties(ctx, p: GetPhysicalDevicePropertiesParams) {
    let pd = dispatchable::<HostPhysicalDevice>(p.physical_device.as_raw())?;
    instance::get_physical_device_properties(pd, p.properties)
});

thunk!(get_physical_device_features2(ctx, p: GetPhysicalDeviceFeatures2Params) {
    let pd = dispatchable::<HostPhysicalDevice>(p.physical_device.as_raw())?;
    instance::get_physical_device_features2(pd, p.features)
});

thunk!(enumerate_device_extension_properties(ctx, p: EnumerateDeviceExtensionPropertiesParams) {
    let pd = dispatchable::<HostPhysicalDevice>(p.physical_device.as_raw())?;
    p.result = instance::enumerate_device_extension_properties(pd, p.layer_name, p.property_count, p.properties);
    Ok(())
});

thunk!(create_device(ctx, p: CreateDeviceParams) {
    let pd = dispatchable::<HostPhysicalDevice>(p.physical_device.as_raw())?;
    let client = header(addr(*p.device))?.cast();
    p.result = device::create_device(pd, p.create_info, client)?;
    Ok(())
});

thunk!(destroy_device(ctx, p: DestroyDeviceParams) {
    device::destroy_device(p.device.as_raw())
});

thunk!(get_device_queue(ctx, p: GetDeviceQueueParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    *p.queue = vk::Queue::from_raw(device::device_queue(dev, p.queue_family_index, p.queue_index));
    Ok(())
});

thunk!(device_wait_idle(ctx, p: DeviceWaitIdleParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    p.result = device::device_wait_idle(dev)?;
    Ok(())
});

thunk!(create_command_pool(ctx, p: CreateCommandPoolParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    p.result = command::create_command_pool(dev, p.create_info, p.command_pool)?;
    Ok(())
});

thunk!(destroy_command_pool(ctx, p: DestroyCommandPoolParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    command::destroy_command_pool(dev, p.command_pool.as_raw())
});

thunk!(allocate_command_buffers(ctx, p: AllocateCommandBuffersParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    let count = (*p.allocate_info).command_buffer_count as usize;
    let headers = std::slice::from_raw_parts(p.command_buffers, count)
        .iter()
        .map(|cb| header(cb.as_raw()))
        .collect::<HostResult<Vec<_>>>()?;
    p.result = command::allocate_command_buffers(dev, p.allocate_info, &headers)?;
    Ok(())
});

thunk!(free_command_buffers(ctx, p: FreeCommandBuffersParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    let raw: Vec<u64> = if p.command_buffers.is_null() {
        Vec::new()
    } else {
        std::slice::from_raw_parts(p.command_buffers, p.command_buffer_count as usize)
            .iter()
            .map(|cb| cb.as_raw())
            .collect()
    };
    command::free_command_buffers(dev, p.command_pool.as_raw(), &raw)
});

thunk!(begin_command_buffer(ctx, p: BeginCommandBufferParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    p.result = command::begin_command_buffer(cb, p.begin_info)?;
    Ok(())
});

thunk!(end_command_buffer(ctx, p: EndCommandBufferParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    p.result = command::end_command_buffer(cb)?;
    Ok(())
});

thunk!(cmd_draw(ctx, p: CmdDrawParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    command::cmd_draw(cb, p.vertex_count, p.instance_count, p.first_vertex, p.first_instance)
});

thunk!(cmd_draw_indexed(ctx, p: CmdDrawIndexedParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    command::cmd_draw_indexed(
        cb,
        p.index_count,
        p.instance_count,
        p.first_index,
        p.vertex_offset,
        p.first_instance,
    )
});

thunk!(cmd_dispatch(ctx, p: CmdDispatchParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    command::cmd_dispatch(cb, p.group_count_x, p.group_count_y, p.group_count_z)
});

thunk!(cmd_set_line_width(ctx, p: CmdSetLineWidthParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    command::cmd_set_line_width(cb, p.line_width)
});

thunk!(cmd_set_depth_bias(ctx, p: CmdSetDepthBiasParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    command::cmd_set_depth_bias(cb, p.depth_bias_constant_factor, p.depth_bias_clamp, p.depth_bias_slope_factor)
});

thunk!(cmd_set_stencil_reference(ctx, p: CmdSetStencilReferenceParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    command::cmd_set_stencil_reference(cb, p.face_mask, p.reference)
});

thunk!(cmd_set_blend_constants(ctx, p: CmdSetBlendConstantsParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    command::cmd_set_blend_constants(cb, &*p.blend_constants)
});

thunk!(cmd_bind_pipeline(ctx, p: CmdBindPipelineParams) {
    let cb = dispatchable::<HostCommandBuffer>(p.command_buffer.as_raw())?;
    command::cmd_bind_pipeline(cb, p.pipeline_bind_point, p.pipeline)
});

thunk!(create_fence(ctx, p: CreateFenceParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    p.result = sync::create_fence(dev, p.create_info, p.fence)?;
    Ok(())
});

thunk!(destroy_fence(ctx, p: DestroyFenceParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    sync::destroy_fence(dev, p.fence)
});

thunk!(wait_for_fences(ctx, p: WaitForFencesParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    let fences = std::slice::from_raw_parts(p.fences, p.fence_count as usize);
    p.result = sync::wait_for_fences(dev, fences, p.wait_all, p.timeout)?;
    Ok(())
});

thunk!(create_semaphore(ctx, p: CreateSemaphoreParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    p.result = sync::create_semaphore(dev, p.create_info, p.semaphore)?;
    Ok(())
});

thunk!(destroy_semaphore(ctx, p: DestroySemaphoreParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    sync::destroy_semaphore(dev, p.semaphore)
});

// Submit infos name command buffers by client handle; they are rebuilt with
// host handles before reaching the driver.
thunk!(queue_submit(ctx, p: QueueSubmitParams) {
    let queue = dispatchable::<HostQueue>(p.queue.as_raw())?;
    let mut scratch = ConversionContext::new();
    let submits = Converter::new(ChainReader::native(), &mut scratch).convert_array_in(
        addr(p.submits),
        p.submit_count,
        &schema::SUBMIT_INFO,
    );
    p.result = sync::queue_submit(queue, p.submit_count, submits.cast(), p.fence)?;
    Ok(())
});

thunk!(queue_wait_idle(ctx, p: QueueWaitIdleParams) {
    let queue = dispatchable::<HostQueue>(p.queue.as_raw())?;
    p.result = sync::queue_wait_idle(queue)?;
    Ok(())
});

thunk!(create_deferred_operation_khr(ctx, p: CreateDeferredOperationKHRParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    p.result = deferred::create_deferred_operation(dev, p.deferred_operation)?;
    Ok(())
});

thunk!(destroy_deferred_operation_khr(ctx, p: DestroyDeferredOperationKHRParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    deferred::destroy_deferred_operation(dev, p.operation.as_raw())
});

thunk!(get_deferred_operation_result_khr(ctx, p: GetDeferredOperationResultKHRParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    let op = opaque::<HostDeferredOperation>(p.operation.as_raw())?;
    p.result = deferred::deferred_operation_result(dev, op)?;
    Ok(())
});

// Native clients keep the info alive themselves, as the API requires.
thunk!(copy_acceleration_structure_khr(ctx, p: CopyAccelerationStructureKHRParams) {
    let dev = dispatchable::<HostDevice>(p.device.as_raw())?;
    let op = opaque_or_null::<HostDeferredOperation>(p.deferred_operation.as_raw());
    p.result = deferred::copy_acceleration_structure(dev, op, p.info)?;
    Ok(())
});

thunk!(create_debug_utils_messenger_ext(ctx, p: CreateDebugUtilsMessengerEXTParams) {
    let inst = dispatchable::<HostInstance>(p.instance.as_raw())?;
    p.result = debug::create_debug_messenger(inst, p.create_info, p.messenger)?;
    Ok(())
});

thunk!(destroy_debug_utils_messenger_ext(ctx, p: DestroyDebugUtilsMessengerEXTParams) {
    let inst = dispatchable::<HostInstance>(p.instance.as_raw())?;
    debug::destroy_debug_messenger(inst, p.messenger.as_raw())
});

thunk!(xr_enumerate_instance_extension_properties(ctx, p: XrEnumerateInstanceExtensionPropertiesParams) {
    p.result = openxr::enumerate_instance_extension_properties(ctx, p.layer_name, p.capacity, p.count, p.properties)?;
    Ok(())
});

thunk!(xr_create_instance(ctx, p: XrCreateInstanceParams) {
    let client = header(addr(p.instance))?;
    p.result = openxr::create_instance(ctx, p.create_info, client)?;
    Ok(())
});

thunk!(xr_destroy_instance(ctx, p: XrDestroyParams) {
    p.result = openxr::destroy::<XrHostInstance>(addr(p.handle), |f| f.destroy_instance, "xrDestroyInstance")?;
    Ok(())
});

thunk!(xr_create_session(ctx, p: XrCreateChildParams) {
    let inst = dispatchable::<XrHostInstance>(addr(p.parent))?;
    let client = header(addr(p.child))?;
    p.result = openxr::create_child::<_, XrHostSession>(inst, p.create_info, client, inst.funcs.create_session, "xrCreateSession")?;
    Ok(())
});

thunk!(xr_destroy_session(ctx, p: XrDestroyParams) {
    p.result = openxr::destroy::<XrHostSession>(addr(p.handle), |f| f.destroy_session, "xrDestroySession")?;
    Ok(())
});

thunk!(xr_create_swapchain(ctx, p: XrCreateChildParams) {
    let session = dispatchable::<XrHostSession>(addr(p.parent))?;
    let client = header(addr(p.child))?;
    let create = session.xr_instance().funcs.create_swapchain;
    p.result = openxr::create_child::<_, XrHostSwapchain>(session, p.create_info, client, create, "xrCreateSwapchain")?;
    Ok(())
});

thunk!(xr_destroy_swapchain(ctx, p: XrDestroyParams) {
    p.result = openxr::destroy::<XrHostSwapchain>(addr(p.handle), |f| f.destroy_swapchain, "xrDestroySwapchain")?;
    Ok(())
});

thunk!(xr_create_reference_space(ctx, p: XrCreateChildParams) {
    let session = dispatchable::<XrHostSession>(addr(p.parent))?;
    let client = header(addr(p.child))?;
    let create = session.xr_instance().funcs.create_reference_space;
    p.result = openxr::create_child::<_, XrHostSpace>(session, p.create_info, client, create, "xrCreateReferenceSpace")?;
    Ok(())
});

thunk!(xr_destroy_space(ctx, p: XrDestroyParams) {
    p.result = openxr::destroy::<XrHostSpace>(addr(p.handle), |f| f.destroy_space, "xrDestroySpace")?;
    Ok(())
});
