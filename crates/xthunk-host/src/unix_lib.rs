//! The host side of the boundary: function tables and the dispatcher that
//! indexes them.

use std::ffi::c_void;

use tracing::{info, trace, warn};
use xthunk_core::wow64::Width;
use xthunk_core::ThunkConfig;
use xthunk_protocol::{
    DispatchError, FastArgs, FastCode, FuncCode, NtStatus, TableSignature, UnixCallDispatcher,
};

use crate::context::HostContext;
use crate::driver::{HostDriver, XrDriver};
use crate::error::HostError;
use crate::{fast, thunks, thunks32};

pub(crate) type UnixFunc = unsafe fn(&HostContext, *mut c_void) -> NtStatus;

#[derive(Clone, Copy)]
pub(crate) struct UnixEntry {
    pub code: FuncCode,
    pub func: UnixFunc,
}

macro_rules! unix_table {
    ($($code:ident => $func:path,)*) => {
        [$(UnixEntry { code: FuncCode::$code, func: $func },)*]
    };
}

pub(crate) static UNIX_FUNCS: [UnixEntry; FuncCode::COUNT] = unix_table! {
    InitVulkan => thunks::init_vulkan,
    InitOpenxr => thunks::init_openxr,
    IsAvailableInstanceFunction => thunks::is_available_instance_function,
    IsAvailableDeviceFunction => thunks::is_available_device_function,
    XrIsAvailableInstanceFunction => thunks::xr_is_available_instance_function,
    CreateInstance => thunks::create_instance,
    DestroyInstance => thunks::destroy_instance,
    EnumerateInstanceVersion => thunks::enumerate_instance_version,
    EnumerateInstanceExtensionProperties => thunks::enumerate_instance_extension_properties,
    EnumeratePhysicalDevices => thunks::enumerate_physical_devices,
    GetPhysicalDeviceProperties => thunks::get_physical_device_properties,
    GetPhysicalDeviceFeatures2 => thunks::get_physical_device_features2,
    EnumerateDeviceExtensionProperties => thunks::enumerate_device_extension_properties,
    CreateDevice => thunks::create_device,
    DestroyDevice => thunks::destroy_device,
    GetDeviceQueue => thunks::get_device_queue,
    DeviceWaitIdle => thunks::device_wait_idle,
    CreateCommandPool => thunks::create_command_pool,
    DestroyCommandPool => thunks::destroy_command_pool,
    AllocateCommandBuffers => thunks::allocate_command_buffers,
    FreeCommandBuffers => thunks::free_command_buffers,
    BeginCommandBuffer => thunks::begin_command_buffer,
    EndCommandBuffer => thunks::end_command_buffer,
    CmdDraw => thunks::cmd_draw,
    CmdDrawIndexed => thunks::cmd_draw_indexed,
    CmdDispatch => thunks::cmd_dispatch,
    CmdSetLineWidth => thunks::cmd_set_line_width,
    CmdSetDepthBias => thunks::cmd_set_depth_bias,
    CmdSetStencilReference => thunks::cmd_set_stencil_reference,
    CmdSetBlendConstants => thunks::cmd_set_blend_constants,
    CmdBindPipeline => thunks::cmd_bind_pipeline,
    CreateFence => thunks::create_fence,
    DestroyFence => thunks::destroy_fence,
    WaitForFences => thunks::wait_for_fences,
    CreateSemaphore => thunks::create_semaphore,
    DestroySemaphore => thunks::destroy_semaphore,
    QueueSubmit => thunks::queue_submit,
    QueueWaitIdle => thunks::queue_wait_idle,
    CreateDeferredOperationKHR => thunks::create_deferred_operation_khr,
    DestroyDeferredOperationKHR => thunks::destroy_deferred_operation_khr,
    GetDeferredOperationResultKHR => thunks::get_deferred_operation_result_khr,
    CopyAccelerationStructureKHR => thunks::copy_acceleration_structure_khr,
    CreateDebugUtilsMessengerEXT => thunks::create_debug_utils_messenger_ext,
    DestroyDebugUtilsMessengerEXT => thunks::destroy_debug_utils_messenger_ext,
    XrEnumerateInstanceExtensionProperties => thunks::xr_enumerate_instance_extension_properties,
    XrCreateInstance => thunks::xr_create_instance,
    XrDestroyInstance => thunks::xr_destroy_instance,
    XrCreateSession => thunks::xr_create_session,
    XrDestroySession => thunks::xr_destroy_session,
    XrCreateSwapchain => thunks::xr_create_swapchain,
    XrDestroySwapchain => thunks::xr_destroy_swapchain,
    XrCreateReferenceSpace => thunks::xr_create_reference_space,
    XrDestroySpace => thunks::xr_destroy_space,
};

pub(crate) static WOW64_FUNCS: [UnixEntry; FuncCode::COUNT] = unix_table! {
    InitVulkan => thunks::init_vulkan,
    InitOpenxr => thunks::init_openxr,
    IsAvailableInstanceFunction => thunks32::is_available_instance_function,
    IsAvailableDeviceFunction => thunks32::is_available_device_function,
    XrIsAvailableInstanceFunction => thunks32::unsupported,
    CreateInstance => thunks32::create_instance,
    DestroyInstance => thunks32::destroy_instance,
    EnumerateInstanceVersion => thunks32::enumerate_instance_version,
    EnumerateInstanceExtensionProperties => thunks32::enumerate_instance_extension_properties,
    EnumeratePhysicalDevices => thunks32::enumerate_physical_devices,
    GetPhysicalDeviceProperties => thunks32::get_physical_device_properties,
    GetPhysicalDeviceFeatures2 => thunks32::get_physical_device_features2,
    EnumerateDeviceExtensionProperties => thunks32::enumerate_device_extension_properties,
    CreateDevice => thunks32::create_device,
    DestroyDevice => thunks32::destroy_device,
    GetDeviceQueue => thunks32::get_device_queue,
    DeviceWaitIdle => thunks32::device_wait_idle,
    CreateCommandPool => thunks32::create_command_pool,
    DestroyCommandPool => thunks32::destroy_command_pool,
    AllocateCommandBuffers => thunks32::allocate_command_buffers,
    FreeCommandBuffers => thunks32::free_command_buffers,
    BeginCommandBuffer => thunks32::begin_command_buffer,
    EndCommandBuffer => thunks32::end_command_buffer,
    CmdDraw => thunks32::cmd_draw,
    CmdDrawIndexed => thunks32::cmd_draw_indexed,
    CmdDispatch => thunks32::cmd_dispatch,
    CmdSetLineWidth => thunks32::cmd_set_line_width,
    CmdSetDepthBias => thunks32::cmd_set_depth_bias,
    CmdSetStencilReference => thunks32::cmd_set_stencil_reference,
    CmdSetBlendConstants => thunks32::cmd_set_blend_constants,
    CmdBindPipeline => thunks32::cmd_bind_pipeline,
    CreateFence => thunks32::create_fence,
    DestroyFence => thunks32::destroy_fence,
    WaitForFences => thunks32::wait_for_fences,
    CreateSemaphore => thunks32::create_semaphore,
    DestroySemaphore => thunks32::destroy_semaphore,
    QueueSubmit => thunks32::queue_submit,
    QueueWaitIdle => thunks32::queue_wait_idle,
    CreateDeferredOperationKHR => thunks32::create_deferred_operation_khr,
    DestroyDeferredOperationKHR => thunks32::destroy_deferred_operation_khr,
    GetDeferredOperationResultKHR => thunks32::get_deferred_operation_result_khr,
    CopyAccelerationStructureKHR => thunks32::copy_acceleration_structure_khr,
    CreateDebugUtilsMessengerEXT => thunks32::unsupported,
    DestroyDebugUtilsMessengerEXT => thunks32::unsupported,
    XrEnumerateInstanceExtensionProperties => thunks32::xr_enumerate_instance_extension_properties,
    XrCreateInstance => thunks32::unsupported,
    XrDestroyInstance => thunks32::unsupported,
    XrCreateSession => thunks32::unsupported,
    XrDestroySession => thunks32::unsupported,
    XrCreateSwapchain => thunks32::unsupported,
    XrDestroySwapchain => thunks32::unsupported,
    XrCreateReferenceSpace => thunks32::unsupported,
    XrDestroySpace => thunks32::unsupported,
};

/// Slot `i` must hold the entry for code `i`.
pub(crate) fn verify_table(table: &[UnixEntry]) -> Result<(), DispatchError> {
    for (index, entry) in table.iter().enumerate() {
        let expected = FuncCode::from_raw(index as u32);
        if expected != Some(entry.code) {
            return Err(DispatchError::TableOrder {
                index,
                expected: expected.map_or("<none>", FuncCode::name),
                found: entry.code.name(),
            });
        }
    }
    Ok(())
}

/// The host library as one dispatcher. Serves either native or 32-bit
/// parameter blocks, never both.
pub struct UnixLib {
    ctx: HostContext,
    table: &'static [UnixEntry],
    width: Width,
}

impl UnixLib {
    /// Dispatcher for native-width clients.
    pub fn new(ctx: HostContext) -> Result<Self, HostError> {
        Self::build(ctx, &UNIX_FUNCS, Width::NATIVE)
    }

    /// Dispatcher for 32-bit clients; pointers resolve through the
    /// context's address space.
    pub fn wow64(ctx: HostContext) -> Result<Self, HostError> {
        Self::build(ctx, &WOW64_FUNCS, Width::W32)
    }

    /// Opens the configured host loaders and builds the dispatcher the
    /// configuration asks for. A missing OpenXR runtime only disables
    /// OpenXR.
    pub fn from_config(config: &ThunkConfig) -> Result<Self, HostError> {
        let driver = HostDriver::load(&config.host.vulkan_library)?;
        let mut ctx = HostContext::new(driver, config.clone());
        if let Some(path) = &config.host.openxr_library {
            match XrDriver::load(path) {
                Ok(xr) => ctx = ctx.with_openxr(xr),
                Err(e) => warn!("OpenXR disabled: {}", e),
            }
        }
        if config.dispatch.wow64 {
            Self::wow64(ctx)
        } else {
            Self::new(ctx)
        }
    }

    fn build(ctx: HostContext, table: &'static [UnixEntry], width: Width) -> Result<Self, HostError> {
        verify_table(table)?;
        info!(
            "host dispatcher ready: {} entry points, {:?} clients, OpenXR {}",
            table.len(),
            width,
            if ctx.xr().is_some() { "available" } else { "unavailable" }
        );
        Ok(Self { ctx, table, width })
    }

    pub fn context(&self) -> &HostContext {
        &self.ctx
    }

    pub fn width(&self) -> Width {
        self.width
    }
}

impl UnixCallDispatcher for UnixLib {
    fn signature(&self) -> TableSignature {
        TableSignature::current()
    }

    unsafe fn call(&self, code: FuncCode, params: *mut c_void) -> NtStatus {
        let Some(entry) = self.table.get(code.as_raw() as usize) else {
            return NtStatus::NOT_IMPLEMENTED;
        };
        trace!("{}", code.name());
        // SAFETY: the table is verified, so the entry matches `code`; the
        // block is valid per the trait contract.
        unsafe { (entry.func)(&self.ctx, params) }
    }

    unsafe fn fast_call(&self, code: FastCode, args: FastArgs) -> NtStatus {
        trace!("fast {}", code.name());
        // SAFETY: forwarded from the trait contract.
        unsafe { fast::fast_call(&self.ctx, self.width, code, &args) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_in_code_order() {
        verify_table(&UNIX_FUNCS).unwrap();
        verify_table(&WOW64_FUNCS).unwrap();
    }

    #[test]
    fn misordered_table_is_rejected() {
        let mut table = UNIX_FUNCS;
        table.swap(3, 4);
        let err = verify_table(&table).unwrap_err();
        assert!(matches!(err, DispatchError::TableOrder { index: 3, .. }));
    }
}
