//! Host dispatch tables, resolved once per instance or device.
//!
//! Every entry is optional: a driver that lacks an entry point leaves it
//! `None`, and the thunk that needs it reports `NOT_IMPLEMENTED`.

use std::ffi::CStr;

use ash::vk;
use xthunk_protocol::NtStatus;

/// Returns the entry point or logs and yields `NOT_IMPLEMENTED`.
pub(crate) fn require<F>(func: Option<F>, name: &'static str) -> Result<F, NtStatus> {
    func.ok_or_else(|| {
        tracing::error!("host driver has no {}", name);
        NtStatus::NOT_IMPLEMENTED
    })
}

macro_rules! vk_funcs {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($field:ident: $pfn:ident = $sym:expr,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default)]
        pub struct $name {
            $(pub $field: Option<vk::$pfn>,)*
        }

        impl $name {
            /// Resolves every entry through `resolve`.
            ///
            /// # Safety
            /// `resolve` must return pointers whose signatures match the
            /// names asked for.
            pub unsafe fn load(mut resolve: impl FnMut(&CStr) -> vk::PFN_vkVoidFunction) -> Self {
                Self {
                    $($field: resolve($sym).map(|f| {
                        // SAFETY: the driver returned this pointer for this name.
                        unsafe { std::mem::transmute::<unsafe extern "system" fn(), vk::$pfn>(f) }
                    }),)*
                }
            }
        }
    };
}

vk_funcs! {
    /// Entry points callable without an instance.
    pub struct GlobalFuncs {
        create_instance: PFN_vkCreateInstance = c"vkCreateInstance",
        enumerate_instance_version: PFN_vkEnumerateInstanceVersion = c"vkEnumerateInstanceVersion",
        enumerate_instance_extension_properties: PFN_vkEnumerateInstanceExtensionProperties =
            c"vkEnumerateInstanceExtensionProperties",
    }
}

vk_funcs! {
    pub struct InstanceFuncs {
        destroy_instance: PFN_vkDestroyInstance = c"vkDestroyInstance",
        enumerate_physical_devices: PFN_vkEnumeratePhysicalDevices = c"vkEnumeratePhysicalDevices",
        get_physical_device_properties: PFN_vkGetPhysicalDeviceProperties =
            c"vkGetPhysicalDeviceProperties",
        get_physical_device_features2: PFN_vkGetPhysicalDeviceFeatures2 =
            c"vkGetPhysicalDeviceFeatures2",
        enumerate_device_extension_properties: PFN_vkEnumerateDeviceExtensionProperties =
            c"vkEnumerateDeviceExtensionProperties",
        create_device: PFN_vkCreateDevice = c"vkCreateDevice",
        get_device_proc_addr: PFN_vkGetDeviceProcAddr = c"vkGetDeviceProcAddr",
        create_debug_utils_messenger_ext: PFN_vkCreateDebugUtilsMessengerEXT =
            c"vkCreateDebugUtilsMessengerEXT",
        destroy_debug_utils_messenger_ext: PFN_vkDestroyDebugUtilsMessengerEXT =
            c"vkDestroyDebugUtilsMessengerEXT",
    }
}

vk_funcs! {
    pub struct DeviceFuncs {
        destroy_device: PFN_vkDestroyDevice = c"vkDestroyDevice",
        get_device_queue: PFN_vkGetDeviceQueue = c"vkGetDeviceQueue",
        get_device_queue2: PFN_vkGetDeviceQueue2 = c"vkGetDeviceQueue2",
        device_wait_idle: PFN_vkDeviceWaitIdle = c"vkDeviceWaitIdle",
        create_command_pool: PFN_vkCreateCommandPool = c"vkCreateCommandPool",
        destroy_command_pool: PFN_vkDestroyCommandPool = c"vkDestroyCommandPool",
        allocate_command_buffers: PFN_vkAllocateCommandBuffers = c"vkAllocateCommandBuffers",
        free_command_buffers: PFN_vkFreeCommandBuffers = c"vkFreeCommandBuffers",
        begin_command_buffer: PFN_vkBeginCommandBuffer = c"vkBeginCommandBuffer",
        end_command_buffer: PFN_vkEndCommandBuffer = c"vkEndCommandBuffer",
        cmd_draw: PFN_vkCmdDraw = c"vkCmdDraw",
        cmd_draw_indexed: PFN_vkCmdDrawIndexed = c"vkCmdDrawIndexed",
        cmd_dispatch: PFN_vkCmdDispatch = c"vkCmdDispatch",
        cmd_set_line_width: PFN_vkCmdSetLineWidth = c"vkCmdSetLineWidth",
        cmd_set_depth_bias: PFN_vkCmdSetDepthBias = c"vkCmdSetDepthBias",
        cmd_set_stencil_reference: PFN_vkCmdSetStencilReference = c"vkCmdSetStencilReference",
        cmd_set_blend_constants: PFN_vkCmdSetBlendConstants = c"vkCmdSetBlendConstants",
        cmd_bind_pipeline: PFN_vkCmdBindPipeline = c"vkCmdBindPipeline",
        create_fence: PFN_vkCreateFence = c"vkCreateFence",
        destroy_fence: PFN_vkDestroyFence = c"vkDestroyFence",
        wait_for_fences: PFN_vkWaitForFences = c"vkWaitForFences",
        create_semaphore: PFN_vkCreateSemaphore = c"vkCreateSemaphore",
        destroy_semaphore: PFN_vkDestroySemaphore = c"vkDestroySemaphore",
        queue_submit: PFN_vkQueueSubmit = c"vkQueueSubmit",
        queue_wait_idle: PFN_vkQueueWaitIdle = c"vkQueueWaitIdle",
        create_deferred_operation_khr: PFN_vkCreateDeferredOperationKHR =
            c"vkCreateDeferredOperationKHR",
        destroy_deferred_operation_khr: PFN_vkDestroyDeferredOperationKHR =
            c"vkDestroyDeferredOperationKHR",
        get_deferred_operation_result_khr: PFN_vkGetDeferredOperationResultKHR =
            c"vkGetDeferredOperationResultKHR",
        copy_acceleration_structure_khr: PFN_vkCopyAccelerationStructureKHR =
            c"vkCopyAccelerationStructureKHR",
    }
}
