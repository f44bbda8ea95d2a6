//! Native-width parameter blocks, one per [`FuncCode`](crate::FuncCode).
//!
//! Fields follow the entry point's argument order; value-returning entry
//! points end with `result`. Output pointers are carried as pointers so the
//! host writes straight into caller memory.

use std::ffi::{c_char, c_void};

use ash::vk;

use crate::client::{ClientDevice, ClientInstance, ClientObject};
use crate::xr::{XrExtensionProperties, XrResult};

type Alloc = *const vk::AllocationCallbacks<'static>;

#[repr(C)]
pub struct InitVulkanParams {
    pub result: vk::Result,
}

#[repr(C)]
pub struct InitOpenxrParams {
    pub result: XrResult,
}

#[repr(C)]
pub struct IsAvailableInstanceFunctionParams {
    pub instance: vk::Instance,
    pub name: *const c_char,
    pub result: vk::Bool32,
}

#[repr(C)]
pub struct IsAvailableDeviceFunctionParams {
    pub device: vk::Device,
    pub name: *const c_char,
    pub result: vk::Bool32,
}

#[repr(C)]
pub struct XrIsAvailableInstanceFunctionParams {
    pub instance: *mut ClientObject,
    pub name: *const c_char,
    pub result: vk::Bool32,
}

#[repr(C)]
pub struct CreateInstanceParams {
    pub create_info: *const vk::InstanceCreateInfo<'static>,
    pub allocator: Alloc,
    /// Holds the client instance allocated by the stub on entry.
    pub instance: *mut *mut ClientInstance,
    pub result: vk::Result,
}

#[repr(C)]
pub struct DestroyInstanceParams {
    pub instance: vk::Instance,
    pub allocator: Alloc,
}

#[repr(C)]
pub struct EnumerateInstanceVersionParams {
    pub api_version: *mut u32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct EnumerateInstanceExtensionPropertiesParams {
    pub layer_name: *const c_char,
    pub property_count: *mut u32,
    pub properties: *mut vk::ExtensionProperties,
    pub result: vk::Result,
}

#[repr(C)]
pub struct EnumeratePhysicalDevicesParams {
    pub instance: vk::Instance,
    pub physical_device_count: *mut u32,
    pub physical_devices: *mut vk::PhysicalDevice,
    pub result: vk::Result,
}

#[repr(C)]
pub struct GetPhysicalDevicePropertiesParams {
    pub physical_device: vk::PhysicalDevice,
    pub properties: *mut vk::PhysicalDeviceProperties,
}

#[repr(C)]
pub struct GetPhysicalDeviceFeatures2Params {
    pub physical_device: vk::PhysicalDevice,
    pub features: *mut vk::PhysicalDeviceFeatures2<'static>,
}

#[repr(C)]
pub struct EnumerateDeviceExtensionPropertiesParams {
    pub physical_device: vk::PhysicalDevice,
    pub layer_name: *const c_char,
    pub property_count: *mut u32,
    pub properties: *mut vk::ExtensionProperties,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CreateDeviceParams {
    pub physical_device: vk::PhysicalDevice,
    pub create_info: *const vk::DeviceCreateInfo<'static>,
    pub allocator: Alloc,
    /// Holds the client device allocated by the stub on entry.
    pub device: *mut *mut ClientDevice,
    pub result: vk::Result,
}

#[repr(C)]
pub struct DestroyDeviceParams {
    pub device: vk::Device,
    pub allocator: Alloc,
}

#[repr(C)]
pub struct GetDeviceQueueParams {
    pub device: vk::Device,
    pub queue_family_index: u32,
    pub queue_index: u32,
    pub queue: *mut vk::Queue,
}

#[repr(C)]
pub struct DeviceWaitIdleParams {
    pub device: vk::Device,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CreateCommandPoolParams {
    pub device: vk::Device,
    pub create_info: *const vk::CommandPoolCreateInfo<'static>,
    pub allocator: Alloc,
    pub command_pool: *mut vk::CommandPool,
    pub result: vk::Result,
}

#[repr(C)]
pub struct DestroyCommandPoolParams {
    pub device: vk::Device,
    pub command_pool: vk::CommandPool,
    pub allocator: Alloc,
}

#[repr(C)]
pub struct AllocateCommandBuffersParams {
    pub device: vk::Device,
    pub allocate_info: *const vk::CommandBufferAllocateInfo<'static>,
    /// Holds the client command buffer objects allocated by the stub.
    pub command_buffers: *mut vk::CommandBuffer,
    pub result: vk::Result,
}

#[repr(C)]
pub struct FreeCommandBuffersParams {
    pub device: vk::Device,
    pub command_pool: vk::CommandPool,
    pub command_buffer_count: u32,
    pub command_buffers: *const vk::CommandBuffer,
}

#[repr(C)]
pub struct BeginCommandBufferParams {
    pub command_buffer: vk::CommandBuffer,
    pub begin_info: *const vk::CommandBufferBeginInfo<'static>,
    pub result: vk::Result,
}

#[repr(C)]
pub struct EndCommandBufferParams {
    pub command_buffer: vk::CommandBuffer,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CmdDrawParams {
    pub command_buffer: vk::CommandBuffer,
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

#[repr(C)]
pub struct CmdDrawIndexedParams {
    pub command_buffer: vk::CommandBuffer,
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}

#[repr(C)]
pub struct CmdDispatchParams {
    pub command_buffer: vk::CommandBuffer,
    pub group_count_x: u32,
    pub group_count_y: u32,
    pub group_count_z: u32,
}

#[repr(C)]
pub struct CmdSetLineWidthParams {
    pub command_buffer: vk::CommandBuffer,
    pub line_width: f32,
}

#[repr(C)]
pub struct CmdSetDepthBiasParams {
    pub command_buffer: vk::CommandBuffer,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
}

#[repr(C)]
pub struct CmdSetStencilReferenceParams {
    pub command_buffer: vk::CommandBuffer,
    pub face_mask: vk::StencilFaceFlags,
    pub reference: u32,
}

#[repr(C)]
pub struct CmdSetBlendConstantsParams {
    pub command_buffer: vk::CommandBuffer,
    pub blend_constants: *const [f32; 4],
}

#[repr(C)]
pub struct CmdBindPipelineParams {
    pub command_buffer: vk::CommandBuffer,
    pub pipeline_bind_point: vk::PipelineBindPoint,
    pub pipeline: vk::Pipeline,
}

#[repr(C)]
pub struct CreateFenceParams {
    pub device: vk::Device,
    pub create_info: *const vk::FenceCreateInfo<'static>,
    pub allocator: Alloc,
    pub fence: *mut vk::Fence,
    pub result: vk::Result,
}

#[repr(C)]
pub struct DestroyFenceParams {
    pub device: vk::Device,
    pub fence: vk::Fence,
    pub allocator: Alloc,
}

#[repr(C)]
pub struct WaitForFencesParams {
    pub device: vk::Device,
    pub fence_count: u32,
    pub fences: *const vk::Fence,
    pub wait_all: vk::Bool32,
    pub timeout: u64,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CreateSemaphoreParams {
    pub device: vk::Device,
    pub create_info: *const vk::SemaphoreCreateInfo<'static>,
    pub allocator: Alloc,
    pub semaphore: *mut vk::Semaphore,
    pub result: vk::Result,
}

#[repr(C)]
pub struct DestroySemaphoreParams {
    pub device: vk::Device,
    pub semaphore: vk::Semaphore,
    pub allocator: Alloc,
}

#[repr(C)]
pub struct QueueSubmitParams {
    pub queue: vk::Queue,
    pub submit_count: u32,
    pub submits: *const vk::SubmitInfo<'static>,
    pub fence: vk::Fence,
    pub result: vk::Result,
}

#[repr(C)]
pub struct QueueWaitIdleParams {
    pub queue: vk::Queue,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CreateDeferredOperationKHRParams {
    pub device: vk::Device,
    pub allocator: Alloc,
    pub deferred_operation: *mut vk::DeferredOperationKHR,
    pub result: vk::Result,
}

#[repr(C)]
pub struct DestroyDeferredOperationKHRParams {
    pub device: vk::Device,
    pub operation: vk::DeferredOperationKHR,
    pub allocator: Alloc,
}

#[repr(C)]
pub struct GetDeferredOperationResultKHRParams {
    pub device: vk::Device,
    pub operation: vk::DeferredOperationKHR,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CopyAccelerationStructureKHRParams {
    pub device: vk::Device,
    pub deferred_operation: vk::DeferredOperationKHR,
    pub info: *const vk::CopyAccelerationStructureInfoKHR<'static>,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CreateDebugUtilsMessengerEXTParams {
    pub instance: vk::Instance,
    pub create_info: *const vk::DebugUtilsMessengerCreateInfoEXT<'static>,
    pub allocator: Alloc,
    pub messenger: *mut vk::DebugUtilsMessengerEXT,
    pub result: vk::Result,
}

#[repr(C)]
pub struct DestroyDebugUtilsMessengerEXTParams {
    pub instance: vk::Instance,
    pub messenger: vk::DebugUtilsMessengerEXT,
    pub allocator: Alloc,
}

#[repr(C)]
pub struct XrEnumerateInstanceExtensionPropertiesParams {
    pub layer_name: *const c_char,
    pub capacity: u32,
    pub count: *mut u32,
    pub properties: *mut XrExtensionProperties,
    pub result: XrResult,
}

/// OpenXR creates share one shape: parent, opaque create info, and the
/// client object the stub allocated for the new handle.
#[repr(C)]
pub struct XrCreateInstanceParams {
    pub create_info: *const c_void,
    pub instance: *mut ClientObject,
    pub result: XrResult,
}

#[repr(C)]
pub struct XrCreateChildParams {
    pub parent: *mut ClientObject,
    pub create_info: *const c_void,
    pub child: *mut ClientObject,
    pub result: XrResult,
}

#[repr(C)]
pub struct XrDestroyParams {
    pub handle: *mut ClientObject,
    pub result: XrResult,
}
