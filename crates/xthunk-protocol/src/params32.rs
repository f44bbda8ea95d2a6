//! Parameter blocks as laid out by a 32-bit client.
//!
//! Pointers and dispatchable handles shrink to [`Ptr32`]; non-dispatchable
//! handles stay 64-bit. The structures the pointers lead to are translated
//! by the host's width adapter, not here.

use ash::vk;

use crate::xr::XrResult;
use crate::Ptr32;

#[repr(C)]
pub struct IsAvailableFunctionParams32 {
    pub handle: Ptr32,
    pub name: Ptr32,
    pub result: vk::Bool32,
}

#[repr(C)]
pub struct CreateInstanceParams32 {
    pub create_info: Ptr32,
    pub allocator: Ptr32,
    /// Points at a 32-bit slot holding the client instance address.
    pub instance: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct DestroyParams32 {
    pub handle: Ptr32,
    pub allocator: Ptr32,
}

#[repr(C)]
pub struct EnumerateInstanceVersionParams32 {
    pub api_version: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct EnumerateInstanceExtensionPropertiesParams32 {
    pub layer_name: Ptr32,
    pub property_count: Ptr32,
    pub properties: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct EnumeratePhysicalDevicesParams32 {
    pub instance: Ptr32,
    pub physical_device_count: Ptr32,
    /// Array of 32-bit client handles.
    pub physical_devices: Ptr32,
    pub result: vk::Result,
}

/// `vkGetPhysicalDeviceProperties` and `vkGetPhysicalDeviceFeatures2`.
#[repr(C)]
pub struct PhysicalDeviceQueryParams32 {
    pub physical_device: Ptr32,
    pub out: Ptr32,
}

#[repr(C)]
pub struct EnumerateDeviceExtensionPropertiesParams32 {
    pub physical_device: Ptr32,
    pub layer_name: Ptr32,
    pub property_count: Ptr32,
    pub properties: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CreateDeviceParams32 {
    pub physical_device: Ptr32,
    pub create_info: Ptr32,
    pub allocator: Ptr32,
    pub device: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct GetDeviceQueueParams32 {
    pub device: Ptr32,
    pub queue_family_index: u32,
    pub queue_index: u32,
    pub queue: Ptr32,
}

/// Single dispatchable handle in, result out: `vkDeviceWaitIdle`,
/// `vkEndCommandBuffer`, `vkQueueWaitIdle`.
#[repr(C)]
pub struct HandleResultParams32 {
    pub handle: Ptr32,
    pub result: vk::Result,
}

/// Device-level create: `vkCreateCommandPool`, `vkCreateFence`,
/// `vkCreateSemaphore`.
#[repr(C)]
pub struct DeviceCreateParams32 {
    pub device: Ptr32,
    pub create_info: Ptr32,
    pub allocator: Ptr32,
    /// Points at a 64-bit handle slot.
    pub out: Ptr32,
    pub result: vk::Result,
}

/// Device-level destroy of a non-dispatchable handle.
#[repr(C)]
pub struct DeviceDestroyParams32 {
    pub device: Ptr32,
    pub handle: u64,
    pub allocator: Ptr32,
}

#[repr(C)]
pub struct AllocateCommandBuffersParams32 {
    pub device: Ptr32,
    pub allocate_info: Ptr32,
    pub command_buffers: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct FreeCommandBuffersParams32 {
    pub device: Ptr32,
    pub command_pool: u64,
    pub command_buffer_count: u32,
    pub command_buffers: Ptr32,
}

#[repr(C)]
pub struct BeginCommandBufferParams32 {
    pub command_buffer: Ptr32,
    pub begin_info: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CmdDrawParams32 {
    pub command_buffer: Ptr32,
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

#[repr(C)]
pub struct CmdDrawIndexedParams32 {
    pub command_buffer: Ptr32,
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}

#[repr(C)]
pub struct CmdDispatchParams32 {
    pub command_buffer: Ptr32,
    pub group_count_x: u32,
    pub group_count_y: u32,
    pub group_count_z: u32,
}

#[repr(C)]
pub struct CmdSetLineWidthParams32 {
    pub command_buffer: Ptr32,
    pub line_width: f32,
}

#[repr(C)]
pub struct CmdSetDepthBiasParams32 {
    pub command_buffer: Ptr32,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
}

#[repr(C)]
pub struct CmdSetStencilReferenceParams32 {
    pub command_buffer: Ptr32,
    pub face_mask: vk::StencilFaceFlags,
    pub reference: u32,
}

#[repr(C)]
pub struct CmdSetBlendConstantsParams32 {
    pub command_buffer: Ptr32,
    pub blend_constants: Ptr32,
}

#[repr(C)]
pub struct CmdBindPipelineParams32 {
    pub command_buffer: Ptr32,
    pub pipeline_bind_point: vk::PipelineBindPoint,
    pub pipeline: u64,
}

#[repr(C)]
pub struct WaitForFencesParams32 {
    pub device: Ptr32,
    pub fence_count: u32,
    pub fences: Ptr32,
    pub wait_all: vk::Bool32,
    pub timeout: u64,
    pub result: vk::Result,
}

#[repr(C)]
pub struct QueueSubmitParams32 {
    pub queue: Ptr32,
    pub submit_count: u32,
    pub submits: Ptr32,
    pub fence: u64,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CreateDeferredOperationKHRParams32 {
    pub device: Ptr32,
    pub allocator: Ptr32,
    pub deferred_operation: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct GetDeferredOperationResultKHRParams32 {
    pub device: Ptr32,
    pub operation: u64,
    pub result: vk::Result,
}

#[repr(C)]
pub struct CopyAccelerationStructureKHRParams32 {
    pub device: Ptr32,
    pub deferred_operation: u64,
    pub info: Ptr32,
    pub result: vk::Result,
}

#[repr(C)]
pub struct XrEnumerateInstanceExtensionPropertiesParams32 {
    pub layer_name: Ptr32,
    pub capacity: u32,
    pub count: Ptr32,
    pub properties: Ptr32,
    pub result: XrResult,
}

/// `XrExtensionProperties` as a 32-bit client lays it out.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct XrExtensionProperties32 {
    pub ty: i32,
    pub next: Ptr32,
    pub extension_name: [u8; crate::xr::XR_MAX_EXTENSION_NAME_SIZE],
    pub extension_version: u32,
}
