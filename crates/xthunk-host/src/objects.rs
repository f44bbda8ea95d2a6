//! Host wrappers for the wrapped Vulkan object types.
//!
//! Each wrapper is `#[repr(C)]` and starts with a [`VulkanObject`] so that a
//! client handle can be resolved to it without knowing its type. Parent
//! links are raw pointers: a parent outlives its children by API contract.

use std::ffi::{c_void, CString};
use std::ptr::NonNull;

use ash::vk;
use parking_lot::Mutex;
use xthunk_core::registry::lookup_by_client;
use xthunk_core::{ClientHandle, ConversionContext, HostObject, ObjectRegistry, VulkanObject};
use xthunk_protocol::client::LoaderQuirks;
use xthunk_protocol::xr::XrHandle;
use xthunk_protocol::NtStatus;

use crate::funcs::{DeviceFuncs, InstanceFuncs};
use crate::openxr::XrInstanceFuncs;

macro_rules! host_object {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: #[repr(C)] with `obj: VulkanObject` first.
            unsafe impl HostObject for $ty {
                fn object(&self) -> &VulkanObject {
                    &self.obj
                }
                fn object_mut(&mut self) -> &mut VulkanObject {
                    &mut self.obj
                }
            }
        )*
    };
}

#[repr(C)]
pub struct HostInstance {
    pub obj: VulkanObject,
    pub handle: vk::Instance,
    pub funcs: InstanceFuncs,
    /// Host handle to client handle for every object created under this
    /// instance.
    pub registry: ObjectRegistry,
    pub physical_devices: Vec<NonNull<HostPhysicalDevice>>,
    pub extensions: Vec<CString>,
    pub app_name: Option<String>,
    /// Applied to every device created from this instance.
    pub quirks: LoaderQuirks,
}

impl HostInstance {
    pub fn has_extension(&self, name: &std::ffi::CStr) -> bool {
        self.extensions.iter().any(|e| e.as_c_str() == name)
    }
}

#[repr(C)]
pub struct HostPhysicalDevice {
    pub obj: VulkanObject,
    pub handle: vk::PhysicalDevice,
    pub instance: NonNull<HostInstance>,
    /// Device extensions the client is allowed to see and enable.
    pub extensions: Vec<vk::ExtensionProperties>,
}

impl HostPhysicalDevice {
    pub fn instance(&self) -> &HostInstance {
        // SAFETY: physical devices die with their instance.
        unsafe { self.instance.as_ref() }
    }
}

#[repr(C)]
pub struct HostDevice {
    pub obj: VulkanObject,
    pub handle: vk::Device,
    pub physical_device: NonNull<HostPhysicalDevice>,
    pub funcs: DeviceFuncs,
    pub queues: Vec<NonNull<HostQueue>>,
}

impl HostDevice {
    pub fn physical_device(&self) -> &HostPhysicalDevice {
        // SAFETY: a device never outlives its physical device.
        unsafe { self.physical_device.as_ref() }
    }

    pub fn instance(&self) -> &HostInstance {
        self.physical_device().instance()
    }
}

#[repr(C)]
pub struct HostQueue {
    pub obj: VulkanObject,
    pub handle: vk::Queue,
    pub device: NonNull<HostDevice>,
    pub family_index: u32,
    pub queue_index: u32,
    pub flags: vk::DeviceQueueCreateFlags,
}

impl HostQueue {
    pub fn device(&self) -> &HostDevice {
        // SAFETY: queues are freed with their device.
        unsafe { self.device.as_ref() }
    }
}

#[repr(C)]
pub struct HostCommandPool {
    pub obj: VulkanObject,
    pub handle: vk::CommandPool,
    pub device: NonNull<HostDevice>,
    /// Live buffers; destroying the pool frees their wrappers.
    pub buffers: Mutex<Vec<NonNull<HostCommandBuffer>>>,
}

#[repr(C)]
pub struct HostCommandBuffer {
    pub obj: VulkanObject,
    pub handle: vk::CommandBuffer,
    pub device: NonNull<HostDevice>,
    pub pool: NonNull<HostCommandPool>,
}

impl HostCommandBuffer {
    pub fn device(&self) -> &HostDevice {
        // SAFETY: command buffers are freed before their device.
        unsafe { self.device.as_ref() }
    }
}

/// A deferred operation keeps the structures marshaled for the call it
/// was passed to alive until the operation itself is destroyed.
#[repr(C)]
pub struct HostDeferredOperation {
    pub obj: VulkanObject,
    pub handle: vk::DeferredOperationKHR,
    pub ctx: Mutex<ConversionContext>,
}

#[repr(C)]
pub struct HostDebugMessenger {
    pub obj: VulkanObject,
    pub handle: vk::DebugUtilsMessengerEXT,
    pub instance: NonNull<HostInstance>,
    pub user_callback: vk::PFN_vkDebugUtilsMessengerCallbackEXT,
    pub user_data: *mut c_void,
}

#[repr(C)]
pub struct XrHostInstance {
    pub obj: VulkanObject,
    pub handle: XrHandle,
    pub funcs: XrInstanceFuncs,
}

macro_rules! xr_child {
    ($($(#[$meta:meta])* $name:ident,)*) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                pub obj: VulkanObject,
                pub handle: XrHandle,
                pub instance: NonNull<XrHostInstance>,
            }
        )*
    };
}

xr_child! {
    XrHostSession,
    /// Child of a session.
    XrHostSwapchain,
    /// Child of a session.
    XrHostSpace,
}

host_object!(
    XrHostInstance,
    XrHostSession,
    XrHostSwapchain,
    XrHostSpace,
    HostInstance,
    HostPhysicalDevice,
    HostDevice,
    HostQueue,
    HostCommandPool,
    HostCommandBuffer,
    HostDeferredOperation,
    HostDebugMessenger,
);

/// Wrapper behind a dispatchable client handle.
///
/// # Safety
/// A non-null `raw` must be a live client header bound to a `T`.
pub(crate) unsafe fn dispatchable<'a, T: HostObject>(raw: u64) -> Result<&'a T, NtStatus> {
    let Some(handle) = ClientHandle::dispatchable(raw) else {
        tracing::error!("null {} handle", std::any::type_name::<T>());
        return Err(NtStatus::INVALID_PARAMETER);
    };
    // SAFETY: forwarded from caller.
    Ok(unsafe { lookup_by_client::<T>(handle).as_ref() })
}

/// Wrapper behind a wrapped non-dispatchable handle.
///
/// # Safety
/// A non-zero `raw` must be the address of a live `T`.
pub(crate) unsafe fn opaque<'a, T: HostObject>(raw: u64) -> Result<&'a T, NtStatus> {
    match unsafe { opaque_or_null::<T>(raw) } {
        Some(wrapper) => Ok(wrapper),
        None => {
            tracing::error!("null {} handle", std::any::type_name::<T>());
            Err(NtStatus::INVALID_PARAMETER)
        }
    }
}

/// Like [`opaque`] but a null handle is allowed.
///
/// # Safety
/// See [`opaque`].
pub(crate) unsafe fn opaque_or_null<'a, T: HostObject>(raw: u64) -> Option<&'a T> {
    let handle = ClientHandle::opaque(raw)?;
    // SAFETY: forwarded from caller.
    Some(unsafe { lookup_by_client::<T>(handle).as_ref() })
}
