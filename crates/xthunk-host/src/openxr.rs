//! OpenXR forwarding.
//!
//! The client speaks the Windows flavor of OpenXR; the host runtime speaks
//! the Vulkan one. Graphics-API extensions are advertised and enabled
//! accordingly: Direct3D enables map to `XR_KHR_vulkan_enable`, and the
//! Win32 performance counter time conversion maps to the timespec one.

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr::{self, NonNull};

use tracing::{debug, warn};
use xthunk_core::registry::{lookup_by_client, register, unregister};
use xthunk_core::{ClientHandle, HostObject, VulkanObject};
use xthunk_protocol::client::ClientObject;
use xthunk_protocol::xr::{
    PfnXrCreateChild, PfnXrDestroyHandle, XrExtensionProperties, XrHandle, XrInstanceCreateInfo,
    XrResult, XR_KHR_CONVERT_TIMESPEC_TIME, XR_KHR_D3D11_ENABLE, XR_KHR_D3D11_ENABLE_SPEC_VERSION,
    XR_KHR_D3D12_ENABLE, XR_KHR_D3D12_ENABLE_SPEC_VERSION, XR_KHR_VULKAN_ENABLE,
    XR_KHR_WIN32_CONVERT_PERFORMANCE_COUNTER_TIME,
    XR_KHR_WIN32_CONVERT_PERFORMANCE_COUNTER_TIME_SPEC_VERSION,
};
use xthunk_protocol::NtStatus;

use crate::context::HostContext;
use crate::driver::XrDriver;
use crate::funcs::require;
use crate::objects::{XrHostInstance, XrHostSession, XrHostSpace, XrHostSwapchain};
use crate::HostResult;

#[derive(Clone, Copy, Default)]
pub struct XrInstanceFuncs {
    pub destroy_instance: Option<PfnXrDestroyHandle>,
    pub create_session: Option<PfnXrCreateChild>,
    pub destroy_session: Option<PfnXrDestroyHandle>,
    pub create_swapchain: Option<PfnXrCreateChild>,
    pub destroy_swapchain: Option<PfnXrDestroyHandle>,
    pub create_reference_space: Option<PfnXrCreateChild>,
    pub destroy_space: Option<PfnXrDestroyHandle>,
}

impl XrInstanceFuncs {
    /// # Safety
    /// `instance` must be a live host instance of `driver`.
    unsafe fn load(driver: &XrDriver, instance: XrHandle) -> Self {
        // SAFETY: each name is loaded as its own signature.
        unsafe {
            Self {
                destroy_instance: driver.resolve(instance, c"xrDestroyInstance"),
                create_session: driver.resolve(instance, c"xrCreateSession"),
                destroy_session: driver.resolve(instance, c"xrDestroySession"),
                create_swapchain: driver.resolve(instance, c"xrCreateSwapchain"),
                destroy_swapchain: driver.resolve(instance, c"xrDestroySwapchain"),
                create_reference_space: driver.resolve(instance, c"xrCreateReferenceSpace"),
                destroy_space: driver.resolve(instance, c"xrDestroySpace"),
            }
        }
    }
}

/// Wrappers that own an OpenXR handle.
pub(crate) trait XrObject: HostObject {
    fn xr_handle(&self) -> XrHandle;
    fn xr_instance(&self) -> &XrHostInstance;
}

/// Wrappers created from a parent handle.
pub(crate) trait XrChild: XrObject {
    fn new(handle: XrHandle, instance: NonNull<XrHostInstance>) -> Self;
}

impl XrObject for XrHostInstance {
    fn xr_handle(&self) -> XrHandle {
        self.handle
    }
    fn xr_instance(&self) -> &XrHostInstance {
        self
    }
}

macro_rules! xr_child_impl {
    ($($ty:ty),*) => {
        $(
            impl XrObject for $ty {
                fn xr_handle(&self) -> XrHandle {
                    self.handle
                }
                fn xr_instance(&self) -> &XrHostInstance {
                    // SAFETY: children are destroyed before their instance.
                    unsafe { self.instance.as_ref() }
                }
            }

            impl XrChild for $ty {
                fn new(handle: XrHandle, instance: NonNull<XrHostInstance>) -> Self {
                    Self {
                        obj: VulkanObject::new(handle),
                        handle,
                        instance,
                    }
                }
            }
        )*
    };
}

xr_child_impl!(XrHostSession, XrHostSwapchain, XrHostSpace);

fn xr_driver(ctx: &HostContext) -> HostResult<&XrDriver> {
    ctx.xr().ok_or_else(|| {
        tracing::error!("no OpenXR runtime configured");
        NtStatus::NOT_IMPLEMENTED
    })
}

pub(crate) fn init_openxr(ctx: &HostContext) -> XrResult {
    match ctx.xr() {
        Some(xr) if xr.create_instance.is_some() => XrResult::SUCCESS,
        _ => XrResult::ERROR_INITIALIZATION_FAILED,
    }
}

fn host_extensions(xr: &XrDriver) -> HostResult<Result<Vec<XrExtensionProperties>, XrResult>> {
    let enumerate = require(
        xr.enumerate_instance_extension_properties,
        "xrEnumerateInstanceExtensionProperties",
    )?;
    let mut count = 0;
    // SAFETY: capacity 0 asks for the count only.
    let res = unsafe { enumerate(ptr::null(), 0, &mut count, ptr::null_mut()) };
    if !res.is_success() {
        return Ok(Err(res));
    }
    let mut props = vec![XrExtensionProperties::new("", 0); count as usize];
    // SAFETY: props holds `count` entries.
    let res = unsafe { enumerate(ptr::null(), count, &mut count, props.as_mut_ptr()) };
    if !res.is_success() {
        return Ok(Err(res));
    }
    props.truncate(count as usize);
    Ok(Ok(props))
}

/// Host extensions translated to the names a Windows client expects.
pub(crate) fn client_extensions(host: &[XrExtensionProperties]) -> Vec<XrExtensionProperties> {
    let mut out = Vec::with_capacity(host.len() + 2);
    for props in host {
        match props.name() {
            XR_KHR_CONVERT_TIMESPEC_TIME => out.push(XrExtensionProperties::new(
                XR_KHR_WIN32_CONVERT_PERFORMANCE_COUNTER_TIME,
                XR_KHR_WIN32_CONVERT_PERFORMANCE_COUNTER_TIME_SPEC_VERSION,
            )),
            XR_KHR_VULKAN_ENABLE => {
                out.push(*props);
                out.push(XrExtensionProperties::new(XR_KHR_D3D11_ENABLE, XR_KHR_D3D11_ENABLE_SPEC_VERSION));
                out.push(XrExtensionProperties::new(XR_KHR_D3D12_ENABLE, XR_KHR_D3D12_ENABLE_SPEC_VERSION));
            }
            _ => out.push(*props),
        }
    }
    out
}

/// Host name for an extension the client asked to enable.
fn host_extension_name(name: &str) -> &str {
    match name {
        XR_KHR_D3D11_ENABLE | XR_KHR_D3D12_ENABLE => XR_KHR_VULKAN_ENABLE,
        XR_KHR_WIN32_CONVERT_PERFORMANCE_COUNTER_TIME => XR_KHR_CONVERT_TIMESPEC_TIME,
        other => other,
    }
}

/// The extension list a client sees; layers are not forwarded.
pub(crate) fn client_extension_list(
    ctx: &HostContext,
    layer_name: *const c_char,
) -> HostResult<Result<Vec<XrExtensionProperties>, XrResult>> {
    let xr = xr_driver(ctx)?;
    if !layer_name.is_null() {
        return Ok(Err(XrResult::ERROR_VALIDATION_FAILURE));
    }
    Ok(host_extensions(xr)?.map(|host| client_extensions(&host)))
}

/// Two-call enumeration: capacity 0 asks for the count only.
///
/// # Safety
/// `count` writable; `properties` holds `capacity` entries.
pub(crate) unsafe fn enumerate_instance_extension_properties(
    ctx: &HostContext,
    layer_name: *const c_char,
    capacity: u32,
    count: *mut u32,
    properties: *mut XrExtensionProperties,
) -> HostResult<XrResult> {
    let exts = match client_extension_list(ctx, layer_name)? {
        Ok(exts) => exts,
        Err(err) => return Ok(err),
    };
    // SAFETY: out pointers per caller.
    unsafe {
        *count = exts.len() as u32;
        if capacity == 0 {
            return Ok(XrResult::SUCCESS);
        }
        if (capacity as usize) < exts.len() {
            return Ok(XrResult::ERROR_SIZE_INSUFFICIENT);
        }
        for (i, props) in exts.iter().enumerate() {
            let dst = &mut *properties.add(i);
            dst.extension_name = props.extension_name;
            dst.extension_version = props.extension_version;
        }
    }
    Ok(XrResult::SUCCESS)
}

/// # Safety
/// `info` must be a valid `XrInstanceCreateInfo`; `client` a live header.
pub(crate) unsafe fn create_instance(
    ctx: &HostContext,
    info: *const c_void,
    client: NonNull<ClientObject>,
) -> HostResult<XrResult> {
    let xr = xr_driver(ctx)?;
    let create = require(xr.create_instance, "xrCreateInstance")?;
    // SAFETY: valid per caller.
    let info = unsafe { *info.cast::<XrInstanceCreateInfo>() };

    let mut names: Vec<CString> = Vec::with_capacity(info.enabled_extension_count as usize);
    for i in 0..info.enabled_extension_count as usize {
        // SAFETY: the create info lists this many strings.
        let requested = unsafe { CStr::from_ptr(*info.enabled_extension_names.add(i)) };
        let host = host_extension_name(&requested.to_string_lossy()).to_owned();
        if names.iter().all(|n| n.as_bytes() != host.as_bytes()) {
            names.push(CString::new(host).unwrap_or_default());
        }
    }
    let ptrs: Vec<*const c_char> = names.iter().map(|n| n.as_ptr()).collect();
    let mut host_info = info;
    host_info.enabled_extension_count = ptrs.len() as u32;
    host_info.enabled_extension_names = ptrs.as_ptr();

    let mut handle: XrHandle = 0;
    // SAFETY: host_info borrows locals that outlive the call.
    let res = unsafe { create(ptr::from_ref(&host_info).cast(), &mut handle) };
    if !res.is_success() {
        warn!("host xrCreateInstance failed: {:?}", res);
        return Ok(res);
    }
    // SAFETY: handle is a live host instance.
    let funcs = unsafe { XrInstanceFuncs::load(xr, handle) };
    let wrapper = Box::new(XrHostInstance {
        obj: VulkanObject::new(handle),
        handle,
        funcs,
    });
    // SAFETY: the client header is live per caller.
    unsafe { register(wrapper, Some(client), None) };
    debug!("created OpenXR instance {:#x}", handle);
    Ok(res)
}

/// # Safety
/// `parent` must be a live `P` header, `info` valid for the create call and
/// `client` a live header for the new object.
pub(crate) unsafe fn create_child<P: XrObject, C: XrChild>(
    parent: &P,
    info: *const c_void,
    client: NonNull<ClientObject>,
    create: Option<PfnXrCreateChild>,
    name: &'static str,
) -> HostResult<XrResult> {
    let create = require(create, name)?;
    let mut handle: XrHandle = 0;
    // SAFETY: forwarded from caller.
    let res = unsafe { create(parent.xr_handle(), info, &mut handle) };
    if !res.is_success() {
        return Ok(res);
    }
    let wrapper = Box::new(C::new(handle, NonNull::from(parent.xr_instance())));
    // SAFETY: the client header is live per caller.
    unsafe { register(wrapper, Some(client), None) };
    Ok(res)
}

/// # Safety
/// `raw` must be a live header bound to a `T`.
pub(crate) unsafe fn destroy<T: XrObject>(
    raw: u64,
    destroy: impl FnOnce(&XrInstanceFuncs) -> Option<PfnXrDestroyHandle>,
    name: &'static str,
) -> HostResult<XrResult> {
    let Some(handle) = ClientHandle::dispatchable(raw) else {
        return Ok(XrResult::ERROR_HANDLE_INVALID);
    };
    // SAFETY: live per caller.
    let wrapper = unsafe { lookup_by_client::<T>(handle) };
    let obj = unsafe { wrapper.as_ref() };
    let destroy = require(destroy(&obj.xr_instance().funcs), name)?;
    // SAFETY: the host handle is live.
    let res = unsafe { destroy(obj.xr_handle()) };
    if res.is_success() {
        // SAFETY: no longer reachable by the client.
        drop(unsafe { unregister(wrapper, None) });
    }
    Ok(res)
}
