//! Instance and physical device entry points.

use std::ffi::{c_char, CStr, CString};
use std::ptr::{self, NonNull};

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, trace, warn};
use xthunk_core::registry::{lookup_by_client, register, unregister};
use xthunk_core::{ClientHandle, HostObject, ObjectRegistry, VulkanObject};
use xthunk_protocol::client::{ClientInstance, LoaderQuirks};

use crate::context::HostContext;
use crate::funcs::{require, InstanceFuncs};
use crate::objects::{HostInstance, HostPhysicalDevice};
use crate::HostResult;

pub(crate) const WIN32_SURFACE: &CStr = c"VK_KHR_win32_surface";

/// Window-system extensions of other platforms; never shown to the client.
const FOREIGN_SURFACE_EXTENSIONS: &[&CStr] = &[
    c"VK_KHR_xlib_surface",
    c"VK_KHR_xcb_surface",
    c"VK_KHR_wayland_surface",
    c"VK_KHR_android_surface",
    c"VK_EXT_metal_surface",
    c"VK_MVK_macos_surface",
];

/// Device extensions that only make sense to host code.
const HOST_ONLY_DEVICE_EXTENSIONS: &[&CStr] = &[
    c"VK_KHR_external_memory_fd",
    c"VK_KHR_external_semaphore_fd",
    c"VK_KHR_external_fence_fd",
    c"VK_EXT_external_memory_dma_buf",
    c"VK_EXT_image_drm_format_modifier",
];

pub(crate) fn name_of(raw: &[c_char]) -> &CStr {
    // SAFETY: c_char and u8 have the same layout.
    let bytes = unsafe { std::slice::from_raw_parts(raw.as_ptr().cast::<u8>(), raw.len()) };
    CStr::from_bytes_until_nul(bytes).unwrap_or(c"")
}

fn set_name(raw: &mut [c_char], name: &CStr) {
    raw.fill(0);
    let limit = raw.len().saturating_sub(1);
    for (dst, src) in raw.iter_mut().zip(name.to_bytes().iter().take(limit)) {
        *dst = *src as c_char;
    }
}

/// Copies `src` out with the usual two-call enumeration contract.
///
/// # Safety
/// `count` must be writable; `out`, when non-null, must hold `*count`
/// elements.
pub(crate) unsafe fn fill_array<T: Copy>(src: &[T], count: *mut u32, out: *mut T) -> vk::Result {
    // SAFETY: forwarded from caller.
    unsafe {
        if out.is_null() {
            *count = src.len() as u32;
            return vk::Result::SUCCESS;
        }
        let n = (*count as usize).min(src.len());
        ptr::copy_nonoverlapping(src.as_ptr(), out, n);
        *count = n as u32;
        if n < src.len() {
            vk::Result::INCOMPLETE
        } else {
            vk::Result::SUCCESS
        }
    }
}

unsafe fn query<T: Copy + Default>(mut call: impl FnMut(*mut u32, *mut T) -> vk::Result) -> Result<Vec<T>, vk::Result> {
    loop {
        let mut count = 0;
        let res = call(&mut count, ptr::null_mut());
        if res != vk::Result::SUCCESS {
            return Err(res);
        }
        let mut items = vec![T::default(); count as usize];
        match call(&mut count, items.as_mut_ptr()) {
            vk::Result::SUCCESS => {
                items.truncate(count as usize);
                return Ok(items);
            }
            vk::Result::INCOMPLETE => continue,
            err => return Err(err),
        }
    }
}

fn host_instance_extensions(ctx: &HostContext) -> HostResult<Result<Vec<vk::ExtensionProperties>, vk::Result>> {
    let enumerate = require(
        ctx.driver().global.enumerate_instance_extension_properties,
        "vkEnumerateInstanceExtensionProperties",
    )?;
    // SAFETY: global call with no layer.
    Ok(unsafe { query(|count, out| enumerate(ptr::null(), count, out)) })
}

/// Instance extensions as the client sees them: the host surface extension
/// appears as `VK_KHR_win32_surface`.
pub(crate) fn client_instance_extensions(
    ctx: &HostContext,
) -> HostResult<Result<Vec<vk::ExtensionProperties>, vk::Result>> {
    let surface = ctx.config().host.surface_extension.as_str();
    Ok(host_instance_extensions(ctx)?.map(|host| {
        host.into_iter()
            .filter_map(|mut props| {
                let name = name_of(&props.extension_name);
                if name.to_bytes() == surface.as_bytes() {
                    set_name(&mut props.extension_name, WIN32_SURFACE);
                    Some(props)
                } else if FOREIGN_SURFACE_EXTENSIONS.contains(&name) || name == WIN32_SURFACE {
                    None
                } else {
                    Some(props)
                }
            })
            .collect()
    }))
}

pub(crate) unsafe fn enumerate_instance_version(ctx: &HostContext, api_version: *mut u32) -> HostResult<vk::Result> {
    // SAFETY: out pointer valid per caller.
    unsafe {
        match ctx.driver().global.enumerate_instance_version {
            Some(enumerate) => Ok(enumerate(api_version)),
            None => {
                *api_version = vk::API_VERSION_1_0;
                Ok(vk::Result::SUCCESS)
            }
        }
    }
}

pub(crate) unsafe fn enumerate_instance_extension_properties(
    ctx: &HostContext,
    layer_name: *const c_char,
    count: *mut u32,
    properties: *mut vk::ExtensionProperties,
) -> HostResult<vk::Result> {
    if !layer_name.is_null() {
        // SAFETY: non-null layer names are strings.
        debug!("layer {:?} requested; layers are not forwarded", unsafe { CStr::from_ptr(layer_name) });
        return Ok(vk::Result::ERROR_LAYER_NOT_PRESENT);
    }
    match client_instance_extensions(ctx)? {
        // SAFETY: out pointers per caller.
        Ok(exts) => Ok(unsafe { fill_array(&exts, count, properties) }),
        Err(err) => Ok(err),
    }
}

/// Maps the client's requested extensions to host names and checks each is
/// supported.
fn host_extension_list(
    ctx: &HostContext,
    info: &vk::InstanceCreateInfo<'_>,
) -> HostResult<Result<Vec<CString>, vk::Result>> {
    let host = match host_instance_extensions(ctx)? {
        Ok(host) => host,
        Err(err) => return Ok(Err(err)),
    };
    let surface = CString::new(ctx.config().host.surface_extension.as_str()).unwrap_or_default();
    let mut out = Vec::with_capacity(info.enabled_extension_count as usize);
    for i in 0..info.enabled_extension_count as usize {
        // SAFETY: the create info lists this many strings.
        let requested = unsafe { CStr::from_ptr(*info.pp_enabled_extension_names.add(i)) };
        let name = if requested == WIN32_SURFACE { surface.as_c_str() } else { requested };
        if !host.iter().any(|p| name_of(&p.extension_name) == name) {
            warn!("instance extension {:?} is not supported by the host", requested);
            return Ok(Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT));
        }
        out.push(name.to_owned());
    }
    Ok(Ok(out))
}

fn application_name(info: &vk::InstanceCreateInfo<'_>) -> Option<String> {
    // SAFETY: pointers in a create info are null or valid.
    unsafe {
        let app = info.p_application_info.as_ref()?;
        if app.p_application_name.is_null() {
            return None;
        }
        Some(CStr::from_ptr(app.p_application_name).to_string_lossy().into_owned())
    }
}

/// Creates the host instance and binds it, plus one wrapper per physical
/// device, to the client's headers.
///
/// When the client reserved fewer physical device slots than the host has,
/// nothing is bound: the real count is written back and
/// `ERROR_OUT_OF_POOL_MEMORY` tells the client to retry.
///
/// # Safety
/// `info` must be a valid native create info; `client` a live client
/// instance with `capacity` trailing headers.
pub(crate) unsafe fn create_instance(
    ctx: &HostContext,
    info: *const vk::InstanceCreateInfo<'_>,
    allocator: *const vk::AllocationCallbacks<'_>,
    client: NonNull<ClientInstance>,
) -> HostResult<vk::Result> {
    if !allocator.is_null() {
        trace!("ignoring client allocation callbacks");
    }
    let create = require(ctx.driver().global.create_instance, "vkCreateInstance")?;
    // SAFETY: valid per caller.
    let info = unsafe { &*info };
    let extensions = match host_extension_list(ctx, info)? {
        Ok(extensions) => extensions,
        Err(err) => return Ok(err),
    };
    let ext_ptrs: Vec<*const c_char> = extensions.iter().map(|e| e.as_ptr()).collect();
    let mut host_info = *info;
    host_info.enabled_extension_count = ext_ptrs.len() as u32;
    host_info.pp_enabled_extension_names = ext_ptrs.as_ptr();

    let mut handle = vk::Instance::null();
    // SAFETY: host_info borrows locals that outlive the call.
    let res = unsafe { create(&host_info, ptr::null(), &mut handle) };
    if res != vk::Result::SUCCESS {
        debug!("host vkCreateInstance failed: {:?}", res);
        return Ok(res);
    }

    // SAFETY: handle is a live host instance.
    let funcs = unsafe { InstanceFuncs::load(|name| ctx.driver().instance_proc_addr(handle, name.as_ptr())) };
    let destroy = funcs.destroy_instance;
    let abort = |res: vk::Result| {
        if let Some(destroy) = destroy {
            // SAFETY: nothing references the instance yet.
            unsafe { destroy(handle, ptr::null()) };
        }
        Ok(res)
    };

    let Some(enumerate) = funcs.enumerate_physical_devices else {
        return abort(vk::Result::ERROR_INITIALIZATION_FAILED);
    };
    // SAFETY: live host instance.
    let host_devices = match unsafe { query(|count, out| enumerate(handle, count, out)) } {
        Ok(devices) => devices,
        Err(err) => return abort(err),
    };
    // SAFETY: client header is live per caller.
    let capacity = unsafe {
        let client = &mut *client.as_ptr();
        client.phys_dev_count = host_devices.len() as u32;
        client.capacity as usize
    };
    if host_devices.len() > capacity {
        debug!("client reserved {} physical devices, host has {}", capacity, host_devices.len());
        return abort(vk::Result::ERROR_OUT_OF_POOL_MEMORY);
    }

    let app_name = application_name(info);
    let quirks = match &app_name {
        Some(name) if ctx.config().dispatch.device_proc_addr_quirk_apps.iter().any(|a| a == name) => {
            LoaderQuirks::GET_DEVICE_PROC_ADDR
        }
        _ => LoaderQuirks::empty(),
    };

    let wrapper = Box::new(HostInstance {
        obj: VulkanObject::new(handle.as_raw()),
        handle,
        funcs,
        registry: ObjectRegistry::new(),
        physical_devices: Vec::with_capacity(host_devices.len()),
        extensions,
        app_name,
        quirks,
    });
    // SAFETY: the client header is live; the wrapper stays private until
    // this function returns.
    unsafe {
        let instance = register(wrapper, Some(client.cast()), None);
        let inst = &mut *instance.as_ptr();
        inst.registry.insert(inst.object());
        for (i, pd) in host_devices.into_iter().enumerate() {
            let extensions = device_extensions(&inst.funcs, pd);
            let wrapper = Box::new(HostPhysicalDevice {
                obj: VulkanObject::new(pd.as_raw()),
                handle: pd,
                instance,
                extensions,
            });
            let header = ClientInstance::phys_dev(client, i);
            let pd = register(wrapper, Some(header), Some(&inst.registry));
            inst.physical_devices.push(pd);
        }
        debug!(
            "created instance {:#x} for {:?} with {} physical devices",
            handle.as_raw(),
            inst.app_name,
            inst.physical_devices.len()
        );
    }
    Ok(vk::Result::SUCCESS)
}

fn device_extensions(funcs: &InstanceFuncs, pd: vk::PhysicalDevice) -> Vec<vk::ExtensionProperties> {
    let Some(enumerate) = funcs.enumerate_device_extension_properties else {
        return Vec::new();
    };
    // SAFETY: pd belongs to a live instance.
    let all = unsafe { query(|count, out| enumerate(pd, ptr::null(), count, out)) }.unwrap_or_default();
    all.into_iter()
        .filter(|p| !HOST_ONLY_DEVICE_EXTENSIONS.contains(&name_of(&p.extension_name)))
        .collect()
}

/// # Safety
/// `raw` must be null or a live client instance handle.
pub(crate) unsafe fn destroy_instance(raw: u64) -> HostResult<()> {
    let Some(handle) = ClientHandle::dispatchable(raw) else {
        return Ok(());
    };
    // SAFETY: live per caller.
    let instance = unsafe { lookup_by_client::<HostInstance>(handle) };
    let inst = unsafe { instance.as_ref() };
    let destroy = require(inst.funcs.destroy_instance, "vkDestroyInstance")?;
    // SAFETY: the client promises no child objects remain.
    unsafe {
        destroy(inst.handle, ptr::null());
        for pd in &inst.physical_devices {
            drop(unregister(*pd, Some(&inst.registry)));
        }
        let wrapper = unregister(instance, None);
        debug!("destroyed instance {:#x}", wrapper.handle.as_raw());
    }
    Ok(())
}

/// Client handles of the instance's physical devices, in host order.
pub(crate) fn physical_device_handles(instance: &HostInstance) -> Vec<u64> {
    instance
        .physical_devices
        .iter()
        // SAFETY: physical devices live as long as their instance.
        .map(|pd| unsafe { pd.as_ref() }.obj.client_handle)
        .collect()
}

pub(crate) unsafe fn get_physical_device_properties(
    pd: &HostPhysicalDevice,
    properties: *mut vk::PhysicalDeviceProperties,
) -> HostResult<()> {
    let get = require(pd.instance().funcs.get_physical_device_properties, "vkGetPhysicalDeviceProperties")?;
    // SAFETY: out pointer per caller.
    unsafe { get(pd.handle, properties) };
    Ok(())
}

pub(crate) unsafe fn get_physical_device_features2(
    pd: &HostPhysicalDevice,
    features: *mut vk::PhysicalDeviceFeatures2<'_>,
) -> HostResult<()> {
    let get = require(pd.instance().funcs.get_physical_device_features2, "vkGetPhysicalDeviceFeatures2")?;
    // SAFETY: out chain per caller.
    unsafe { get(pd.handle, features) };
    Ok(())
}

pub(crate) unsafe fn enumerate_device_extension_properties(
    pd: &HostPhysicalDevice,
    layer_name: *const c_char,
    count: *mut u32,
    properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    if !layer_name.is_null() {
        return vk::Result::ERROR_LAYER_NOT_PRESENT;
    }
    // SAFETY: out pointers per caller.
    unsafe { fill_array(&pd.extensions, count, properties) }
}
