//! Device and queue entry points.

use std::ffi::CStr;
use std::ptr::{self, NonNull};

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, error, warn};
use xthunk_core::registry::{lookup_by_client, register, unregister};
use xthunk_core::{ClientHandle, VulkanObject};
use xthunk_protocol::client::ClientDevice;
use xthunk_protocol::NtStatus;

use crate::funcs::{require, DeviceFuncs};
use crate::instance::name_of;
use crate::objects::{HostDevice, HostPhysicalDevice, HostQueue};
use crate::HostResult;

fn queue_create_infos<'a>(info: &'a vk::DeviceCreateInfo<'_>) -> &'a [vk::DeviceQueueCreateInfo<'a>] {
    if info.p_queue_create_infos.is_null() {
        return &[];
    }
    // SAFETY: the create info lists this many queue infos.
    unsafe { std::slice::from_raw_parts(info.p_queue_create_infos, info.queue_create_info_count as usize) }
}

/// Number of queue headers a client device needs for `info`.
pub fn queue_count(info: &vk::DeviceCreateInfo<'_>) -> usize {
    queue_create_infos(info).iter().map(|q| q.queue_count as usize).sum()
}

/// # Safety
/// `info` must be a valid native create info and `client` a live client
/// device with one trailing header per requested queue.
pub(crate) unsafe fn create_device(
    pd: &HostPhysicalDevice,
    info: *const vk::DeviceCreateInfo<'_>,
    client: NonNull<ClientDevice>,
) -> HostResult<vk::Result> {
    let instance = pd.instance();
    let create = require(instance.funcs.create_device, "vkCreateDevice")?;
    let get_proc_addr = require(instance.funcs.get_device_proc_addr, "vkGetDeviceProcAddr")?;
    // SAFETY: valid per caller.
    let info = unsafe { &*info };

    for i in 0..info.enabled_extension_count as usize {
        // SAFETY: the create info lists this many strings.
        let name = unsafe { CStr::from_ptr(*info.pp_enabled_extension_names.add(i)) };
        if !pd.extensions.iter().any(|p| name_of(&p.extension_name) == name) {
            warn!("device extension {:?} is not supported by the host", name);
            return Ok(vk::Result::ERROR_EXTENSION_NOT_PRESENT);
        }
    }

    let queues = queue_create_infos(info);
    // SAFETY: client header is live per caller.
    let reserved = unsafe { client.as_ref() }.queue_count as usize;
    if reserved != queue_count(info) {
        error!("client device has {} queue slots, create info asks for {}", reserved, queue_count(info));
        return Err(NtStatus::INVALID_PARAMETER);
    }

    let mut handle = vk::Device::null();
    // SAFETY: info is valid; allocation callbacks stay on the client side.
    let res = unsafe { create(pd.handle, info, ptr::null(), &mut handle) };
    if res != vk::Result::SUCCESS {
        debug!("host vkCreateDevice failed: {:?}", res);
        return Ok(res);
    }
    // SAFETY: handle is a live host device.
    let funcs = unsafe { DeviceFuncs::load(|name| get_proc_addr(handle, name.as_ptr())) };

    let wrapper = Box::new(HostDevice {
        obj: VulkanObject::new(handle.as_raw()),
        handle,
        physical_device: NonNull::from(pd),
        funcs,
        queues: Vec::with_capacity(reserved),
    });
    // SAFETY: the client header is live and the wrapper is not yet shared.
    unsafe {
        let device = register(wrapper, Some(client.cast()), Some(&instance.registry));
        let dev = &mut *device.as_ptr();
        (*client.as_ptr()).quirks = instance.quirks.bits();

        let mut slot = 0;
        for q in queues {
            for index in 0..q.queue_count {
                let queue = get_host_queue(&dev.funcs, handle, q.flags, q.queue_family_index, index);
                let wrapper = Box::new(HostQueue {
                    obj: VulkanObject::new(queue.as_raw()),
                    handle: queue,
                    device,
                    family_index: q.queue_family_index,
                    queue_index: index,
                    flags: q.flags,
                });
                let header = ClientDevice::queue(client, slot);
                dev.queues.push(register(wrapper, Some(header), Some(&instance.registry)));
                slot += 1;
            }
        }
        debug!("created device {:#x} with {} queues", handle.as_raw(), dev.queues.len());
    }
    Ok(vk::Result::SUCCESS)
}

unsafe fn get_host_queue(
    funcs: &DeviceFuncs,
    device: vk::Device,
    flags: vk::DeviceQueueCreateFlags,
    family: u32,
    index: u32,
) -> vk::Queue {
    let mut queue = vk::Queue::null();
    // SAFETY: the queue was requested at device creation.
    unsafe {
        if flags.is_empty() {
            if let Some(get) = funcs.get_device_queue {
                get(device, family, index, &mut queue);
            }
        } else if let Some(get) = funcs.get_device_queue2 {
            let info = vk::DeviceQueueInfo2 {
                flags,
                queue_family_index: family,
                queue_index: index,
                ..Default::default()
            };
            get(device, &info, &mut queue);
        }
    }
    queue
}

/// # Safety
/// `raw` must be null or a live client device handle.
pub(crate) unsafe fn destroy_device(raw: u64) -> HostResult<()> {
    let Some(handle) = ClientHandle::dispatchable(raw) else {
        return Ok(());
    };
    // SAFETY: live per caller.
    let device = unsafe { lookup_by_client::<HostDevice>(handle) };
    let dev = unsafe { device.as_ref() };
    let destroy = require(dev.funcs.destroy_device, "vkDestroyDevice")?;
    let registry = &dev.instance().registry;
    // SAFETY: the client promises the device is idle and childless.
    unsafe {
        destroy(dev.handle, ptr::null());
        for queue in &dev.queues {
            drop(unregister(*queue, Some(registry)));
        }
        let wrapper = unregister(device, Some(registry));
        debug!("destroyed device {:#x}", wrapper.handle.as_raw());
    }
    Ok(())
}

/// Client handle of a queue created without flags; 0 when there is none.
pub(crate) fn device_queue(device: &HostDevice, family: u32, index: u32) -> u64 {
    device
        .queues
        .iter()
        // SAFETY: queues live as long as their device.
        .map(|q| unsafe { q.as_ref() })
        .find(|q| q.flags.is_empty() && q.family_index == family && q.queue_index == index)
        .map(|q| q.obj.client_handle)
        .unwrap_or_else(|| {
            warn!("no queue {} in family {}", index, family);
            0
        })
}

pub(crate) fn device_wait_idle(device: &HostDevice) -> HostResult<vk::Result> {
    let wait = require(device.funcs.device_wait_idle, "vkDeviceWaitIdle")?;
    // SAFETY: live device.
    Ok(unsafe { wait(device.handle) })
}
