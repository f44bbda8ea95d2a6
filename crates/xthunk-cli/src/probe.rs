//! `xthunk probe`: attach the client stubs to the host library in-process
//! and walk the same path an application would.

use std::ffi::CString;
use std::ptr;

use anyhow::{bail, Context};
use ash::vk;
use xthunk_core::ThunkConfig;
use xthunk_host::UnixLib;
use xthunk_vk_icd::instance::{
    vkCreateInstance, vkDestroyInstance, vkEnumerateInstanceVersion, vkEnumeratePhysicalDevices,
    vkGetPhysicalDeviceProperties,
};
use xthunk_vk_icd::proc_addr::vkGetInstanceProcAddr;
use xthunk_vk_icd::LoaderOptions;

pub fn run(config: &ThunkConfig, names: &[String]) -> anyhow::Result<()> {
    let lib = UnixLib::from_config(config).context("loading the host driver")?;
    xthunk_vk_icd::attach(Box::new(lib), LoaderOptions::from(config)).context("attaching the client stubs")?;

    let mut version = 0;
    // SAFETY: valid out pointer.
    let res = unsafe { vkEnumerateInstanceVersion(&mut version) };
    if res != vk::Result::SUCCESS {
        bail!("vkEnumerateInstanceVersion failed: {:?}", res);
    }
    println!(
        "Host Vulkan {}.{}.{}",
        vk::api_version_major(version),
        vk::api_version_minor(version),
        vk::api_version_patch(version)
    );

    let app = vk::ApplicationInfo::default()
        .application_name(c"xthunk-probe")
        .api_version(vk::API_VERSION_1_1);
    let create_info = vk::InstanceCreateInfo::default().application_info(&app);
    let mut instance = vk::Instance::null();
    // SAFETY: the create info outlives the call.
    let res = unsafe { vkCreateInstance(&create_info, ptr::null(), &mut instance) };
    if res != vk::Result::SUCCESS {
        bail!("vkCreateInstance failed: {:?}", res);
    }

    let report = report(instance, names);
    // SAFETY: created above and not used afterwards.
    unsafe { vkDestroyInstance(instance, ptr::null()) };
    report
}

fn report(instance: vk::Instance, names: &[String]) -> anyhow::Result<()> {
    let mut count = 0;
    // SAFETY: live instance, valid out pointers.
    unsafe { vkEnumeratePhysicalDevices(instance, &mut count, ptr::null_mut()) }.result()?;
    let mut devices = vec![vk::PhysicalDevice::null(); count as usize];
    // SAFETY: as above, `devices` holds `count` entries.
    unsafe { vkEnumeratePhysicalDevices(instance, &mut count, devices.as_mut_ptr()) }.result()?;
    devices.truncate(count as usize);

    println!("Physical devices ({}):", devices.len());
    for (i, &pd) in devices.iter().enumerate() {
        let mut props = vk::PhysicalDeviceProperties::default();
        // SAFETY: handle from the enumeration above.
        unsafe { vkGetPhysicalDeviceProperties(pd, &mut props) };
        let name = props.device_name_as_c_str().context("device name")?;
        println!("  GPU {}: {}", i, name.to_string_lossy());
        println!("    Type:     {:?}", props.device_type);
        println!(
            "    API:      {}.{}.{}",
            vk::api_version_major(props.api_version),
            vk::api_version_minor(props.api_version),
            vk::api_version_patch(props.api_version)
        );
    }

    if names.is_empty() {
        return Ok(());
    }
    println!();
    println!("Gate:");
    for name in names {
        let c_name = CString::new(name.as_str()).with_context(|| format!("bad function name {:?}", name))?;
        // SAFETY: live instance, nul-terminated name.
        let available = unsafe { vkGetInstanceProcAddr(instance, c_name.as_ptr()) }.is_some();
        println!("  {:<40} {}", name, if available { "available" } else { "unavailable" });
    }
    Ok(())
}
