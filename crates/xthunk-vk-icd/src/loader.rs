//! The one connection from the client stubs to the host library.
//!
//! An embedder attaches a [`UnixCallDispatcher`] once per process; every stub
//! then crosses the boundary through [`unix_call`] or [`fast_call`].

use std::sync::OnceLock;

use ash::vk;
use tracing::{debug, info};
use xthunk_core::ThunkConfig;
use xthunk_protocol::params::{InitOpenxrParams, InitVulkanParams};
use xthunk_protocol::xr::XrResult;
use xthunk_protocol::{DispatchError, FastArgs, FastCode, FuncCode, TableSignature, UnixCallDispatcher};

/// Client-side switches.
#[derive(Debug, Clone, Copy)]
pub struct LoaderOptions {
    /// Hot `vkCmd*` calls travel as register words instead of blocks.
    pub fast_path: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self { fast_path: true }
    }
}

impl From<&ThunkConfig> for LoaderOptions {
    fn from(config: &ThunkConfig) -> Self {
        Self {
            fast_path: config.dispatch.fast_path,
        }
    }
}

struct Loader {
    dispatcher: Box<dyn UnixCallDispatcher>,
    options: LoaderOptions,
    vulkan: vk::Result,
    openxr: OnceLock<XrResult>,
}

static LOADER: OnceLock<Loader> = OnceLock::new();

/// Connects the stubs to a host dispatcher and runs its Vulkan init call.
///
/// The dispatcher's table signature must equal this build's; a mismatch
/// means the two halves were built from different tables.
pub fn attach(dispatcher: Box<dyn UnixCallDispatcher>, options: LoaderOptions) -> Result<(), DispatchError> {
    let client = TableSignature::current();
    let host = dispatcher.signature();
    if client != host {
        return Err(DispatchError::TableMismatch { client, host });
    }

    let mut params = InitVulkanParams {
        result: vk::Result::ERROR_INITIALIZATION_FAILED,
    };
    // SAFETY: InitVulkan takes this block.
    let status = unsafe { dispatcher.call(FuncCode::InitVulkan, std::ptr::from_mut(&mut params).cast()) };
    assert!(status.is_success(), "init_vulkan failed: {:?}", status);

    let loader = Loader {
        dispatcher,
        options,
        vulkan: params.result,
        openxr: OnceLock::new(),
    };
    LOADER.set(loader).map_err(|_| DispatchError::AlreadyAttached)?;
    info!(
        "attached to host tables ({} entry points, fast path {})",
        client.count,
        if options.fast_path { "on" } else { "off" }
    );
    Ok(())
}

pub fn is_attached() -> bool {
    LOADER.get().is_some()
}

fn loader() -> &'static Loader {
    match LOADER.get() {
        Some(loader) => loader,
        None => panic!("xthunk ICD used before a host dispatcher was attached"),
    }
}

/// Result of the host's Vulkan init; anything but success makes instance
/// creation fail.
pub fn vulkan_status() -> vk::Result {
    LOADER.get().map_or(vk::Result::ERROR_INITIALIZATION_FAILED, |l| l.vulkan)
}

/// Runs the host's OpenXR init the first time it is needed.
pub fn openxr_status() -> XrResult {
    let Some(loader) = LOADER.get() else {
        return XrResult::ERROR_INITIALIZATION_FAILED;
    };
    *loader.openxr.get_or_init(|| {
        let mut params = InitOpenxrParams {
            result: XrResult::ERROR_INITIALIZATION_FAILED,
        };
        unix_call(FuncCode::InitOpenxr, &mut params);
        debug!("host OpenXR init: {:?}", params.result);
        params.result
    })
}

pub fn fast_path() -> bool {
    loader().options.fast_path
}

/// Calls host function `code` with `params`. A failed crossing is a build
/// or link defect and aborts the caller.
///
/// Only the stubs call this, each with the block type its `code` takes.
pub(crate) fn unix_call<P>(code: FuncCode, params: &mut P) -> xthunk_protocol::NtStatus {
    // SAFETY: each stub pairs `code` with its own parameter block type.
    let status = unsafe { loader().dispatcher.call(code, std::ptr::from_mut(params).cast()) };
    assert!(status.is_success(), "{} failed: {:?}", code.name(), status);
    status
}

/// Fast-path crossing, fatal on failure like [`unix_call`].
pub(crate) fn fast_call(code: FastCode, args: FastArgs) {
    // SAFETY: stubs pack exactly the arguments the entry point takes.
    let status = unsafe { loader().dispatcher.fast_call(code, args) };
    assert!(status.is_success(), "{} failed: {:?}", code.name(), status);
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;
    use std::sync::Once;

    use xthunk_protocol::params::EnumerateInstanceVersionParams;
    use xthunk_protocol::{fast_args, NtStatus};

    use super::*;

    /// Accepts init and rejects everything else on both paths.
    struct RejectingHost;

    impl UnixCallDispatcher for RejectingHost {
        fn signature(&self) -> TableSignature {
            TableSignature::current()
        }

        unsafe fn call(&self, code: FuncCode, _params: *mut c_void) -> NtStatus {
            match code {
                FuncCode::InitVulkan => NtStatus::SUCCESS,
                _ => NtStatus::INVALID_PARAMETER,
            }
        }

        unsafe fn fast_call(&self, _code: FastCode, _args: FastArgs) -> NtStatus {
            NtStatus::INVALID_PARAMETER
        }
    }

    fn attach_rejecting() {
        static ATTACH: Once = Once::new();
        ATTACH.call_once(|| attach(Box::new(RejectingHost), LoaderOptions::default()).unwrap());
    }

    #[test]
    #[should_panic(expected = "vkEnumerateInstanceVersion failed")]
    fn failed_unix_call_panics() {
        attach_rejecting();
        let mut version = 0;
        let mut params = EnumerateInstanceVersionParams {
            api_version: &mut version,
            result: vk::Result::SUCCESS,
        };
        unix_call(FuncCode::EnumerateInstanceVersion, &mut params);
    }

    #[test]
    #[should_panic(expected = "vkCmdDraw failed")]
    fn failed_fast_call_panics() {
        attach_rejecting();
        fast_call(FastCode::CmdDraw, fast_args![0u64, 3u32, 1u32, 0u32, 0u32]);
    }
}
