//! Stable numeric codes for every entry point that crosses the boundary.

use crate::fast::FastCode;

/// Bumped whenever a parameter block layout changes without a rename.
pub const TABLE_VERSION: u32 = 1;

macro_rules! unix_funcs {
    ($($variant:ident => $name:literal,)*) => {
        /// One code per entry point. The discriminant is the index into the
        /// host's function table.
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FuncCode {
            $($variant,)*
        }

        impl FuncCode {
            pub const ALL: &'static [FuncCode] = &[$(FuncCode::$variant,)*];
            pub const COUNT: usize = Self::ALL.len();

            /// API name of the entry point.
            pub const fn name(self) -> &'static str {
                match self {
                    $(FuncCode::$variant => $name,)*
                }
            }
        }
    };
}

unix_funcs! {
    InitVulkan => "init_vulkan",
    InitOpenxr => "init_openxr",
    IsAvailableInstanceFunction => "is_available_instance_function",
    IsAvailableDeviceFunction => "is_available_device_function",
    XrIsAvailableInstanceFunction => "xr_is_available_instance_function",
    CreateInstance => "vkCreateInstance",
    DestroyInstance => "vkDestroyInstance",
    EnumerateInstanceVersion => "vkEnumerateInstanceVersion",
    EnumerateInstanceExtensionProperties => "vkEnumerateInstanceExtensionProperties",
    EnumeratePhysicalDevices => "vkEnumeratePhysicalDevices",
    GetPhysicalDeviceProperties => "vkGetPhysicalDeviceProperties",
    GetPhysicalDeviceFeatures2 => "vkGetPhysicalDeviceFeatures2",
    EnumerateDeviceExtensionProperties => "vkEnumerateDeviceExtensionProperties",
    CreateDevice => "vkCreateDevice",
    DestroyDevice => "vkDestroyDevice",
    GetDeviceQueue => "vkGetDeviceQueue",
    DeviceWaitIdle => "vkDeviceWaitIdle",
    CreateCommandPool => "vkCreateCommandPool",
    DestroyCommandPool => "vkDestroyCommandPool",
    AllocateCommandBuffers => "vkAllocateCommandBuffers",
    FreeCommandBuffers => "vkFreeCommandBuffers",
    BeginCommandBuffer => "vkBeginCommandBuffer",
    EndCommandBuffer => "vkEndCommandBuffer",
    CmdDraw => "vkCmdDraw",
    CmdDrawIndexed => "vkCmdDrawIndexed",
    CmdDispatch => "vkCmdDispatch",
    CmdSetLineWidth => "vkCmdSetLineWidth",
    CmdSetDepthBias => "vkCmdSetDepthBias",
    CmdSetStencilReference => "vkCmdSetStencilReference",
    CmdSetBlendConstants => "vkCmdSetBlendConstants",
    CmdBindPipeline => "vkCmdBindPipeline",
    CreateFence => "vkCreateFence",
    DestroyFence => "vkDestroyFence",
    WaitForFences => "vkWaitForFences",
    CreateSemaphore => "vkCreateSemaphore",
    DestroySemaphore => "vkDestroySemaphore",
    QueueSubmit => "vkQueueSubmit",
    QueueWaitIdle => "vkQueueWaitIdle",
    CreateDeferredOperationKHR => "vkCreateDeferredOperationKHR",
    DestroyDeferredOperationKHR => "vkDestroyDeferredOperationKHR",
    GetDeferredOperationResultKHR => "vkGetDeferredOperationResultKHR",
    CopyAccelerationStructureKHR => "vkCopyAccelerationStructureKHR",
    CreateDebugUtilsMessengerEXT => "vkCreateDebugUtilsMessengerEXT",
    DestroyDebugUtilsMessengerEXT => "vkDestroyDebugUtilsMessengerEXT",
    XrEnumerateInstanceExtensionProperties => "xrEnumerateInstanceExtensionProperties",
    XrCreateInstance => "xrCreateInstance",
    XrDestroyInstance => "xrDestroyInstance",
    XrCreateSession => "xrCreateSession",
    XrDestroySession => "xrDestroySession",
    XrCreateSwapchain => "xrCreateSwapchain",
    XrDestroySwapchain => "xrDestroySwapchain",
    XrCreateReferenceSpace => "xrCreateReferenceSpace",
    XrDestroySpace => "xrDestroySpace",
}

impl FuncCode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

/// Identifies one build of the function tables. Both sides must agree
/// before any call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableSignature {
    pub version: u32,
    pub count: u32,
    pub fast_count: u32,
    pub checksum: u64,
}

impl TableSignature {
    /// Signature of the tables compiled into this build.
    pub fn current() -> Self {
        let names = FuncCode::ALL
            .iter()
            .map(|c| c.name())
            .chain(FastCode::ALL.iter().map(|c| c.name()));
        Self {
            version: TABLE_VERSION,
            count: FuncCode::COUNT as u32,
            fast_count: FastCode::COUNT as u32,
            checksum: fnv1a(names),
        }
    }
}

fn fnv1a<'a>(names: impl Iterator<Item = &'a str>) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for name in names {
        for byte in name.bytes().chain(std::iter::once(0)) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dense() {
        for (i, code) in FuncCode::ALL.iter().enumerate() {
            assert_eq!(code.as_raw() as usize, i);
            assert_eq!(FuncCode::from_raw(i as u32), Some(*code));
        }
        assert_eq!(FuncCode::from_raw(FuncCode::COUNT as u32), None);
    }

    #[test]
    fn signature_is_stable_within_a_build() {
        assert_eq!(TableSignature::current(), TableSignature::current());
        assert_eq!(TableSignature::current().count as usize, FuncCode::COUNT);
    }
}
