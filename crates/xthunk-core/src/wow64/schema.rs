//! Field-list descriptions of the structures the adapter understands.
//!
//! A schema lists fields in declaration order; offsets for either pointer
//! width are computed from it with C layout rules, so the 32-bit and native
//! layouts can never drift apart.

use ash::vk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W32,
    W64,
}

impl Width {
    #[cfg(target_pointer_width = "64")]
    pub const NATIVE: Width = Width::W64;
    #[cfg(not(target_pointer_width = "64"))]
    pub const NATIVE: Width = Width::W32;

    pub const fn pointer_size(self) -> usize {
        match self {
            Width::W32 => 4,
            Width::W64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// `sType`.
    Tag,
    /// `pNext`; the chain behind it is converted by tag.
    Next,
    U32,
    /// 64-bit scalar or non-dispatchable handle; 8-aligned in both widths.
    U64,
    /// Inline data whose layout is width independent.
    Bytes { size: usize, align: usize },
    /// Pointer to width-independent data (strings, scalar arrays).
    Ptr,
    /// Pointer to one structure of the given schema.
    StructPtr(&'static StructSchema),
    /// Pointer to an array of structures; `count` is the index of the
    /// `U32` field holding the length.
    StructArray {
        count: usize,
        schema: &'static StructSchema,
    },
    /// Pointer to an array of pointers (string lists).
    PtrArray { count: usize },
    /// Pointer to an array of dispatchable client handles, replaced by the
    /// host handles they stand for.
    DispatchableArray { count: usize },
}

impl FieldKind {
    pub const fn size_align(self, width: Width) -> (usize, usize) {
        match self {
            FieldKind::Tag | FieldKind::U32 => (4, 4),
            FieldKind::U64 => (8, 8),
            FieldKind::Bytes { size, align } => (size, align),
            FieldKind::Next
            | FieldKind::Ptr
            | FieldKind::StructPtr(_)
            | FieldKind::StructArray { .. }
            | FieldKind::PtrArray { .. }
            | FieldKind::DispatchableArray { .. } => {
                let p = width.pointer_size();
                (p, p)
            }
        }
    }
}

pub const MAX_FIELDS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructLayout {
    pub offsets: [usize; MAX_FIELDS],
    pub size: usize,
    pub align: usize,
}

#[derive(Debug)]
pub struct StructSchema {
    pub name: &'static str,
    pub s_type: vk::StructureType,
    pub fields: &'static [FieldKind],
}

impl StructSchema {
    pub fn layout(&self, width: Width) -> StructLayout {
        debug_assert!(self.fields.len() <= MAX_FIELDS, "{} has too many fields", self.name);
        let mut offsets = [0; MAX_FIELDS];
        let mut offset: usize = 0;
        let mut align = 1;
        for (slot, field) in offsets.iter_mut().zip(self.fields) {
            let (size, field_align) = field.size_align(width);
            offset = offset.next_multiple_of(field_align);
            *slot = offset;
            offset += size;
            align = align.max(field_align);
        }
        StructLayout {
            offsets,
            size: offset.next_multiple_of(align),
            align,
        }
    }
}

use FieldKind::*;

pub static APPLICATION_INFO: StructSchema = StructSchema {
    name: "VkApplicationInfo",
    s_type: vk::StructureType::APPLICATION_INFO,
    fields: &[Tag, Next, Ptr, U32, Ptr, U32, U32],
};

pub static INSTANCE_CREATE_INFO: StructSchema = StructSchema {
    name: "VkInstanceCreateInfo",
    s_type: vk::StructureType::INSTANCE_CREATE_INFO,
    fields: &[
        Tag,
        Next,
        U32,
        StructPtr(&APPLICATION_INFO),
        U32,
        PtrArray { count: 4 },
        U32,
        PtrArray { count: 6 },
    ],
};

pub static VALIDATION_FEATURES_EXT: StructSchema = StructSchema {
    name: "VkValidationFeaturesEXT",
    s_type: vk::StructureType::VALIDATION_FEATURES_EXT,
    fields: &[Tag, Next, U32, Ptr, U32, Ptr],
};

pub static DEVICE_QUEUE_CREATE_INFO: StructSchema = StructSchema {
    name: "VkDeviceQueueCreateInfo",
    s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
    fields: &[Tag, Next, U32, U32, U32, Ptr],
};

pub static DEVICE_CREATE_INFO: StructSchema = StructSchema {
    name: "VkDeviceCreateInfo",
    s_type: vk::StructureType::DEVICE_CREATE_INFO,
    fields: &[
        Tag,
        Next,
        U32,
        U32,
        StructArray {
            count: 3,
            schema: &DEVICE_QUEUE_CREATE_INFO,
        },
        U32,
        PtrArray { count: 5 },
        U32,
        PtrArray { count: 7 },
        Ptr,
    ],
};

/// `VkPhysicalDeviceFeatures`: 55 `VkBool32` members.
const PHYSICAL_DEVICE_FEATURES: FieldKind = Bytes { size: 55 * 4, align: 4 };

pub static PHYSICAL_DEVICE_FEATURES_2: StructSchema = StructSchema {
    name: "VkPhysicalDeviceFeatures2",
    s_type: vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
    fields: &[Tag, Next, PHYSICAL_DEVICE_FEATURES],
};

pub static PHYSICAL_DEVICE_TIMELINE_SEMAPHORE_FEATURES: StructSchema = StructSchema {
    name: "VkPhysicalDeviceTimelineSemaphoreFeatures",
    s_type: vk::StructureType::PHYSICAL_DEVICE_TIMELINE_SEMAPHORE_FEATURES,
    fields: &[Tag, Next, U32],
};

pub static SEMAPHORE_CREATE_INFO: StructSchema = StructSchema {
    name: "VkSemaphoreCreateInfo",
    s_type: vk::StructureType::SEMAPHORE_CREATE_INFO,
    fields: &[Tag, Next, U32],
};

pub static SEMAPHORE_TYPE_CREATE_INFO: StructSchema = StructSchema {
    name: "VkSemaphoreTypeCreateInfo",
    s_type: vk::StructureType::SEMAPHORE_TYPE_CREATE_INFO,
    fields: &[Tag, Next, U32, U64],
};

pub static FENCE_CREATE_INFO: StructSchema = StructSchema {
    name: "VkFenceCreateInfo",
    s_type: vk::StructureType::FENCE_CREATE_INFO,
    fields: &[Tag, Next, U32],
};

pub static EXPORT_FENCE_CREATE_INFO: StructSchema = StructSchema {
    name: "VkExportFenceCreateInfo",
    s_type: vk::StructureType::EXPORT_FENCE_CREATE_INFO,
    fields: &[Tag, Next, U32],
};

pub static COMMAND_POOL_CREATE_INFO: StructSchema = StructSchema {
    name: "VkCommandPoolCreateInfo",
    s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
    fields: &[Tag, Next, U32, U32],
};

pub static COMMAND_BUFFER_ALLOCATE_INFO: StructSchema = StructSchema {
    name: "VkCommandBufferAllocateInfo",
    s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
    fields: &[Tag, Next, U64, U32, U32],
};

pub static COMMAND_BUFFER_INHERITANCE_INFO: StructSchema = StructSchema {
    name: "VkCommandBufferInheritanceInfo",
    s_type: vk::StructureType::COMMAND_BUFFER_INHERITANCE_INFO,
    fields: &[Tag, Next, U64, U32, U64, U32, U32, U32],
};

pub static COMMAND_BUFFER_BEGIN_INFO: StructSchema = StructSchema {
    name: "VkCommandBufferBeginInfo",
    s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
    fields: &[Tag, Next, U32, StructPtr(&COMMAND_BUFFER_INHERITANCE_INFO)],
};

pub static SUBMIT_INFO: StructSchema = StructSchema {
    name: "VkSubmitInfo",
    s_type: vk::StructureType::SUBMIT_INFO,
    fields: &[
        Tag,
        Next,
        U32,
        Ptr,
        Ptr,
        U32,
        DispatchableArray { count: 5 },
        U32,
        Ptr,
    ],
};

pub static TIMELINE_SEMAPHORE_SUBMIT_INFO: StructSchema = StructSchema {
    name: "VkTimelineSemaphoreSubmitInfo",
    s_type: vk::StructureType::TIMELINE_SEMAPHORE_SUBMIT_INFO,
    fields: &[Tag, Next, U32, Ptr, U32, Ptr],
};

pub static COPY_ACCELERATION_STRUCTURE_INFO_KHR: StructSchema = StructSchema {
    name: "VkCopyAccelerationStructureInfoKHR",
    s_type: vk::StructureType::COPY_ACCELERATION_STRUCTURE_INFO_KHR,
    fields: &[Tag, Next, U64, U64, U32],
};

static KNOWN: &[&StructSchema] = &[
    &APPLICATION_INFO,
    &INSTANCE_CREATE_INFO,
    &VALIDATION_FEATURES_EXT,
    &DEVICE_QUEUE_CREATE_INFO,
    &DEVICE_CREATE_INFO,
    &PHYSICAL_DEVICE_FEATURES_2,
    &PHYSICAL_DEVICE_TIMELINE_SEMAPHORE_FEATURES,
    &SEMAPHORE_CREATE_INFO,
    &SEMAPHORE_TYPE_CREATE_INFO,
    &FENCE_CREATE_INFO,
    &EXPORT_FENCE_CREATE_INFO,
    &COMMAND_POOL_CREATE_INFO,
    &COMMAND_BUFFER_ALLOCATE_INFO,
    &COMMAND_BUFFER_INHERITANCE_INFO,
    &COMMAND_BUFFER_BEGIN_INFO,
    &SUBMIT_INFO,
    &TIMELINE_SEMAPHORE_SUBMIT_INFO,
    &COPY_ACCELERATION_STRUCTURE_INFO_KHR,
];

/// Schema for a structure tag, if the adapter knows it.
pub fn schema_for(s_type: vk::StructureType) -> Option<&'static StructSchema> {
    KNOWN.iter().copied().find(|schema| schema.s_type == s_type)
}

pub fn known_schemas() -> &'static [&'static StructSchema] {
    KNOWN
}
