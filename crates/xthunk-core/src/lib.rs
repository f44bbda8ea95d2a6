//! Machinery shared by the host library: configuration, the host/client
//! object registry, scratch allocation for marshaled structures, and the
//! 32-bit structure adapter.

pub mod config;
pub mod conversion;
pub mod error;
pub mod registry;
pub mod wow64;

pub use config::ThunkConfig;
pub use conversion::ConversionContext;
pub use error::CoreError;
pub use registry::{ClientHandle, HostObject, ObjectRegistry, VulkanObject};
