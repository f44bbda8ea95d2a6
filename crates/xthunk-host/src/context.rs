use std::sync::Arc;

use xthunk_core::wow64::{AddressSpace32, Identity32};
use xthunk_core::ThunkConfig;

use crate::driver::{HostDriver, XrDriver};

/// Everything a thunk may consult besides its parameter block.
pub struct HostContext {
    driver: HostDriver,
    xr: Option<XrDriver>,
    config: ThunkConfig,
    space: Arc<dyn AddressSpace32>,
}

impl HostContext {
    pub fn new(driver: HostDriver, config: ThunkConfig) -> Self {
        Self {
            driver,
            xr: None,
            config,
            space: Arc::new(Identity32),
        }
    }

    pub fn with_openxr(mut self, xr: XrDriver) -> Self {
        self.xr = Some(xr);
        self
    }

    /// Address space 32-bit parameter blocks are resolved in.
    pub fn with_address_space(mut self, space: Arc<dyn AddressSpace32>) -> Self {
        self.space = space;
        self
    }

    pub fn driver(&self) -> &HostDriver {
        &self.driver
    }

    pub fn xr(&self) -> Option<&XrDriver> {
        self.xr.as_ref()
    }

    pub fn config(&self) -> &ThunkConfig {
        &self.config
    }

    pub fn space(&self) -> &dyn AddressSpace32 {
        &*self.space
    }
}
