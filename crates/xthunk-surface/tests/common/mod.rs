#![allow(dead_code)]

use std::sync::Arc;

use xthunk_core::config::SurfaceConfig;
use xthunk_surface::{Hwnd, Rect, SoftwareCompositor, SurfaceManager, WindowTable, NATIVE_ID_PROPERTY};

pub const RED: u32 = 0xffff_0000;
pub const GREEN: u32 = 0xff00_ff00;
pub const BLUE: u32 = 0xff00_00ff;

pub struct Desktop {
    pub manager: SurfaceManager,
    pub backend: Arc<SoftwareCompositor>,
    pub windows: Arc<WindowTable>,
}

impl Desktop {
    pub fn new() -> Self {
        xthunk_common::logging::try_init_test_logging();
        let config = SurfaceConfig::default();
        let backend = Arc::new(SoftwareCompositor::new(&config));
        let windows = Arc::new(WindowTable::new());
        let manager = SurfaceManager::new(backend.clone(), windows.clone(), &config);
        Self {
            manager,
            backend,
            windows,
        }
    }

    /// A 200x150 toplevel whose client area starts at (10, 20).
    pub fn add_window(&self, hwnd: Hwnd, native_id: Option<u64>) {
        self.windows
            .insert(hwnd, Rect::new(0, 0, 200, 150), Rect::new(10, 20, 190, 140));
        if let Some(id) = native_id {
            use xthunk_surface::WindowSystem;
            self.windows.set_property(hwnd, NATIVE_ID_PROPERTY, id);
        }
    }

    /// A window with a created toplevel.
    pub fn mapped(&self, hwnd: Hwnd) {
        self.add_window(hwnd, Some(0x4000_0000 | hwnd.0));
        self.manager.create_toplevel(hwnd).expect("toplevel");
    }
}
