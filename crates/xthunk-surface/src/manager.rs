//! Window to toplevel registry.
//!
//! `surfaces_cs` guards the registry and every toplevel's native surface.
//! A drawable's own lock ranks below it: flushing takes the drawable lock
//! and then `surfaces_cs`, while nothing here takes a drawable lock with
//! `surfaces_cs` held.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};
use xthunk_core::config::SurfaceConfig;

use crate::backend::SurfaceBackend;
use crate::error::SurfaceError;
use crate::lock_order::{RankedMutex, SURFACES_RANK};
use crate::types::{Hwnd, NativeId, NativeSurface, Rect};
use crate::window_surface::WindowSurface;
use crate::windowing::{WindowSystem, NATIVE_ID_PROPERTY};

/// The compositing target of one top-level window.
#[derive(Debug)]
pub struct ToplevelSurface {
    hwnd: Hwnd,
    // Only touched with surfaces_cs held.
    native: Mutex<Option<NativeSurface>>,
}

impl ToplevelSurface {
    pub fn hwnd(&self) -> Hwnd {
        self.hwnd
    }

    /// The backend toplevel, `None` before creation and after deletion.
    pub fn native(&self) -> Option<NativeSurface> {
        *self.native.lock()
    }
}

pub(crate) type Registry = BTreeMap<Hwnd, Arc<ToplevelSurface>>;

pub(crate) struct Shared {
    pub(crate) surfaces_cs: RankedMutex<Registry>,
    pub(crate) backend: Arc<dyn SurfaceBackend>,
    pub(crate) windows: Arc<dyn WindowSystem>,
    pub(crate) lock_order_checks: bool,
}

/// Owns the window to toplevel registry. Built by the caller and passed to
/// whoever handles window events.
#[derive(Clone)]
pub struct SurfaceManager {
    shared: Arc<Shared>,
}

impl SurfaceManager {
    pub fn new(backend: Arc<dyn SurfaceBackend>, windows: Arc<dyn WindowSystem>, config: &SurfaceConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                surfaces_cs: RankedMutex::with_checks(
                    SURFACES_RANK,
                    "surfaces_cs",
                    BTreeMap::new(),
                    config.lock_order_checks,
                ),
                backend,
                windows,
                lock_order_checks: config.lock_order_checks,
            }),
        }
    }

    /// Look up or create the entry for `hwnd` and give it a native toplevel,
    /// resolving the native id from the window's property.
    pub fn create_toplevel(&self, hwnd: Hwnd) -> Result<Arc<ToplevelSurface>, SurfaceError> {
        let native_id = self.shared.windows.get_property(hwnd, NATIVE_ID_PROPERTY);
        self.create(hwnd, native_id)
    }

    /// Same as [`create_toplevel`](Self::create_toplevel) once the windowing
    /// backend has mapped the window and knows its native id.
    pub fn create_toplevel_notify(&self, hwnd: Hwnd, native_id: NativeId) -> Result<Arc<ToplevelSurface>, SurfaceError> {
        self.shared.windows.set_property(hwnd, NATIVE_ID_PROPERTY, native_id);
        self.create(hwnd, Some(native_id))
    }

    fn create(&self, hwnd: Hwnd, native_id: Option<NativeId>) -> Result<Arc<ToplevelSurface>, SurfaceError> {
        let mut surfaces = self.shared.surfaces_cs.lock();
        let toplevel = surfaces
            .entry(hwnd)
            .or_insert_with(|| {
                Arc::new(ToplevelSurface {
                    hwnd,
                    native: Mutex::new(None),
                })
            })
            .clone();

        let mut native = toplevel.native.lock();
        if native.is_some() {
            drop(native);
            return Ok(toplevel);
        }
        let Some(native_id) = native_id else {
            let err = SurfaceError::NoNativeId(hwnd);
            error!("{}", err);
            drop(native);
            return Err(err);
        };
        let rect = self.shared.windows.window_rect(hwnd);
        match self.shared.backend.create_toplevel(native_id, rect) {
            Ok(surface) => {
                debug!(%hwnd, native_id, ?surface, "created toplevel");
                *native = Some(surface);
            }
            Err(err) => {
                error!(%hwnd, "{}", err);
                return Err(err);
            }
        }
        drop(native);
        Ok(toplevel)
    }

    /// Drop the entry and destroy its native toplevel now. Drawables that
    /// still reference it find it lost on their next flush.
    pub fn delete_toplevel(&self, hwnd: Hwnd) {
        let mut surfaces = self.shared.surfaces_cs.lock();
        let Some(toplevel) = surfaces.remove(&hwnd) else {
            return;
        };
        let native = toplevel.native.lock().take();
        if let Some(native) = native {
            debug!(%hwnd, ?native, "destroying toplevel");
            self.shared.backend.destroy(native);
        }
    }

    /// Pass the window's current geometry to its native toplevel.
    pub fn resize_toplevel(&self, hwnd: Hwnd) {
        let surfaces = self.shared.surfaces_cs.lock();
        let Some(native) = surfaces.get(&hwnd).and_then(|t| t.native()) else {
            return;
        };
        let rect = self.shared.windows.window_rect(hwnd);
        if let Err(err) = self.shared.backend.resize_toplevel(native, rect) {
            error!(%hwnd, "resize failed: {}", err);
        }
    }

    pub fn toplevel(&self, hwnd: Hwnd) -> Option<Arc<ToplevelSurface>> {
        self.shared.surfaces_cs.lock().get(&hwnd).cloned()
    }

    /// Make `slot` hold a drawable for `hwnd` on `root`'s toplevel covering
    /// `visible_rect`.
    ///
    /// The current drawable is kept when it already has the same toplevel,
    /// window and size. Without a backed toplevel for `root` the slot is left
    /// as it is, which includes leaving an empty slot empty.
    pub fn update_window_surface(
        &self,
        root: Hwnd,
        hwnd: Hwnd,
        visible_rect: Rect,
        slot: &mut Option<Arc<WindowSurface>>,
    ) {
        let surfaces = self.shared.surfaces_cs.lock();
        let Some(toplevel) = surfaces.get(&root).cloned() else {
            return;
        };
        let Some(native) = toplevel.native() else {
            return;
        };

        let rect = visible_rect.at_origin();
        if let Some(current) = slot {
            if Arc::ptr_eq(current.toplevel(), &toplevel) && current.hwnd() == hwnd && current.rect() == rect {
                return;
            }
        }

        let surface = WindowSurface::new(self.shared.clone(), toplevel, native, hwnd, rect);
        debug!(%root, %hwnd, ?rect, desc = ?surface.desc(), "built window surface");
        *slot = Some(Arc::new(surface));
        drop(surfaces);
    }
}
