//! Drawables and their flush path.

use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::backend::Present;
use crate::lock_order::{RankedGuard, RankedMutex, DRAWABLE_RANK};
use crate::manager::{Shared, ToplevelSurface};
use crate::types::{Hwnd, NativeSurface, Rect, Region, SurfaceDesc};

struct DrawableState {
    bits: Vec<u8>,
    bounds: Rect,
    region: Option<Region>,
}

/// A window's pixel buffer, presented onto its toplevel by [`flush`].
///
/// [`flush`]: WindowSurface::flush
pub struct WindowSurface {
    shared: Arc<Shared>,
    toplevel: Arc<ToplevelSurface>,
    hwnd: Hwnd,
    rect: Rect,
    native: Option<NativeSurface>,
    desc: SurfaceDesc,
    state: RankedMutex<DrawableState>,
}

impl fmt::Debug for WindowSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowSurface")
            .field("hwnd", &self.hwnd)
            .field("rect", &self.rect)
            .field("native", &self.native)
            .field("desc", &self.desc)
            .finish()
    }
}

impl WindowSurface {
    pub(crate) fn new(
        shared: Arc<Shared>,
        toplevel: Arc<ToplevelSurface>,
        toplevel_native: NativeSurface,
        hwnd: Hwnd,
        rect: Rect,
    ) -> Self {
        let requested = SurfaceDesc::new(rect.width() as u32, rect.height() as u32);
        let drawable = shared.backend.create_drawable(toplevel_native, requested);
        let state = DrawableState {
            bits: vec![0; drawable.desc.byte_len()],
            bounds: Rect::RESET_BOUNDS,
            region: None,
        };
        let checks = shared.lock_order_checks;
        Self {
            shared,
            toplevel,
            hwnd,
            rect,
            native: drawable.native,
            desc: drawable.desc,
            state: RankedMutex::with_checks(DRAWABLE_RANK, "window surface", state, checks),
        }
    }

    pub fn toplevel(&self) -> &Arc<ToplevelSurface> {
        &self.toplevel
    }

    pub fn hwnd(&self) -> Hwnd {
        self.hwnd
    }

    /// Zero-based extent.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn native(&self) -> Option<NativeSurface> {
        self.native
    }

    pub fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    /// Lock the pixel buffer for drawing.
    pub fn lock(&self) -> SurfaceLock<'_> {
        SurfaceLock {
            desc: self.desc,
            state: self.state.lock(),
        }
    }

    pub fn add_damage(&self, rect: Rect) {
        self.lock().add_damage(rect);
    }

    /// Accumulated damage, [`Rect::RESET_BOUNDS`] when there is none.
    pub fn bounds(&self) -> Rect {
        self.state.lock().bounds
    }

    /// Replace the clip region, or clear it with `None`.
    pub fn set_region(&self, region: Option<&Region>) {
        self.state.lock().region = region.cloned();
    }

    /// Present the accumulated damage onto the toplevel and reset it.
    pub fn flush(&self) {
        if self.rect.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        let dirty = state.bounds.intersect(&self.rect);
        if !dirty.is_empty() {
            self.present(&state, dirty);
        }
        state.bounds = Rect::RESET_BOUNDS;
    }

    fn present(&self, state: &DrawableState, dirty: Rect) {
        let client = self.shared.windows.client_rect(self.hwnd);
        let target_pos = client.top_left().offset(dirty.left, dirty.top);
        let (dx, dy) = (target_pos.x.saturating_sub(dirty.left), target_pos.y.saturating_sub(dirty.top));

        let clips: Vec<Rect> = match &state.region {
            None => vec![dirty.offset(dx, dy)],
            Some(region) => region
                .rects
                .iter()
                .map(|r| r.intersect(&self.rect))
                .filter(|r| !r.is_empty())
                .map(|r| r.offset(dx, dy))
                .collect(),
        };

        let _surfaces = self.shared.surfaces_cs.lock();
        let Some(target) = self.toplevel.native() else {
            warn!(hwnd = %self.hwnd, "surface lost");
            return;
        };
        trace!(hwnd = %self.hwnd, ?target, ?dirty, clips = clips.len(), "present");
        self.shared.backend.present(&Present {
            target,
            source: self.native,
            source_desc: self.desc,
            source_bits: &state.bits,
            target_pos,
            source_rect: dirty,
            clips: &clips,
        });
    }
}

impl Drop for WindowSurface {
    fn drop(&mut self) {
        if let Some(native) = self.native.take() {
            self.shared.backend.destroy(native);
        }
    }
}

/// Drawing access to a [`WindowSurface`].
pub struct SurfaceLock<'a> {
    desc: SurfaceDesc,
    state: RankedGuard<'a, DrawableState>,
}

impl SurfaceLock<'_> {
    pub fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    pub fn bits(&self) -> &[u8] {
        &self.state.bits
    }

    pub fn bits_mut(&mut self) -> &mut [u8] {
        &mut self.state.bits
    }

    /// Extend the damage bounds.
    pub fn add_damage(&mut self, rect: Rect) {
        self.state.bounds = self.state.bounds.union(&rect);
    }

    /// Fill `rect` with a 0xAARRGGBB pixel and damage it.
    pub fn fill(&mut self, rect: Rect, pixel: u32) {
        let extent = Rect::from_size(self.desc.width as i32, self.desc.height as i32);
        let area = rect.intersect(&extent);
        if area.is_empty() {
            return;
        }
        let stride = self.desc.stride as usize;
        if self.state.bits.is_empty() {
            // Unbacked: presents as the diagnostic fill.
            self.add_damage(area);
            return;
        }
        let bytes = pixel.to_ne_bytes();
        for y in area.top..area.bottom {
            let row = y as usize * stride;
            for x in area.left..area.right {
                let at = row + x as usize * 4;
                self.state.bits[at..at + 4].copy_from_slice(&bytes);
            }
        }
        self.add_damage(area);
    }
}
