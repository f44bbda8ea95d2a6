//! In-memory compositing backend.
//!
//! Toplevels are 0xAARRGGBB pixel grids; drawables are bookkeeping only,
//! since their pixels live in the [`WindowSurface`](crate::WindowSurface)
//! that presents them.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};
use xthunk_core::config::SurfaceConfig;

use crate::backend::{Drawable, Present, SurfaceBackend};
use crate::error::SurfaceError;
use crate::fpu::FpuGuard;
use crate::types::{NativeId, NativeSurface, Point, Rect, SurfaceDesc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentStats {
    /// Presents that drew at least one pixel
    pub presents: u64,
    /// Presents with an empty clip list or nothing visible
    pub skipped: u64,
    pub pixels: u64,
    /// Presents of an unbacked source
    pub diagnostic_fills: u64,
}

#[derive(Debug)]
struct Toplevel {
    native_id: NativeId,
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    flushes: u64,
}

impl Toplevel {
    fn new(native_id: NativeId, rect: Rect) -> Self {
        let (width, height) = (rect.width() as u32, rect.height() as u32);
        Self {
            native_id,
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            flushes: 0,
        }
    }

    fn extent(&self) -> Rect {
        Rect::from_size(self.width as i32, self.height as i32)
    }
}

#[derive(Debug)]
enum Surface {
    Toplevel(Toplevel),
    Drawable { toplevel: NativeSurface, dirty: bool },
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    surfaces: HashMap<NativeSurface, Surface>,
    stats: PresentStats,
}

impl Inner {
    fn allocate(&mut self, surface: Surface) -> NativeSurface {
        self.next_id += 1;
        let id = NativeSurface(self.next_id);
        self.surfaces.insert(id, surface);
        id
    }

    fn toplevel_mut(&mut self, id: NativeSurface) -> Option<&mut Toplevel> {
        match self.surfaces.get_mut(&id) {
            Some(Surface::Toplevel(t)) => Some(t),
            _ => None,
        }
    }
}

pub struct SoftwareCompositor {
    diagnostic_pixel: u32,
    inner: Mutex<Inner>,
}

impl SoftwareCompositor {
    pub fn new(config: &SurfaceConfig) -> Self {
        Self {
            diagnostic_pixel: config.diagnostic_pixel(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn stats(&self) -> PresentStats {
        self.inner.lock().stats
    }

    /// A toplevel pixel, `None` outside it or for an unknown surface.
    pub fn pixel(&self, toplevel: NativeSurface, x: i32, y: i32) -> Option<u32> {
        let mut inner = self.inner.lock();
        let t = inner.toplevel_mut(toplevel)?;
        if !t.extent().contains(Point::new(x, y)) {
            return None;
        }
        Some(t.pixels[y as usize * t.width as usize + x as usize])
    }

    pub fn toplevel_size(&self, toplevel: NativeSurface) -> Option<(u32, u32)> {
        let mut inner = self.inner.lock();
        inner.toplevel_mut(toplevel).map(|t| (t.width, t.height))
    }

    /// Times the toplevel was flushed by a present.
    pub fn flush_count(&self, toplevel: NativeSurface) -> u64 {
        let mut inner = self.inner.lock();
        inner.toplevel_mut(toplevel).map_or(0, |t| t.flushes)
    }

    pub fn is_live(&self, surface: NativeSurface) -> bool {
        self.inner.lock().surfaces.contains_key(&surface)
    }

    pub fn live_surfaces(&self) -> usize {
        self.inner.lock().surfaces.len()
    }
}

fn read_pixel(bits: &[u8], desc: &SurfaceDesc, x: i32, y: i32) -> Option<u32> {
    if x < 0 || y < 0 || x as u32 >= desc.width || y as u32 >= desc.height {
        return None;
    }
    let at = y as usize * desc.stride as usize + x as usize * 4;
    let bytes = bits.get(at..at + 4)?;
    Some(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

impl SurfaceBackend for SoftwareCompositor {
    fn create_toplevel(&self, native_id: NativeId, rect: Rect) -> Result<NativeSurface, SurfaceError> {
        if native_id == 0 {
            return Err(SurfaceError::ToplevelFailed(native_id));
        }
        let id = self.inner.lock().allocate(Surface::Toplevel(Toplevel::new(native_id, rect)));
        debug!(native_id, ?id, ?rect, "software toplevel");
        Ok(id)
    }

    fn resize_toplevel(&self, toplevel: NativeSurface, rect: Rect) -> Result<(), SurfaceError> {
        let mut inner = self.inner.lock();
        let t = inner.toplevel_mut(toplevel).ok_or(SurfaceError::UnknownSurface(toplevel))?;
        *t = Toplevel::new(t.native_id, rect);
        Ok(())
    }

    fn create_drawable(&self, toplevel: NativeSurface, desc: SurfaceDesc) -> Drawable {
        let mut inner = self.inner.lock();
        if desc.width == 0 || desc.height == 0 || inner.toplevel_mut(toplevel).is_none() {
            return Drawable {
                native: None,
                desc: SurfaceDesc { stride: 0, ..desc },
            };
        }
        let native = inner.allocate(Surface::Drawable { toplevel, dirty: false });
        Drawable {
            native: Some(native),
            desc: SurfaceDesc {
                stride: desc.width * 4,
                bpp: 32,
                ..desc
            },
        }
    }

    fn destroy(&self, surface: NativeSurface) {
        if self.inner.lock().surfaces.remove(&surface).is_none() {
            warn!(?surface, "destroying unknown surface");
        }
    }

    fn present(&self, p: &Present<'_>) {
        let _fpu = FpuGuard::mask_all();
        let mut inner = self.inner.lock();

        if p.clips.is_empty() {
            inner.stats.skipped += 1;
            return;
        }
        let Some(target) = inner.toplevel_mut(p.target) else {
            warn!(target = ?p.target, "present to unknown toplevel");
            return;
        };

        let dest = Rect::new(
            p.target_pos.x,
            p.target_pos.y,
            p.target_pos.x.saturating_add(p.source_rect.width()),
            p.target_pos.y.saturating_add(p.source_rect.height()),
        )
        .intersect(&target.extent());
        let dx = p.source_rect.left.saturating_sub(p.target_pos.x);
        let dy = p.source_rect.top.saturating_sub(p.target_pos.y);
        let width = target.width as usize;

        let mut drawn = 0u64;
        for clip in p.clips {
            // Clip rectangles are disjoint in practice; overlaps just redraw.
            let area = clip.intersect(&dest);
            for y in area.top..area.bottom {
                for x in area.left..area.right {
                    let value = match p.source {
                        Some(_) => read_pixel(p.source_bits, &p.source_desc, x.saturating_add(dx), y.saturating_add(dy)),
                        None => None,
                    };
                    target.pixels[y as usize * width + x as usize] = value.unwrap_or(self.diagnostic_pixel);
                    drawn += 1;
                }
            }
        }
        if drawn > 0 {
            target.flushes += 1;
        } else {
            inner.stats.skipped += 1;
            return;
        }

        if let Some(source) = p.source {
            if let Some(Surface::Drawable { dirty, toplevel }) = inner.surfaces.get_mut(&source) {
                debug_assert_eq!(*toplevel, p.target);
                *dirty = true;
            }
        } else {
            inner.stats.diagnostic_fills += 1;
        }
        inner.stats.presents += 1;
        inner.stats.pixels += drawn;
    }
}
