//! The compositing backend seam.
//!
//! Everything the surface manager knows about a concrete compositing
//! technology goes through [`SurfaceBackend`].

use crate::error::SurfaceError;
use crate::types::{NativeId, NativeSurface, Point, Rect, SurfaceDesc};

/// A drawable as the backend created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drawable {
    /// `None` when the backend has nothing to back it with.
    pub native: Option<NativeSurface>,
    /// The requested description, adjusted by the backend.
    pub desc: SurfaceDesc,
}

/// One present: source pixels onto a toplevel.
#[derive(Debug)]
pub struct Present<'a> {
    pub target: NativeSurface,
    /// `None` for an unbacked source.
    pub source: Option<NativeSurface>,
    pub source_desc: SurfaceDesc,
    pub source_bits: &'a [u8],
    /// Where `source_rect`'s top-left lands on the target.
    pub target_pos: Point,
    pub source_rect: Rect,
    /// Target coordinates. Drawing is limited to their union.
    pub clips: &'a [Rect],
}

pub trait SurfaceBackend: Send + Sync {
    /// Create a toplevel bound to a native window of the given geometry.
    fn create_toplevel(&self, native_id: NativeId, rect: Rect) -> Result<NativeSurface, SurfaceError>;

    fn resize_toplevel(&self, toplevel: NativeSurface, rect: Rect) -> Result<(), SurfaceError>;

    /// Create a drawable presented onto `toplevel`.
    fn create_drawable(&self, toplevel: NativeSurface, desc: SurfaceDesc) -> Drawable;

    fn destroy(&self, surface: NativeSurface);

    /// Draw `present.source` onto `present.target`.
    ///
    /// An empty clip list draws nothing. An unbacked source is filled with
    /// the diagnostic color. Floating-point control state is the same on
    /// return as on entry.
    fn present(&self, present: &Present<'_>);
}
