use std::fmt;

/// A window handle as the windowing system hands it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hwnd(pub u64);

impl fmt::Display for Hwnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Id of the native window backing a toplevel (an X11 window, for example).
pub type NativeId = u64;

/// A surface owned by the compositing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeSurface(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Point {
        Point::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

/// Half-open rectangle: `right` and `bottom` are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Damage bounds with nothing accumulated. Any union replaces it.
    pub const RESET_BOUNDS: Rect = Rect {
        left: i32::MAX,
        top: i32::MAX,
        right: i32::MIN,
        bottom: i32::MIN,
    };

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Overlap of two rectangles; empty when they do not meet.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() {
            Rect::default()
        } else {
            r
        }
    }

    /// Smallest rectangle covering both. Works on [`Rect::RESET_BOUNDS`].
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Moved by `(dx, dy)`, saturating at the coordinate limits.
    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.left.saturating_add(dx),
            self.top.saturating_add(dy),
            self.right.saturating_add(dx),
            self.bottom.saturating_add(dy),
        )
    }

    /// The same size, moved to the origin.
    pub fn at_origin(&self) -> Rect {
        Rect::from_size(self.width(), self.height())
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }
}

/// A clip region: the union of its rectangles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    pub rects: Vec<Rect>,
}

impl Region {
    pub fn new(rects: impl Into<Vec<Rect>>) -> Self {
        Self { rects: rects.into() }
    }
}

/// Pixel buffer layout of a drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    /// Bytes per row
    pub stride: u32,
    /// Bits per pixel
    pub bpp: u32,
}

impl SurfaceDesc {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stride: 0,
            bpp: 32,
        }
    }

    /// Bytes the pixel buffer needs.
    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_bounds_absorb_the_first_union() {
        let r = Rect::new(3, 4, 10, 12);
        assert!(Rect::RESET_BOUNDS.is_empty());
        assert_eq!(Rect::RESET_BOUNDS.union(&r), r);
    }

    #[test]
    fn disjoint_rects_intersect_to_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);
        assert!(a.intersect(&b).is_empty());
        assert_eq!(a.intersect(&Rect::new(5, 5, 30, 30)), Rect::new(5, 5, 10, 10));
    }

    #[test]
    fn offset_saturates_at_the_limits() {
        let r = Rect::new(10, 10, 20, 20).offset(i32::MAX, i32::MIN);
        assert_eq!(r, Rect::new(i32::MAX, i32::MIN, i32::MAX, i32::MIN));
        assert!(r.is_empty());
        assert_eq!(Point::new(-5, 5).offset(i32::MIN, i32::MAX), Point::new(i32::MIN, i32::MAX));
    }
}
