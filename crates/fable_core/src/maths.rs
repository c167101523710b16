//! Small integer geometry helpers shared by records and the message box.

use glam::IVec2;

/// Axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn origin(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    /// Point-in-rectangle test, inclusive of the top/left edge and exclusive of
    /// the bottom/right one.
    pub fn contains(&self, point: IVec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && (point.x as i64) < self.x as i64 + self.w as i64
            && (point.y as i64) < self.y as i64 + self.h as i64
    }

    /// A `w`x`h` rectangle centered inside `self`.
    pub fn center(&self, w: u32, h: u32) -> Rect {
        Rect {
            x: self.x + (self.w as i32 - w as i32) / 2,
            y: self.y + (self.h as i32 - h as i32) / 2,
            w,
            h,
        }
    }
}
