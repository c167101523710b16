//! Sprite sheets and frame-based animation over them.
//!
//! A [`Sprite`] slices a texture into a grid of equally sized cells. An
//! [`Animation`] walks those cells column by column, then row by row, showing
//! each one for `delay` milliseconds. Timing uses integer ticks only, so two
//! animations fed the same tick sequence always land on the same cell.

use glam::IVec2;

use crate::drawable::Drawable;
use crate::maths::Rect;
use crate::painter::{Painter, TextureId};
use crate::stack::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub texture: TextureId,
    pub cell_w: u32,
    pub cell_h: u32,
    pub nrows: u32,
    pub ncols: u32,
}

impl Sprite {
    /// Source rectangle of one cell inside the texture.
    pub fn cell(&self, row: u32, column: u32) -> Rect {
        Rect::new(
            (column * self.cell_w) as i32,
            (row * self.cell_h) as i32,
            self.cell_w,
            self.cell_h,
        )
    }

    pub fn frame_count(&self) -> u32 {
        self.nrows * self.ncols
    }

    pub fn draw(&self, painter: &mut dyn Painter, row: u32, column: u32, x: i32, y: i32) {
        debug_assert!(row < self.nrows && column < self.ncols);
        painter.draw_region(self.texture, self.cell(row, column), x, y);
    }

    /// Draw the last cell of the sheet, the resting frame of a played animation.
    pub fn draw_last(&self, painter: &mut dyn Painter, x: i32, y: i32) {
        self.draw(
            painter,
            self.nrows.saturating_sub(1),
            self.ncols.saturating_sub(1),
            x,
            y,
        );
    }
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub sprite: Sprite,
    pub delay: u32,
    row: u32,
    column: u32,
    elapsed: u32,
    finished: bool,
}

impl Animation {
    pub fn new(sprite: Sprite, delay: u32) -> Self {
        Self {
            sprite,
            delay,
            row: 0,
            column: 0,
            elapsed: 0,
            finished: false,
        }
    }

    /// Rewind to the first cell.
    pub fn start(&mut self) {
        self.row = 0;
        self.column = 0;
        self.elapsed = 0;
        self.finished = self.sprite.frame_count() == 0;
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn completed(&self) -> bool {
        self.finished
    }

    /// Advance by `ticks` milliseconds. Returns `true` once the last cell has
    /// been shown for its full delay; the cursor then rests on the last cell.
    pub fn update(&mut self, ticks: u32) -> bool {
        if self.finished {
            return true;
        }
        if self.delay == 0 {
            self.rest_on_last();
            return true;
        }

        self.elapsed += ticks;
        while self.elapsed >= self.delay {
            self.elapsed -= self.delay;
            self.column += 1;
            if self.column >= self.sprite.ncols {
                self.column = 0;
                self.row += 1;
                if self.row >= self.sprite.nrows {
                    self.rest_on_last();
                    return true;
                }
            }
        }
        false
    }

    pub fn draw(&self, painter: &mut dyn Painter, x: i32, y: i32) {
        self.sprite.draw(painter, self.row, self.column, x, y);
    }

    fn rest_on_last(&mut self) {
        self.row = self.sprite.nrows.saturating_sub(1);
        self.column = self.sprite.ncols.saturating_sub(1);
        self.elapsed = 0;
        self.finished = true;
    }
}

/// An animation played once at a fixed position, as a drawable record.
pub struct AnimationDrawable {
    pub animation: Animation,
    pub position: IVec2,
}

impl AnimationDrawable {
    pub fn new(mut animation: Animation, position: IVec2) -> Self {
        animation.start();
        Self {
            animation,
            position,
        }
    }
}

impl Record for AnimationDrawable {
    fn update(&mut self, ticks: u32) -> bool {
        self.animation.update(ticks)
    }

    fn draw(&self, painter: &mut dyn Painter) {
        self.animation
            .draw(painter, self.position.x, self.position.y);
    }
}

impl Drawable for AnimationDrawable {
    fn position(&self) -> IVec2 {
        self.position
    }
}
