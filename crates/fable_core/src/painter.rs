//! Drawing seam between the core and whichever renderer hosts it.
//!
//! The core never owns pixels. Records, the message box and animations issue
//! calls on a [`Painter`]; the platform layer translates them into its backend.
//! [`RecordingPainter`] keeps the calls in memory for headless runs and tests.

use crate::maths::Rect;

/// Opaque texture handle handed out by the painter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Colour in `0xRRGGBBAA`.
pub type Color = u32;

pub trait Painter {
    fn set_color(&mut self, color: Color);

    /// Fill the current target with the current colour.
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect);

    fn draw_text(&mut self, text: &str, color: Color, x: i32, y: i32);

    /// Rendered size of `text` with the interface font.
    fn text_size(&self, text: &str) -> (u32, u32);

    /// Height of one line of the interface font.
    fn line_height(&self) -> u32;

    /// Draw the `src` region of `texture` at `(x, y)` without scaling.
    fn draw_region(&mut self, texture: TextureId, src: Rect, x: i32, y: i32);

    /// Allocate an off-screen target of `w`x`h` pixels.
    fn create_target(&mut self, w: u32, h: u32) -> TextureId;

    /// Redirect subsequent drawing into `target` until [`end_target`](Self::end_target).
    fn begin_target(&mut self, target: TextureId);

    fn end_target(&mut self);

    /// Copy `src` of `texture` into `dst`, scaling as needed.
    fn blit_scaled(&mut self, texture: TextureId, src: Rect, dst: Rect);

    fn set_alpha(&mut self, texture: TextureId, alpha: u8);

    fn destroy_texture(&mut self, texture: TextureId);

    fn present(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SetColor(Color),
    Clear,
    FillRect(Rect),
    Text {
        text: String,
        color: Color,
        x: i32,
        y: i32,
    },
    Region {
        texture: TextureId,
        src: Rect,
        x: i32,
        y: i32,
    },
    CreateTarget {
        texture: TextureId,
        w: u32,
        h: u32,
    },
    BeginTarget(TextureId),
    EndTarget,
    BlitScaled {
        texture: TextureId,
        src: Rect,
        dst: Rect,
    },
    SetAlpha {
        texture: TextureId,
        alpha: u8,
    },
    DestroyTexture(TextureId),
    Present,
}

/// Painter that records every call, with a fixed-pitch font metric.
#[derive(Debug)]
pub struct RecordingPainter {
    pub commands: Vec<DrawCommand>,
    pub glyph_width: u32,
    pub glyph_height: u32,
    next_texture: u32,
    frames_presented: u64,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            glyph_width: 8,
            glyph_height: 16,
            next_texture: 1,
            frames_presented: 0,
        }
    }

    /// Drop recorded commands, returning how many there were.
    pub fn take_frame(&mut self) -> usize {
        let count = self.commands.len();
        self.commands.clear();
        count
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Recorded text calls, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter for RecordingPainter {
    fn set_color(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetColor(color));
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::FillRect(rect));
    }

    fn draw_text(&mut self, text: &str, color: Color, x: i32, y: i32) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            color,
            x,
            y,
        });
    }

    fn text_size(&self, text: &str) -> (u32, u32) {
        (
            text.chars().count() as u32 * self.glyph_width,
            self.glyph_height,
        )
    }

    fn line_height(&self) -> u32 {
        self.glyph_height
    }

    fn draw_region(&mut self, texture: TextureId, src: Rect, x: i32, y: i32) {
        self.commands.push(DrawCommand::Region { texture, src, x, y });
    }

    fn create_target(&mut self, w: u32, h: u32) -> TextureId {
        let texture = TextureId(self.next_texture);
        self.next_texture += 1;
        self.commands.push(DrawCommand::CreateTarget { texture, w, h });
        texture
    }

    fn begin_target(&mut self, target: TextureId) {
        self.commands.push(DrawCommand::BeginTarget(target));
    }

    fn end_target(&mut self) {
        self.commands.push(DrawCommand::EndTarget);
    }

    fn blit_scaled(&mut self, texture: TextureId, src: Rect, dst: Rect) {
        self.commands
            .push(DrawCommand::BlitScaled { texture, src, dst });
    }

    fn set_alpha(&mut self, texture: TextureId, alpha: u8) {
        self.commands.push(DrawCommand::SetAlpha { texture, alpha });
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.commands.push(DrawCommand::DestroyTexture(texture));
    }

    fn present(&mut self) {
        self.frames_presented += 1;
        self.commands.push(DrawCommand::Present);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_get_distinct_ids() {
        let mut painter = RecordingPainter::new();
        let a = painter.create_target(10, 10);
        let b = painter.create_target(10, 10);
        assert_ne!(a, b);
    }

    #[test]
    fn text_size_uses_fixed_pitch() {
        let painter = RecordingPainter::new();
        assert_eq!(painter.text_size("abcd"), (32, 16));
        assert_eq!(painter.text_size(""), (0, 16));
    }

    #[test]
    fn take_frame_clears_commands() {
        let mut painter = RecordingPainter::new();
        painter.clear();
        painter.present();
        assert_eq!(painter.take_frame(), 2);
        assert!(painter.commands.is_empty());
        assert_eq!(painter.frames_presented(), 1);
    }
}
