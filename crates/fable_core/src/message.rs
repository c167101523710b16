//! Message dialog box with optional grow/shrink animation and selectable lines.
//!
//! State machine:
//!
//! ```text
//! NONE --start--> OPENING --delay elapsed--> SHOWING --confirm/timeout--> HIDING --delay elapsed--> NONE
//! ```
//!
//! OPENING is skipped without `FADEIN`, HIDING without `FADEOUT`. While SHOWING,
//! Up/Down move the selection among selectable lines (wrapping at both ends)
//! and Enter closes the box. The box is rendered into an off-screen target
//! sized to the message and blitted scaled by the current factor, which gives
//! the fade effect without per-glyph blending.

use bitflags::bitflags;
use crossbeam_channel::Sender;
use serde::Deserialize;

use crate::action::Action;
use crate::input::{Event, Key};
use crate::maths::Rect;
use crate::painter::{Color, Painter};
use crate::stack::Record;

pub const MESSAGE_DELAY_DEFAULT: u32 = 150;
pub const MESSAGE_TIMEOUT_DEFAULT: u32 = 5000;

/// Lines past this index can never be selected (one bit per line).
pub const MESSAGE_SELECTABLE_MAX: usize = 32;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MessageFlags: u8 {
        /// Close on its own once the style timeout elapsed.
        const AUTOMATIC = 1 << 0;
        /// Every line is an answer when no selectable mask was given.
        const QUESTION = 1 << 1;
        const FADEIN = 1 << 2;
        const FADEOUT = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    None,
    Opening,
    Showing,
    Hiding,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MessageStyle {
    pub background: Color,
    pub border: Color,
    pub border_size: u32,
    pub color: Color,
    pub color_selected: Color,
    pub padding: u32,
    /// Milliseconds an automatic message stays on screen.
    pub timeout: u32,
    /// Milliseconds of the opening/hiding animation.
    pub delay: u32,
}

impl MessageStyle {
    pub const LIGHT: MessageStyle = MessageStyle {
        background: 0xf5f7faff,
        border: 0xcdd2daff,
        border_size: 2,
        color: 0x222222ff,
        color_selected: 0x55b67eff,
        padding: 10,
        timeout: MESSAGE_TIMEOUT_DEFAULT,
        delay: MESSAGE_DELAY_DEFAULT,
    };

    pub const DARK: MessageStyle = MessageStyle {
        background: 0x222222ff,
        border: 0x141414ff,
        border_size: 2,
        color: 0xf5f7faff,
        color_selected: 0x55b67eff,
        padding: 10,
        timeout: MESSAGE_TIMEOUT_DEFAULT,
        delay: MESSAGE_DELAY_DEFAULT,
    };
}

impl Default for MessageStyle {
    fn default() -> Self {
        Self::LIGHT
    }
}

pub struct Message {
    /// Destination area; the animation scales around its center.
    pub geometry: Rect,
    pub lines: Vec<String>,
    /// Bit `n` set means line `n` can be selected.
    pub selectable: u32,
    pub selected: usize,
    pub flags: MessageFlags,
    pub style: MessageStyle,
    reply: Option<Sender<usize>>,
    state: MessageState,
    elapsed: u32,
    scale: f64,
    reported: bool,
}

impl Message {
    pub fn new<I, S>(geometry: Rect, lines: I, flags: MessageFlags) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            geometry,
            lines: lines.into_iter().map(Into::into).collect(),
            selectable: 0,
            selected: 0,
            flags,
            style: MessageStyle::default(),
            reply: None,
            state: MessageState::None,
            elapsed: 0,
            scale: 0.0,
            reported: false,
        }
    }

    pub fn with_style(mut self, style: MessageStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_selectable(mut self, mask: u32) -> Self {
        self.selectable = mask;
        self
    }

    /// Report the selected line on `reply` when the message ends.
    pub fn with_reply(mut self, reply: Sender<usize>) -> Self {
        self.reply = Some(reply);
        self
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn completed(&self) -> bool {
        self.state == MessageState::None
    }

    pub fn is_selectable(&self, line: usize) -> bool {
        line < self.lines.len()
            && line < MESSAGE_SELECTABLE_MAX
            && (self.selectable >> line) & 0x1 == 1
    }

    pub fn start(&mut self) {
        let fades = self.flags.intersects(MessageFlags::FADEIN | MessageFlags::FADEOUT);
        if fades && self.style.delay == 0 {
            log::warn!("message has animation but zero delay");
        }
        if self.flags.contains(MessageFlags::AUTOMATIC) && self.style.timeout == 0 {
            log::warn!("message is automatic but has zero timeout");
        }
        if self.flags.contains(MessageFlags::QUESTION) && self.selectable == 0 {
            let count = self.lines.len().min(MESSAGE_SELECTABLE_MAX);
            self.selectable = if count == MESSAGE_SELECTABLE_MAX {
                u32::MAX
            } else {
                (1u32 << count) - 1
            };
        }

        self.elapsed = 0;
        self.reported = false;
        if self.flags.contains(MessageFlags::FADEIN) {
            self.scale = 0.0;
            self.state = MessageState::Opening;
        } else {
            self.scale = 1.0;
            self.state = MessageState::Showing;
        }
    }

    pub fn handle(&mut self, event: &Event) {
        if self.state != MessageState::Showing {
            return;
        }
        let Event::KeyDown { key } = *event else {
            return;
        };

        match key {
            Key::Up if self.has_choices() => self.selected = self.previous(),
            Key::Down if self.has_choices() => self.selected = self.next(),
            Key::Enter => self.close(),
            _ => {}
        }
    }

    /// Advance timers. Returns `true` once the message reached NONE.
    ///
    /// # Panics
    ///
    /// Panics when called again after it already reported completion.
    pub fn update(&mut self, ticks: u32) -> bool {
        assert!(!self.reported, "message updated after completion");

        self.elapsed = self.elapsed.saturating_add(ticks);

        match self.state {
            MessageState::Opening => {
                self.scale = self.ratio();
                if self.elapsed >= self.style.delay {
                    self.state = MessageState::Showing;
                    self.elapsed = 0;
                }
            }
            MessageState::Showing => {
                if self.flags.contains(MessageFlags::AUTOMATIC) && self.elapsed >= self.style.timeout
                {
                    self.close();
                }
            }
            MessageState::Hiding => {
                self.scale = 1.0 - self.ratio();
                if self.elapsed >= self.style.delay {
                    self.state = MessageState::None;
                    self.elapsed = 0;
                }
            }
            MessageState::None => {}
        }

        self.reported = self.state == MessageState::None;
        self.reported
    }

    /// Start hiding right away.
    pub fn hide(&mut self) {
        self.state = MessageState::Hiding;
        self.elapsed = 0;
    }

    /// Smallest width and height that fit every line with the style padding.
    pub fn query(&self, painter: &dyn Painter) -> (u32, u32) {
        let padding = self.style.padding;
        let widest = self
            .lines
            .iter()
            .map(|line| painter.text_size(line).0)
            .max()
            .unwrap_or(0);
        let n = self.lines.len() as u32;
        let height = padding * 2 + n * painter.line_height() + n.saturating_sub(1) * padding;
        (padding * 2 + widest, height)
    }

    pub fn draw(&self, painter: &mut dyn Painter) {
        let Rect { w, h, .. } = self.geometry;
        if w == 0 || h == 0 {
            log::debug!("message has null dimensions");
            return;
        }

        let target = painter.create_target(w, h);
        painter.begin_target(target);
        self.draw_frame(painter);
        self.draw_lines(painter);
        painter.end_target();

        let scale = self.scale.clamp(0.0, 1.0);
        let scaled_w = (w as f64 * scale) as u32;
        let scaled_h = (h as f64 * scale) as u32;
        painter.blit_scaled(
            target,
            Rect::new(0, 0, w, h),
            self.geometry.center(scaled_w, scaled_h),
        );
        painter.destroy_texture(target);
    }

    fn close(&mut self) {
        self.state = if self.flags.contains(MessageFlags::FADEOUT) {
            MessageState::Hiding
        } else {
            MessageState::None
        };
        self.elapsed = 0;
    }

    fn ratio(&self) -> f64 {
        if self.style.delay == 0 {
            return 1.0;
        }
        (self.elapsed as f64 / self.style.delay as f64).clamp(0.0, 1.0)
    }

    fn has_choices(&self) -> bool {
        self.selectable != 0 && !self.lines.is_empty()
    }

    // The cursor moves one line at a time and stops at either end; the mask
    // only decides which line gets highlighted.
    fn previous(&self) -> usize {
        self.selected.saturating_sub(1)
    }

    fn next(&self) -> usize {
        if self.selected + 1 < self.lines.len() {
            self.selected + 1
        } else {
            self.selected
        }
    }

    fn draw_frame(&self, painter: &mut dyn Painter) {
        let Rect { w, h, .. } = self.geometry;
        let border = self.style.border_size;
        painter.set_color(self.style.border);
        painter.fill_rect(Rect::new(0, 0, w, h));
        painter.set_color(self.style.background);
        painter.fill_rect(Rect::new(
            border as i32,
            border as i32,
            w.saturating_sub(border * 2),
            h.saturating_sub(border * 2),
        ));
    }

    fn draw_lines(&self, painter: &mut dyn Painter) {
        let padding = self.style.padding;
        let (min_w, min_h) = self.query(painter);

        for (i, line) in self.lines.iter().enumerate() {
            let color = if self.selectable != 0 && self.selected == i && self.is_selectable(i) {
                self.style.color_selected
            } else {
                self.style.color
            };

            let (tw, th) = painter.text_size(line);
            let x = padding;
            let y = padding + i as u32 * (th + padding);

            if x + tw > self.geometry.w {
                log::debug!("message width too small: {} < {}", self.geometry.w, min_w);
            }
            if y + th > self.geometry.h {
                log::debug!("message height too small: {} < {}", self.geometry.h, min_h);
            }

            painter.draw_text(line, color, x as i32, y as i32);
        }
    }
}

impl Record for Message {
    fn update(&mut self, ticks: u32) -> bool {
        Message::update(self, ticks)
    }

    fn draw(&self, painter: &mut dyn Painter) {
        Message::draw(self, painter);
    }

    fn end(&mut self) {
        if let Some(reply) = self.reply.take() {
            if reply.send(self.selected).is_err() {
                log::debug!("message reply dropped: nobody is listening");
            }
        }
    }
}

impl Action for Message {
    fn start(&mut self) {
        Message::start(self);
    }

    fn handle(&mut self, event: &Event) {
        Message::handle(self, event);
    }
}
