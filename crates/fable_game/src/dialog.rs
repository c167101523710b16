use crossbeam_channel::Sender;
use fable_core::action::ActionSpawner;
use fable_core::maths::Rect;
use fable_core::message::{Message, MessageFlags, MessageStyle};
use fable_core::stack::StackResult;

/// Opens message boxes in the action stack of the current screen.
#[derive(Clone)]
pub struct Dialogs {
    spawner: ActionSpawner,
    style: MessageStyle,
    area: Rect,
}

impl Dialogs {
    pub fn new(spawner: ActionSpawner, style: MessageStyle, screen: Rect) -> Self {
        let area = Rect::new(
            screen.x + 16,
            screen.y + screen.h as i32 - 116,
            screen.w.saturating_sub(32),
            100,
        );
        Self {
            spawner,
            style,
            area,
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Show `lines` until confirmed. `reply` receives the selected line.
    pub fn open(
        &self,
        lines: Vec<String>,
        selectable: u32,
        reply: Option<Sender<usize>>,
    ) -> StackResult<()> {
        let mut message = Message::new(
            self.area,
            lines,
            MessageFlags::FADEIN | MessageFlags::FADEOUT,
        )
        .with_style(self.style)
        .with_selectable(selectable);
        if let Some(reply) = reply {
            message = message.with_reply(reply);
        }
        message.start();
        self.spawner.add(Box::new(message))
    }

    /// Show one line that closes on its own.
    pub fn notify(&self, text: impl Into<String>) -> StackResult<()> {
        let mut message = Message::new(self.area, [text.into()], MessageFlags::AUTOMATIC)
            .with_style(self.style);
        message.start();
        self.spawner.add(Box::new(message))
    }
}
