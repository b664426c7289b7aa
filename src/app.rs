use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::ChatClient;
use crate::exchange::ExchangeEvent;
use crate::session::{Session, Submit};
use crate::surface::Transcript;

/// Spinner advances every N ticks (ticks run at the reveal cadence).
const SPINNER_TICKS: u8 = 8;

pub struct App {
    pub should_quit: bool,
    pub session: Session<Transcript>,

    // Input line state
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Chat viewport state (dimensions updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
    tick_counter: u8,

    pub endpoint_label: String,
}

impl App {
    pub fn new(client: ChatClient) -> (Self, UnboundedReceiver<ExchangeEvent>) {
        let endpoint_label = client.endpoint().to_string();
        let (session, exchange_rx) = Session::new(client, Transcript::new());
        let app = Self {
            should_quit: false,
            session,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            tick_counter: 0,
            endpoint_label,
        };
        (app, exchange_rx)
    }

    /// One timer tick: advance the reveal and the thinking animation.
    pub fn on_tick(&mut self) {
        self.session.on_tick();
        if self.session.is_busy() {
            self.tick_counter = self.tick_counter.wrapping_add(1);
            if self.tick_counter % SPINNER_TICKS == 0 {
                self.animation_frame = (self.animation_frame + 1) % 3;
            }
        }
    }

    /// Sends the input line as a new turn; keeps it on rejection so
    /// nothing the user typed is lost.
    pub fn submit_input(&mut self) {
        if self.session.submit(&self.input) == Submit::Accepted {
            self.input.clear();
            self.cursor = 0;
        }
    }

    // Chat scrolling; manual scrolling releases the follow-the-bottom
    // behavior until the next bubble update re-engages it.
    pub fn scroll_up(&mut self, lines: u16) {
        self.session.surface_mut().set_follow(false);
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = (self.chat_scroll.saturating_add(lines)).min(max);
        if self.chat_scroll == max {
            self.session.surface_mut().set_follow(true);
        }
    }

    /// Snaps the viewport to the newest content; called during render
    /// while the transcript asks to follow the bottom.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    fn max_chat_scroll(&self) -> u16 {
        self.total_chat_lines()
            .saturating_sub(self.chat_height)
    }

    /// Transcript height in terminal lines at the current wrap width,
    /// mirroring how the chat paragraph is laid out.
    pub fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for bubble in self.session.surface().bubbles() {
            total += 1; // role line ("You:" or "AI:")
            for line in bubble.text.lines() {
                // Character count, not byte length, for UTF-8 content
                let chars = line.chars().count();
                if chars == 0 {
                    total += 1;
                } else {
                    total += ((chars - 1) / wrap_width + 1) as u16;
                }
            }
            total += 1; // blank line after bubble
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    fn test_app() -> App {
        let client = ChatClient::new("http://127.0.0.1:9/chat", "test-key", 100);
        App::new(client).0
    }

    #[tokio::test]
    async fn accepted_submit_clears_the_input_line() {
        let mut app = test_app();
        app.input = "hello".to_string();
        app.cursor = 5;
        app.submit_input();
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test]
    async fn rejected_submit_keeps_the_input_line() {
        let mut app = test_app();
        app.input = "first".to_string();
        app.submit_input();

        // Busy now; the second message must survive the rejection.
        app.input = "second".to_string();
        app.cursor = 6;
        app.submit_input();
        assert_eq!(app.input, "second");
        assert_eq!(app.cursor, 6);
    }

    #[tokio::test]
    async fn counts_wrapped_transcript_lines() {
        let mut app = test_app();
        app.chat_width = 10;
        app.session.surface_mut().append_user("a".repeat(25).as_str());
        // 1 role line + 3 wrapped lines + 1 blank
        assert_eq!(app.total_chat_lines(), 5);
    }
}
