use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.on_tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            // Clear the conversation (stops a turn in flight first)
            KeyCode::Char('l') => {
                app.session.reset();
                app.chat_scroll = 0;
                return;
            }
            // Other control chords are not bindings and must not type
            KeyCode::Char(_) => return,
            _ => {}
        }
    }

    match key.code {
        KeyCode::Enter => app.submit_input(),

        // Stop the current exchange or reveal
        KeyCode::Esc => app.session.stop(),

        // Transcript scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let half = (app.chat_height / 2).max(1);
            app.scroll_up(half);
        }
        KeyCode::PageDown => {
            let half = (app.chat_height / 2).max(1);
            app.scroll_down(half);
        }

        // Input line editing
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatClient;

    fn test_app() -> App {
        let client = ChatClient::new("http://127.0.0.1:9/chat", "test-key", 100);
        App::new(client).0
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[tokio::test]
    async fn typing_inserts_at_the_cursor() {
        let mut app = test_app();
        for c in "helo".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.input, "hello");
        assert_eq!(app.cursor, 4);
    }

    #[tokio::test]
    async fn backspace_handles_multibyte_characters() {
        let mut app = test_app();
        for c in "héllo".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "hllo");
        assert_eq!(app.cursor, 1);
    }

    #[tokio::test]
    async fn enter_submits_and_esc_stops() {
        let mut app = test_app();
        for c in "hi".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.session.is_busy());
        assert!(app.input.is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(!app.session.is_busy());
    }

    #[tokio::test]
    async fn ctrl_l_resets_the_conversation() {
        let mut app = test_app();
        for c in "hi".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL),
        );
        assert!(!app.session.is_busy());
        assert!(app.session.history().is_empty());
    }

    #[tokio::test]
    async fn ctrl_c_quits() {
        let mut app = test_app();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }
}
