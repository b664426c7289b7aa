use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::session::THINKING_PLACEHOLDER;
use crate::surface::{Bubble, BubbleKind};

pub fn render(app: &mut App, frame: &mut Frame) {
    let [chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    // Store chat dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    if app.session.surface().follow_latest() {
        app.scroll_chat_to_bottom();
        app.session.surface_mut().set_follow(false);
    }

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_chat(app: &App, frame: &mut Frame, area: ratatui::layout::Rect) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", app.endpoint_label));

    let bubbles = app.session.surface().bubbles();
    let chat_text = if bubbles.is_empty() {
        Text::from(Span::styled(
            "Type a message and press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for bubble in bubbles {
            match bubble.kind {
                BubbleKind::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(bubble.text.as_str()));
                }
                BubbleKind::Bot => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(bot_lines(bubble, app.animation_frame));
                }
            }
            lines.push(Line::default());
        }
        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn bot_lines(bubble: &Bubble, animation_frame: u8) -> Vec<Line<'_>> {
    if bubble.pending {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        let waiting = THINKING_PLACEHOLDER.trim_end_matches('.');
        return vec![Line::from(Span::styled(
            format!("{waiting}{dots}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))];
    }

    let style = if bubble.error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    bubble
        .text
        .lines()
        .map(|line| Line::from(Span::styled(line, style)))
        .collect()
}

fn render_input(app: &App, frame: &mut Frame, area: ratatui::layout::Rect) {
    let border_color = if app.session.is_busy() {
        Color::DarkGray
    } else {
        Color::Yellow
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Horizontal scrolling keeps the cursor visible in a long line
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    frame.set_cursor_position((
        area.x + (app.cursor - scroll_offset) as u16 + 1,
        area.y + 1,
    ));
}

fn render_footer(app: &App, frame: &mut Frame, area: ratatui::layout::Rect) {
    let busy = app.session.surface().is_busy();
    let hints = if busy {
        " Esc stop · Ctrl+L clear · Ctrl+C quit "
    } else {
        " Enter send · Ctrl+L clear · Ctrl+C quit "
    };

    let mut spans = vec![Span::styled(hints, Style::default().fg(Color::DarkGray))];
    if busy {
        spans.push(Span::styled("● busy", Style::default().fg(Color::Yellow)));
    } else if !app.session.history().is_empty() {
        spans.push(Span::styled(
            format!("{} messages", app.session.history().len()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
