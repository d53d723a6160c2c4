use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use uwv_chat_core::ChatRole;

use crate::app::App;
use crate::markdown;

const BRAND: Color = Color::Rgb(0, 123, 199);

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    if app.maintenance {
        render_maintenance(app, frame, area);
        return;
    }

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(frame, footer_area);

    if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let model = app
        .store
        .selected_model()
        .map(|m| format!(" [{}]", m))
        .unwrap_or_default();

    let title = Line::from(vec![
        Span::styled(format!(" {} ", app.texts().title), Style::default().fg(Color::White).bold()),
        Span::styled(model, Style::default().fg(Color::White)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(BRAND));
    frame.render_widget(header, area);
}

/// Lines for the whole conversation, including the "thinking" indicator.
fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let texts = app.texts();
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.store.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    format!("{}:", texts.user_label),
                    Style::default().fg(BRAND).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    format!("{}:", texts.assistant_label),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                if app.render_markdown {
                    lines.extend(markdown::render(&msg.content));
                } else {
                    lines.extend(markdown::render_plain(&msg.content));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.store.is_pending() {
        lines.push(Line::from(Span::styled(
            format!("{}:", texts.assistant_label),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{}{}", texts.thinking, dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let lines = chat_lines(app);

    let inner_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2).max(1);

    // Count rows with the same word wrapping the paragraph renders with
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let total = chat.line_count(inner_width).min(u16::MAX as usize) as u16;
    app.max_chat_scroll = total.saturating_sub(inner_height);
    if app.follow_bottom {
        app.chat_scroll = app.max_chat_scroll;
    } else {
        app.chat_scroll = app.chat_scroll.min(app.max_chat_scroll);
    }

    let chat = chat.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let texts = app.texts();
    let pending = app.store.is_pending();

    let label = if pending {
        &texts.sending_label
    } else {
        &texts.send_label
    };
    let label_width = label.chars().count() as u16 + 4;

    let [field_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(label_width),
    ])
    .areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRAND));

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = field_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let field = if app.input.is_empty() {
        Paragraph::new(Span::styled(
            texts.input_placeholder.clone(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text)
    };
    frame.render_widget(field.block(block), field_area);

    let button_style = if pending {
        Style::default().fg(Color::Gray).bg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White).bg(BRAND).bold()
    };
    let button = Paragraph::new(label.as_str())
        .alignment(Alignment::Center)
        .style(button_style)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(BRAND)));
    frame.render_widget(button, button_area);

    if !app.show_model_picker {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((field_area.x + cursor_x + 1, field_area.y + 1));
    }
}

fn render_footer(frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let hints: Vec<(&str, &str)> = vec![
        ("Enter", "send"),
        ("^N", "new"),
        ("^L", "clear memory"),
        ("^P", "model"),
        ("PgUp/PgDn", "scroll"),
        ("Esc", "quit"),
    ];

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 40.min(area.width.saturating_sub(4));
    let popup_height =
        (app.store.available_models().len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRAND))
        .title(" Model (Enter to select, Esc to cancel) ");

    let selected = app.store.selected_model();
    let items: Vec<ListItem> = app
        .store
        .available_models()
        .iter()
        .map(|model| {
            let style = if Some(model.as_str()) == selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(BRAND)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

fn render_maintenance(app: &App, frame: &mut Frame, area: Rect) {
    let texts = app.texts();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRAND))
        .title(format!(" {} ", texts.title));

    let body = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            texts.maintenance_title.clone(),
            Style::default().fg(BRAND).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(texts.maintenance_body.clone()),
        Line::default(),
        Line::from(Span::styled("Esc to quit", Style::default().fg(Color::DarkGray))),
    ]);

    let notice = Paragraph::new(body)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(notice, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;
    use uwv_chat_core::{BackendClient, Config};

    fn app_with(config: Config) -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(&config, BackendClient::new("http://127.0.0.1:9"), tx)
    }

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for row in buffer.content.chunks(width as usize) {
            for cell in row {
                out.push_str(cell.symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn renders_conversation_and_placeholder() {
        let mut app = app_with(Config::new());
        app.store.reset("Welkom bij UWV");
        app.store.append_user("Hallo");
        app.store.append_assistant("Hoi!");

        let screen = draw(&mut app, 60, 20);
        assert!(screen.contains("UWV Chatbot"));
        assert!(screen.contains("Welkom bij UWV"));
        assert!(screen.contains("Hallo"));
        assert!(screen.contains("Hoi!"));
        assert!(screen.contains("Typ uw vraag hier..."));
        assert!(screen.contains("Zend"));
    }

    #[test]
    fn pending_shows_thinking_and_busy_label() {
        let mut app = app_with(Config::new());
        app.store.append_user("Hallo");

        let screen = draw(&mut app, 60, 20);
        assert!(screen.contains("Bezig met nadenken"));
        assert!(!screen.contains("Zend"));
    }

    #[test]
    fn maintenance_notice_replaces_chat() {
        let mut app = app_with(Config {
            maintenance: true,
            ..Config::new()
        });
        let screen = draw(&mut app, 100, 12);
        assert!(screen.contains("Onderhoud"));
        assert!(!screen.contains("Typ uw vraag hier..."));
    }

    #[test]
    fn markdown_toggle() {
        let mut app = app_with(Config::new());
        app.store.reset("Dit is **belangrijk**");
        let screen = draw(&mut app, 60, 12);
        assert!(screen.contains("Dit is belangrijk"));

        app.render_markdown = false;
        let screen = draw(&mut app, 60, 12);
        assert!(screen.contains("Dit is **belangrijk**"));
    }

    #[test]
    fn follows_bottom_of_long_conversation() {
        let mut app = app_with(Config::new());
        app.store.reset("begin");
        for i in 0..30 {
            app.store.append_user(&format!("vraag {}", i));
            app.store.append_assistant(format!("antwoord {}", i));
        }
        let screen = draw(&mut app, 60, 20);
        assert!(app.max_chat_scroll > 0);
        assert_eq!(app.chat_scroll, app.max_chat_scroll);
        assert!(screen.contains("antwoord 29"));
        assert!(!screen.contains("begin"));
    }

    #[test]
    fn follows_bottom_when_word_wrap_adds_rows() {
        let mut app = app_with(Config::new());
        app.store
            .reset(format!("{}\nEINDE", "aaaaaaa bbbbbbb ".repeat(12)));

        let screen = draw(&mut app, 22, 14);
        assert_eq!(app.chat_scroll, app.max_chat_scroll);
        assert!(screen.contains("EINDE"));
    }
}
