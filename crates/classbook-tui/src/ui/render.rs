use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use classbook_core::utils::mask;

use crate::app::{App, AppState, LoginFocus};

use super::bookings;
use super::styles;

/// Width of the username and password fields in the login overlay
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Greeting
            Constraint::Min(8),    // Bookings
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_greeting(frame, app, chunks[1]);
    bookings::render(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::Authenticating => render_authenticating_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.account_label() {
        Some(account) => format!("  Classbook · {}", account),
        None => "  Classbook".to_string(),
    };
    let help_hint = "[?] Help";
    let title_len = title.chars().count();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title_len as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_greeting(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.greeting() {
        Some(greeting) => Line::from(Span::styled(format!(" {}", greeting), styles::success_style())),
        None => Line::from(vec![
            Span::styled(" Welcome to Classbook. ", styles::highlight_style()),
            Span::styled("Log in to see your upcoming classes.", styles::muted_style()),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = if app.retry_available {
        "[r]etry | [L]ogout | [q]uit"
    } else {
        "[u]pdate | [L]ogout | [q]uit"
    };

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(ref age) = app.bookings_age {
        format!(" Updated {} ", age)
    } else {
        String::from(" ")
    };

    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let left_style = if left_text.starts_with(" Error") {
        styles::error_style()
    } else {
        styles::muted_style()
    };

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn logo() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled("   ┏━╸╻  ┏━┓┏━┓┏━┓┏┓ ┏━┓┏━┓╻┏ ", styles::title_style())),
        Line::from(Span::styled("   ┃  ┃  ┣━┫┗━┓┗━┓┣┻┓┃ ┃┃ ┃┣┻┓", styles::title_style())),
        Line::from(Span::styled("   ┗━╸┗━╸╹ ╹┗━┛┗━┛┗━┛┗━┛┗━┛╹ ╹", styles::title_style())),
    ]
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 21, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo();
    help_text.extend([
        Line::from(Span::styled(
            format!("          version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("  ↑/↓       ", "Move through classes"),
        help_line("  PgUp/PgDn ", "Jump a page"),
        help_line("  Home/End  ", "First/last class"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("  u         ", "Update bookings"),
        help_line("  r         ", "Retry after a network error"),
        help_line("  L         ", "Log out and forget tokens"),
        help_line("  q         ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("     Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn field_line(label: &'static str, value: String, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    let shown: String = {
        let count = value.chars().count();
        // Keep the tail visible while typing past the field width
        value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
    };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(label, styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo();
    lines.push(Line::from(""));

    lines.push(field_line(
        "Username: [",
        app.login_username.clone(),
        app.login_focus == LoginFocus::Username,
    ));
    lines.push(field_line(
        "Password: [",
        mask(&app.login_password, FIELD_WIDTH),
        app.login_focus == LoginFocus::Password,
    ));

    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("               ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Log in ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_authenticating_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(36, 5, frame.area());
    frame.render_widget(Clear, area);

    let message = app.status_message.as_deref().unwrap_or("Logging in...");
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", message), styles::highlight_style())),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 10, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_small_terminals() {
        let area = centered_rect_fixed(46, 12, Rect::new(0, 0, 30, 8));
        assert_eq!(area, Rect::new(0, 0, 30, 8));

        let area = centered_rect_fixed(46, 12, Rect::new(0, 0, 100, 40));
        assert_eq!(area, Rect::new(27, 14, 46, 12));
    }

    #[test]
    fn test_long_field_keeps_tail_visible() {
        let line = field_line("Username: [", "x".repeat(30) + "tail", true);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("tail▌"));
    }
}
