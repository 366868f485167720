use ratatui::{
    layout::{Constraint, Rect},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use classbook_core::models::BOOKING_COLUMNS;
use classbook_core::utils::{humanize, truncate_string};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header_cells = BOOKING_COLUMNS.iter().map(|key| Cell::from(humanize(key)));
    let header = Row::new(header_cells)
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .bookings
        .iter()
        .map(|booking| {
            let [start, duration, class, studio, coach, status] = booking.to_row();
            let status_style = styles::booking_status_style(&status);
            Row::new(vec![
                Cell::from(start),
                Cell::from(duration),
                Cell::from(truncate_string(&class, 32)),
                Cell::from(truncate_string(&studio, 32)),
                Cell::from(coach),
                Cell::from(status).style(status_style),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(22), // "Mon May 06, 09:30 AM"
        Constraint::Length(9),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Length(12),
    ];

    let title = format!(" Upcoming Classes ({}) ", app.bookings.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.is_authenticated()));

    if app.bookings.is_empty() && app.is_authenticated() && !app.fetching {
        let message = Paragraph::new(vec![
            Line::from(""),
            Line::styled("  No upcoming classes booked.", styles::muted_style()),
        ])
        .block(block);
        frame.render_widget(message, area);
        return;
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.bookings.is_empty() {
        state.select(Some(app.booking_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
