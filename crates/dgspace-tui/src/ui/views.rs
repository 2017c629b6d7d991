//! Page bodies rendered inside the main content area.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use dgspace_core::routing::Route;

use crate::app::{App, LoginFocus, REQUEST_TYPES};

use super::render::centered_rect_fixed;
use super::styles;

/// Width of the login form fields
const FIELD_WIDTH: usize = 28;

pub fn render_loading(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(30, 3, area);
    let paragraph = Paragraph::new(Line::from(Span::styled("Loading...", styles::muted_style())))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(styles::border_style(false)));
    frame.render_widget(paragraph, area);
}

fn login_field<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("{:<10}[", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Keep the tail of long input visible inside the fixed-width field.
fn visible_tail(value: &str) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
}

pub fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(50, height, area);
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("Welcome to the DG Space", styles::title_style()))
            .alignment(Alignment::Center),
        Line::from(Span::styled("Donald's Garage Services Portal", styles::muted_style()))
            .alignment(Alignment::Center),
        Line::from(""),
    ];

    // Failures sit above the form, like the portal's error box.
    if let Some(ref error) = app.login_error {
        lines.push(
            Line::from(Span::styled(error.as_str(), styles::error_style()))
                .alignment(Alignment::Center),
        );
        lines.push(Line::from(""));
    }

    lines.push(login_field(
        "USD Email",
        visible_tail(&app.login_email),
        app.login_focus == LoginFocus::Email,
    ));
    let masked = "*".repeat(app.login_password.chars().count().min(FIELD_WIDTH));
    lines.push(login_field(
        "Password",
        masked,
        app.login_focus == LoginFocus::Password,
    ));
    lines.push(Line::from(""));

    let button = if app.login_in_flight() {
        Span::styled("  Logging in...  ", styles::muted_style())
    } else if app.login_focus == LoginFocus::Button {
        Span::styled(" ▶ Log In ◀ ", styles::selected_style())
    } else {
        Span::styled("   Log In   ", styles::list_item_style())
    };
    lines.push(
        Line::from(vec![Span::raw("["), button, Span::raw("]")]).alignment(Alignment::Center),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn card_color(route: Route) -> Color {
    match route {
        Route::SubmitResin => styles::RESIN,
        Route::SubmitLaser => styles::LASER,
        _ => styles::PVA,
    }
}

pub fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Welcome
            Constraint::Min(8),    // Request cards
            Constraint::Length(4), // Stats
        ])
        .split(area);

    let welcome = vec![
        Line::from(Span::styled(
            format!(" Welcome back, {}!", app.greeting_name()),
            styles::title_style(),
        )),
        Line::from(Span::styled(
            " What would you like to create today? Select a service below to submit a new request.",
            styles::muted_style(),
        )),
    ];
    frame.render_widget(
        Paragraph::new(welcome).wrap(Wrap { trim: false }),
        chunks[0],
    );

    let card_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(chunks[1]);

    for (i, (request, card_area)) in REQUEST_TYPES.iter().zip(card_areas.iter()).enumerate() {
        let selected = i == app.card_selection;
        let color = card_color(request.route);

        let lines = vec![
            Line::from(Span::styled(request.title, styles::card_style(color, true))),
            Line::from(""),
            Line::from(Span::styled(request.description, styles::list_item_style())),
            Line::from(""),
            Line::from(Span::styled(
                format!("[{}] Start Request →", i + 1),
                styles::card_style(color, selected),
            )),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if selected {
                styles::card_style(color, true)
            } else {
                styles::border_style(false)
            });

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            *card_area,
        );
    }

    render_stats(frame, chunks[2]);
}

/// Request counts. The portal has no request listing yet, so all are zero.
fn render_stats(frame: &mut Frame, area: Rect) {
    let stat_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    for (label, stat_area) in ["Pending Requests", "Completed", "In Progress"]
        .iter()
        .zip(stat_areas.iter())
    {
        let lines = vec![
            Line::from(Span::styled("0", styles::stat_number_style())).alignment(Alignment::Center),
            Line::from(Span::styled(*label, styles::muted_style())).alignment(Alignment::Center),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        frame.render_widget(Paragraph::new(lines).block(block), *stat_area);
    }
}

pub fn render_placeholder(frame: &mut Frame, route: Route, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(route.title(), styles::title_style())),
        Line::from(""),
        Line::from(Span::styled("Coming soon...", styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled("Press Esc to go back", styles::muted_style())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(block),
        centered_rect_fixed(44, 7, area),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use dgspace_core::config::Config;
    use dgspace_core::routing::Navigator;
    use dgspace_core::storage::{MemoryStore, SessionStore};
    use dgspace_core::AuthController;
    use ratatui::{backend::TestBackend, Terminal};

    fn login_app() -> App {
        let auth = AuthController::new(
            SessionStore::new(Arc::new(MemoryStore::new())),
            Navigator::new(Route::Login),
            "http://127.0.0.1:9",
            Duration::from_secs(1),
        )
        .unwrap();
        App::with_controller(Config::default(), auth)
    }

    /// Row index of the first line of the rendered frame containing `needle`.
    fn row_of(terminal: &Terminal<TestBackend>, needle: &str) -> Option<u16> {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height).find(|&y| {
            let row: String = (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect();
            row.contains(needle)
        })
    }

    #[test]
    fn test_login_error_is_drawn_above_the_form() {
        let mut app = login_app();
        app.login_error = Some("Invalid credentials".to_string());

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|f| render_login(f, &app, f.area()))
            .unwrap();

        let error = row_of(&terminal, "Invalid credentials").unwrap();
        let email = row_of(&terminal, "USD Email").unwrap();
        let button = row_of(&terminal, "Log In").unwrap();
        assert!(error < email);
        assert!(email < button);
    }

    #[test]
    fn test_visible_tail_keeps_end_of_long_input() {
        assert_eq!(visible_tail("short@usd.edu"), "short@usd.edu");
        let long = "a".repeat(40) + "@usd.edu";
        let tail = visible_tail(&long);
        assert_eq!(tail.chars().count(), FIELD_WIDTH);
        assert!(tail.ends_with("@usd.edu"));
    }

    #[test]
    fn test_card_colors_follow_request_type() {
        assert_eq!(card_color(Route::SubmitPva), styles::PVA);
        assert_eq!(card_color(Route::SubmitResin), styles::RESIN);
        assert_eq!(card_color(Route::SubmitLaser), styles::LASER);
    }
}
