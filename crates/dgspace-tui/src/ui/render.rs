use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use dgspace_core::routing::Route;

use crate::app::{App, AppState, View};

use super::styles;
use super::views;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Navbar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_navbar(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  DG Space";
    let right = match app.user_label() {
        Some(name) => format!("{}  [?] Help", name),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.chars().count() + 4),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_navbar(frame: &mut Frame, app: &App, area: Rect) {
    // The navbar only exists inside the authenticated layout.
    let current = match app.view {
        View::Page(route) => route,
        View::Loading | View::Login => {
            let block = Block::default()
                .borders(Borders::BOTTOM)
                .border_style(styles::muted_style());
            frame.render_widget(block, area);
            return;
        }
    };

    let submit_selected = matches!(
        current,
        Route::SubmitPva | Route::SubmitResin | Route::SubmitLaser
    );
    let items = [
        ("[h] Home", current == Route::Home),
        ("[r] My Requests", current == Route::Requests),
        ("[n] New Request", submit_selected),
        ("[l] Logout", false),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, selected)) in items.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(*label, styles::tab_style(*selected)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Loading => views::render_loading(frame, area),
        View::Login => views::render_login(frame, app, area),
        View::Page(Route::Home) => views::render_dashboard(frame, app, area),
        View::Page(route) => views::render_placeholder(frame, route, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = shortcuts_for(app.view);

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(since) = app.signed_in_display() {
        format!(" Signed in {} ", since)
    } else {
        format!(" {} ", app.config.api_base_url())
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

/// Key hints for the status bar. The login form takes `q` as text.
fn shortcuts_for(view: View) -> &'static str {
    match view {
        View::Page(_) => "[u]pdate | [q]uit",
        View::Login => "[Esc] quit",
        View::Loading => "[q]uit",
    }
}

fn help_row(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  DG Space Services Portal", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_row("h", "Home"),
        help_row("r", "My Requests"),
        help_row("n", "New Request"),
        help_row("←/→", "Select request type"),
        help_row("Enter/1-3", "Open request form"),
        help_row("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_row("u", "Refresh profile"),
        help_row("l", "Log out"),
        help_row("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Login", styles::highlight_style())),
        help_row("Tab/↑/↓", "Move between fields"),
        help_row("Enter", "Next field / sign in"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub(super) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
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
    ];

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
    fn test_centered_rect_fixed_clamps_to_area() {
        let outer = Rect::new(0, 0, 40, 10);
        let rect = centered_rect_fixed(46, 7, outer);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 1);
    }

    #[test]
    fn test_login_view_hints_esc_to_quit() {
        assert_eq!(shortcuts_for(View::Login), "[Esc] quit");
        assert!(shortcuts_for(View::Page(Route::Home)).contains("[q]uit"));
    }

    #[test]
    fn test_centered_rect_fixed_centers() {
        let rect = centered_rect_fixed(20, 10, Rect::new(0, 0, 100, 50));
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (40, 20, 20, 10));
    }
}
