use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};

use crate::app::{App, SortBy};
use crate::srs::MS_PER_DAY;
use crate::stats::KeyStats;

fn key_label(key: char) -> String {
    match key {
        ' ' => "SPACE".to_string(),
        '\n' => "ENTER".to_string(),
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

/// When the key is next due, relative to `now`
pub fn review_label(stats: &KeyStats, now: i64) -> String {
    let remaining = stats.next_review_date - now;
    if remaining <= 0 {
        "due".to_string()
    } else {
        let days = (remaining + MS_PER_DAY - 1) / MS_PER_DAY;
        format!("in {days}d")
    }
}

/// Pure presenter for a single key stats row
pub fn present_row(stats: &KeyStats, now: i64, weakest: bool) -> Row<'static> {
    let rate_pct = stats.mistake_rate * 100.0;
    let rate_color = if rate_pct == 0.0 {
        Color::Green
    } else if rate_pct < 10.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    let review = review_label(stats, now);
    let review_style = if review == "due" {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let key_style = if weakest {
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    Row::new(vec![
        Cell::from(key_label(stats.key)).style(key_style),
        Cell::from(format!("{rate_pct:.1}")).style(Style::default().fg(rate_color)),
        Cell::from(stats.total_attempts.to_string()),
        Cell::from(format!("{:.2}", stats.ease_factor)),
        Cell::from(format!("{}d", stats.interval)),
        Cell::from(review).style(review_style),
    ])
}

/// Render the weak-key table with SM-2 scheduling columns
pub fn render_key_stats(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Stats table
            Constraint::Length(3), // Instructions
        ])
        .split(area);

    let view = &app.key_stats_view;
    let sort_direction = if view.sort_ascending { "↑" } else { "↓" };
    let sort_by_text = match view.sort_by {
        SortBy::Key => "Key",
        SortBy::MistakeRate => "Mistake Rate",
        SortBy::Attempts => "Attempts",
        SortBy::NextReview => "Next Review",
    };
    let due = app.stats.due_keys(app.now).len();
    let title_text = format!("Key Statistics (Sort: {sort_by_text} {sort_direction})  {due} due");

    Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL).title("Stats"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let keys = view.sorted(&app.stats);
    if keys.is_empty() {
        Paragraph::new("No key statistics yet. Mistyped keys show up here.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(chunks[1], buf);
    } else {
        // borders + header
        let table_height = chunks[1].height.saturating_sub(3) as usize;
        let max_scroll = keys.len().saturating_sub(table_height);
        let offset = view.scroll_offset.min(max_scroll);

        let indicator = |sort_by: SortBy| if view.sort_by == sort_by { sort_direction } else { "" };
        let header = Row::new(vec![
            Cell::from(format!("Key {}", indicator(SortBy::Key))),
            Cell::from(format!("Mistakes (%) {}", indicator(SortBy::MistakeRate))),
            Cell::from(format!("Attempts {}", indicator(SortBy::Attempts))),
            Cell::from("Ease"),
            Cell::from("Interval"),
            Cell::from(format!("Review {}", indicator(SortBy::NextReview))),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = keys
            .iter()
            .skip(offset)
            .take(table_height)
            .map(|k| present_row(k, app.now, app.stats.weakest_keys.contains(&k.key)))
            .collect();

        let widths = [
            Constraint::Length(8),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Min(10),
        ];

        Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Weak Keys"))
            .column_spacing(2)
            .render(chunks[1], buf);
    }

    Paragraph::new(
        "(↑/↓) scroll  (PgUp/PgDn) page  (Home) top  (1-4) sort  (space) reverse  (b/backspace) back  (n) new  (r) retry",
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[2], buf);
}
