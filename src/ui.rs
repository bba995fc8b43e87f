pub mod charting;
pub mod key_stats;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState};
use crate::result::SessionResult;
use crate::state::ErrorMode;
use crate::time_series::chart_points;
use crate::visual::{VisualCharacter, VisualSessionState, VisualState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const ORANGE: Color = Color::Rgb(255, 165, 0);

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Style of one prompt character
pub fn visual_style(state: VisualState) -> Style {
    match state {
        VisualState::Pending => bold().add_modifier(Modifier::DIM),
        VisualState::Correct => bold().fg(Color::Green),
        VisualState::Incorrect => bold().fg(Color::Red),
        VisualState::Corrected => bold().fg(ORANGE),
        VisualState::ErrorZone => Style::default()
            .fg(Color::LightRed)
            .add_modifier(Modifier::DIM | Modifier::CROSSED_OUT),
    }
}

fn display_char(c: &VisualCharacter) -> String {
    match (c.char, c.visual_state) {
        ('\n', _) => "⏎".to_string(),
        (' ', VisualState::Incorrect | VisualState::ErrorZone) => "·".to_string(),
        (ch, _) => ch.to_string(),
    }
}

/// Prompt lines, broken after every newline of the text
pub fn prompt_lines(visual: &VisualSessionState) -> Vec<Line<'static>> {
    let mut lines = vec![];
    let mut spans = vec![];
    for c in &visual.characters {
        let mut style = visual_style(c.visual_state);
        if c.is_cursor {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        spans.push(Span::styled(display_char(c), style));
        if c.char == '\n' {
            lines.push(Line::from(std::mem::take(&mut spans)));
        }
    }
    if !spans.is_empty() || lines.is_empty() {
        lines.push(Line::from(spans));
    }
    lines
}

fn occupied_lines(lines: &[Line], max_width: usize) -> u16 {
    lines
        .iter()
        .map(|line| {
            let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            text.width().div_ceil(max_width).max(1)
        })
        .sum::<usize>() as u16
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => match self.result() {
                Some(result) => render_results(self, result, area, buf),
                None => render_typing(self, area, buf),
            },
            AppState::KeyStats => key_stats::render_key_stats(self, area, buf),
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let visual = app.session.visual();
    let lines = prompt_lines(&visual);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_occupied_lines = occupied_lines(&lines, max_chars_per_line as usize);
    let single_line = lines.len() == 1 && prompt_occupied_lines == 1;
    let padding = area.height.saturating_sub(prompt_occupied_lines + 2) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Length(padding),
        ])
        .split(area);

    let dim = Style::default().add_modifier(Modifier::DIM);
    let header = format!(
        "{}%   {}",
        visual.progress,
        app.session.config.error_mode
    );
    Paragraph::new(Span::styled(header, dim))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(lines)
        // single-line prompts are centred
        .alignment(if single_line {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    let blocked = app.session.config.error_mode == ErrorMode::CorrectionRequired
        && visual.has_unfixed_errors
        && app.session.state().cursor_position == visual.characters.len();
    if blocked {
        Paragraph::new(Span::styled(
            "fix the highlighted errors with backspace to finish",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }
}

fn summary_line(result: &SessionResult) -> String {
    format!(
        "{} wpm   {}% acc   {} raw   {} mistakes   {:.1}s",
        result.net_wpm,
        result.accuracy,
        result.gross_wpm,
        result.mistakes,
        result.duration_secs()
    )
}

fn units_line(result: &SessionResult) -> String {
    [
        ("words", &result.words),
        ("sentences", &result.sentences),
        ("paragraphs", &result.paragraphs),
    ]
    .iter()
    .filter(|(_, units)| units.total > 0)
    .map(|(name, units)| format!("{name} with errors {}/{}", units.with_errors, units.total))
    .join("   ")
}

fn weakest_line(app: &App) -> String {
    if app.stats.weakest_keys.is_empty() {
        return "no weak keys yet".to_string();
    }
    let keys = app
        .stats
        .weakest_keys
        .iter()
        .map(|k| match k {
            ' ' => "␣".to_string(),
            c => c.to_string(),
        })
        .join(" ");
    format!("weakest keys: {keys}")
}

fn render_results(app: &App, result: &SessionResult, area: Rect, buf: &mut Buffer) {
    let bold_style = bold();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // unit errors
            Constraint::Length(1), // weakest keys
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let points = chart_points(&app.stats.wpm_history);
    let (last_session, highest_wpm) = charting::compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("sessions")
                .bounds([0.0, last_session])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(last_session), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(summary_line(result), bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        units_line(result),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        weakest_line(app),
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (s)tats / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}
