use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::Popup;
use crate::theme::Theme;
use crate::view::{Control, FieldView, ResultView, Screen};

// Load theme colors once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

fn accent() -> Color { theme().accent }
fn success() -> Color { theme().success }
fn danger() -> Color { theme().danger }
fn warning() -> Color { theme().warning }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn inactive() -> Color { theme().inactive }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, screen: &Screen, popup: Popup) {
    let area = f.area();
    let banner_height = if screen.error.is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // Title + status
            Constraint::Length(banner_height),  // Error banner
            Constraint::Min(6),                 // Form | result
            Constraint::Length(1),              // Footer
        ])
        .split(area);

    draw_header(f, screen, chunks[0]);
    if let Some(ref message) = screen.error {
        draw_error_banner(f, message, chunks[1]);
    }

    // Stack the panels on narrow terminals
    let body = if area.width < 80 {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[2])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[2])
    };

    draw_form(f, screen, body[0]);
    draw_result(f, screen.result.as_ref(), body[1]);
    draw_footer(f, area.width, chunks[3]);

    if popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_header(f: &mut Frame, screen: &Screen, area: Rect) {
    let (dot_color, dot) = match screen.status.connected {
        Some(true) => (success(), "●"),
        Some(false) => (danger(), "●"),
        None => (warning(), "○"),
    };

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(inactive()));

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(22)])
        .split(block.inner(area));
    f.render_widget(block, area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            screen.title.as_str(),
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(screen.description.as_str(), Style::default().fg(text_dim()))),
    ]);
    f.render_widget(title, chunks[0]);

    let status = Paragraph::new(Line::from(vec![
        Span::styled(dot, Style::default().fg(dot_color)),
        Span::styled(format!(" {}", screen.status.label), Style::default().fg(text())),
    ]))
    .alignment(Alignment::Right);
    f.render_widget(status, chunks[1]);
}

fn draw_error_banner(f: &mut Frame, message: &str, area: Rect) {
    let banner = Paragraph::new(Line::from(vec![
        Span::styled("⚠ ", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
        Span::styled(message, Style::default().fg(danger())),
    ]))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(danger())),
    );
    f.render_widget(banner, area);
}

fn draw_form(f: &mut Frame, screen: &Screen, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Input ", Style::default().fg(header()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    if screen.fields.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("  No form loaded", Style::default().fg(text_dim()))),
            Line::from(vec![
                Span::styled("  Press ", Style::default().fg(text_dim())),
                Span::styled("R", Style::default().fg(accent())),
                Span::styled(" to reload the model configuration", Style::default().fg(text_dim())),
            ]),
        ])
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for field in &screen.fields {
        lines.extend(field_lines(field));
        lines.push(Line::from(""));
    }

    // Submit button
    let submit = &screen.submit;
    let button_style = if !submit.enabled {
        Style::default().fg(warning())
    } else if submit.focused {
        Style::default().fg(accent()).bg(bg_selected()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(accent())
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("[ {} ]", submit.label), button_style),
    ]));

    // Keep the focused field visible on short terminals
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = form_scroll(screen, lines.len(), inner_height);

    let form = Paragraph::new(lines).block(block).scroll((scroll, 0));
    f.render_widget(form, area);
}

/// Rows to scroll so the focused control (or the submit button, the last line) is in view
fn form_scroll(screen: &Screen, line_count: usize, inner_height: usize) -> u16 {
    let focus_line = screen
        .fields
        .iter()
        .position(|f| f.focused)
        .map(|i| i * 3 + 1)
        .unwrap_or_else(|| line_count.saturating_sub(1));
    (focus_line + 1).saturating_sub(inner_height) as u16
}

/// Label line + control line for one field
fn field_lines(field: &FieldView) -> Vec<Line<'_>> {
    let label_style = if field.focused {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(text())
    };

    let mut label = vec![
        Span::styled(if field.focused { "▸ " } else { "  " }, Style::default().fg(accent())),
        Span::styled(field.label.as_str(), label_style),
    ];
    if field.required {
        label.push(Span::styled(" *", Style::default().fg(danger())));
    }

    let control_style = if field.focused {
        Style::default().bg(bg_selected()).fg(text())
    } else {
        Style::default().fg(text())
    };

    let mut control = vec![Span::raw("    ")];
    match &field.control {
        Control::Select { options } => {
            let chosen = options.iter().find(|o| o.selected);
            let (value, style) = match chosen {
                Some(o) if !o.disabled => (o.label.clone(), control_style),
                Some(o) => (o.label.clone(), control_style.fg(text_dim())),
                None => (String::new(), control_style),
            };
            control.push(Span::styled(format!("‹ {} ›", value), style));
            let count = options.iter().filter(|o| !o.disabled).count();
            control.push(Span::styled(format!("  {} options", count), Style::default().fg(inactive())));
        }
        Control::Number { text: value, placeholder, min, max } => {
            let cursor = if field.focused { "_" } else { "" };
            if value.is_empty() && !field.focused {
                control.push(Span::styled(format!("[ {} ]", placeholder), control_style.fg(text_dim())));
            } else {
                control.push(Span::styled(format!("[ {}{} ]", value, cursor), control_style));
            }
            if let Some(range) = range_hint(*min, *max) {
                control.push(Span::styled(format!("  {}", range), Style::default().fg(inactive())));
            }
        }
    }

    vec![Line::from(label), Line::from(control)]
}

fn range_hint(min: Option<f64>, max: Option<f64>) -> Option<String> {
    match (min, max) {
        (Some(lo), Some(hi)) => Some(format!("{} – {}", lo, hi)),
        (Some(lo), None) => Some(format!("≥ {}", lo)),
        (None, Some(hi)) => Some(format!("≤ {}", hi)),
        (None, None) => None,
    }
}

fn draw_result(f: &mut Frame, result: Option<&ResultView>, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Prediction ", Style::default().fg(header()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if result.is_some() { success() } else { inactive() }));

    let Some(result) = result else {
        let hint = Paragraph::new(Span::styled("  Fill in the form and press Enter", Style::default().fg(text_dim())))
            .block(block);
        f.render_widget(hint, area);
        return;
    };

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    // "$" prefixes, any other unit trails
    let value = if result.unit == "$" {
        format!("{}{}", result.unit, result.value)
    } else {
        format!("{} {}", result.value, result.unit)
    };
    let headline = Paragraph::new(Line::from(Span::styled(
        value,
        Style::default().fg(success()).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(headline, chunks[0]);

    let rows: Vec<Row> = result
        .details
        .iter()
        .map(|(label, value)| {
            Row::new(vec![
                Span::styled(label.as_str(), Style::default().fg(text_dim())),
                Span::styled(value.as_str(), Style::default().fg(text())),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(50), Constraint::Percentage(50)]);
    f.render_widget(table, chunks[1]);
}

fn draw_footer(f: &mut Frame, width: u16, area: Rect) {
    let hints: [(&str, &str); 6] = [
        ("Tab", "Next"),
        ("←→", "Choose"),
        ("Enter", "Predict"),
        ("R", "Reload"),
        ("?", "Help"),
        ("q", "Quit"),
    ];

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if width < 60 { 3 } else if width < 80 { 4 } else { hints.len() };

    let spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 90 } else { 60 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let key_line = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };
    let heading = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(header()).add_modifier(Modifier::BOLD)))
    };

    let help_text = vec![
        heading("═══ Form ═══"),
        key_line("Tab / ↓", "Next field"),
        key_line("S-Tab / ↑", "Previous field"),
        key_line("← → Space", "Change selection"),
        key_line("0-9 . -", "Type a number"),
        key_line("Enter", "Submit for prediction"),
        Line::from(""),
        heading("═══ General ═══"),
        key_line("R", "Reload model configuration"),
        key_line("q / Esc", "Quit (outside number fields)"),
        key_line("Ctrl-C", "Quit"),
        Line::from(""),
        heading("═══ Command Line ═══"),
        key_line("--status", "Print API status as JSON"),
        key_line("--show-config", "Print the model configuration"),
        key_line("--predict", "One-shot prediction: NAME=VALUE ..."),
        key_line("--api-url", "Override the backend URL"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" modelform Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiStatus;
    use crate::form::{tests::sample_config, FormState};
    use crate::model::ApiInfo;
    use crate::view::{render, ViewInput};
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered_text(screen: &Screen, popup: Popup) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| draw(f, screen, popup)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draws_form_result_and_error() {
        let config = sample_config();
        let form = FormState::build(&config).unwrap();
        let result = ResultView {
            value: "452,301".to_string(),
            unit: "$".to_string(),
            details: vec![("Country label".to_string(), "Germany".to_string())],
        };
        let screen = render(&ViewInput {
            status: &ApiStatus::Connected(ApiInfo::default()),
            model: Some(&config),
            form: &form,
            focus: 1,
            submitting: false,
            result: Some(&result),
            error: Some("bad input"),
        });

        let text = rendered_text(&screen, Popup::None);
        assert!(text.contains("Salary Predictor"));
        assert!(text.contains("API Connected"));
        assert!(text.contains("Select Country label"));
        assert!(text.contains("[ Predict ]"));
        assert!(text.contains("$452,301"));
        assert!(text.contains("bad input"));
    }

    #[test]
    fn test_draws_empty_state_and_help() {
        let form = FormState::default();
        let screen = render(&ViewInput {
            status: &ApiStatus::Disconnected,
            model: None,
            form: &form,
            focus: 0,
            submitting: false,
            result: None,
            error: None,
        });

        let text = rendered_text(&screen, Popup::None);
        assert!(text.contains("API Disconnected"));
        assert!(text.contains("No form loaded"));

        let text = rendered_text(&screen, Popup::Help);
        assert!(text.contains("modelform Help"));
    }

    #[test]
    fn test_form_scroll_keeps_submit_on_last_row() {
        let config = sample_config();
        let form = FormState::build(&config).unwrap();
        let screen_with_focus = |focus| {
            render(&ViewInput {
                status: &ApiStatus::Disconnected,
                model: Some(&config),
                form: &form,
                focus,
                submitting: false,
                result: None,
                error: None,
            })
        };

        // Three fields of three lines each, then the button on line 9
        let line_count = config.features.len() * 3 + 1;
        assert_eq!(form_scroll(&screen_with_focus(form.len()), line_count, 4), 6);
        assert_eq!(form_scroll(&screen_with_focus(form.len()), line_count, 20), 0);
        assert_eq!(form_scroll(&screen_with_focus(0), line_count, 4), 0);
        assert_eq!(form_scroll(&screen_with_focus(2), line_count, 4), 4);
    }

    #[test]
    fn test_range_hint() {
        assert_eq!(range_hint(Some(0.0), Some(100.0)).as_deref(), Some("0 – 100"));
        assert_eq!(range_hint(None, None), None);
    }
}
