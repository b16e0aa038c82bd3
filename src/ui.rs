use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use keyrace::alignment::EditOp;
use keyrace::config::Mode;
use keyrace::session::SessionRecord;
use keyrace::util::std_dev;

use crate::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.screen {
            Screen::Typing => render_typing(self, area, buf),
            Screen::Results { record } => render_results(record, area, buf),
            Screen::History { rows, .. } => render_history(rows, area, buf),
        }

        if let Some(banner) = &self.error_banner {
            render_error_banner(banner, area, buf);
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let session = &app.session;
    let target = session.target();
    let (span, ops) = session.render_span();
    // Span indices are byte offsets and a user-supplied list can carry
    // multibyte words, so never slice the target as a str here.
    let bytes = target.as_bytes();
    let window = String::from_utf8_lossy(&bytes[span.left_idx..span.right_idx]);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let mut prompt_occupied_lines =
        ((window.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;

    if window.width() <= max_chars_per_line as usize {
        prompt_occupied_lines = 1;
    }

    let timer_lines = if session.mode() == Mode::Time { 2 } else { 0 };
    let debug_lines = if app.config.debug { 2 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(
                    (area.height.saturating_sub(prompt_occupied_lines) / 2).saturating_sub(timer_lines),
                ),
                Constraint::Length(timer_lines),
                Constraint::Length(prompt_occupied_lines),
                Constraint::Min(0),
                Constraint::Length(debug_lines),
            ]
            .as_ref(),
        )
        .split(area);

    let cursor = session.input().len();
    let mut spans = ops
        .iter()
        .map(|op| match op {
            EditOp::Match(b) => Span::styled((*b as char).to_string(), green_bold_style),
            EditOp::OverlapSpace(_) => Span::styled("·".to_owned(), red_bold_style),
            EditOp::Substitute(b) | EditOp::Delete(b) => {
                let shown = match *b {
                    b' ' => "·".to_owned(),
                    c => (c as char).to_string(),
                };
                Span::styled(shown, red_bold_style)
            }
        })
        .collect::<Vec<Span>>();

    if cursor < span.right_idx {
        spans.push(Span::styled(
            (bytes[cursor] as char).to_string(),
            underlined_dim_bold_style,
        ));
        let rest = (cursor + 1).min(span.right_idx);
        spans.push(Span::styled(
            String::from_utf8_lossy(&bytes[rest..span.right_idx]).into_owned(),
            dim_bold_style,
        ));
    }

    let widget = Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });

    widget.render(chunks[2], buf);

    if session.mode() == Mode::Time {
        let timer = Paragraph::new(Span::styled(
            format!("{:.1}", session.seconds_remaining().max(0.0)),
            dim_bold_style,
        ))
        .alignment(Alignment::Center);

        timer.render(chunks[1], buf);
    }

    if app.config.debug {
        let debug = Paragraph::new(format!(
            "cursor {} | window [{}, {}) | line {} | typed {}/{}",
            span.cursor,
            span.left_idx,
            span.right_idx,
            span.window_start_line,
            cursor,
            target.len(),
        ))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);

        debug.render(chunks[4], buf);
    }
}

fn render_results(record: &SessionRecord, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Min(1),    // chart
                Constraint::Length(1), // stats
                Constraint::Length(1), // settings
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ]
            .as_ref(),
        )
        .split(area);

    let points: Vec<(f64, f64)> = record
        .cps_samples
        .iter()
        .enumerate()
        .map(|(i, cps)| ((i + 1) as f64, *cps))
        .collect();

    let overall_duration = (points.len() as f64).max(2.0);
    let highest_cps = points
        .iter()
        .map(|(_, cps)| *cps)
        .fold(1.0_f64, f64::max)
        .ceil();

    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&points)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(format!("{overall_duration:.0}"), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("cps")
                .bounds([0.0, highest_cps])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(format!("{highest_cps:.0}"), bold_style),
                ]),
        );

    chart.render(chunks[0], buf);

    let sd = std_dev(&record.cps_samples).unwrap_or(0.0);
    let stats = Paragraph::new(Span::styled(
        format!(
            "{:.0} wpm   {:.0}% acc   {:.2} sd",
            record.wpm,
            record.accuracy * 100.0,
            sd
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);

    stats.render(chunks[1], buf);

    let settings = Paragraph::new(Span::styled(
        format!(
            "list: {} | mode: {} | backspace: {}",
            record.word_list,
            record.mode,
            if record.allow_backspace { "on" } else { "off" }
        ),
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);

    settings.render(chunks[2], buf);

    let legend = Paragraph::new(Span::styled(
        "(r)etry / (h)istory / (esc)ape",
        italic_style,
    ));

    legend.render(chunks[4], buf);
}

fn render_history(rows: &[SessionRecord], area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Min(0),    // table
            Constraint::Length(2), // instructions
        ])
        .split(area);

    let header = Row::new(vec![
        Cell::from("when"),
        Cell::from("list"),
        Cell::from("mode"),
        Cell::from("wpm"),
        Cell::from("acc %"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.created_at.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(r.word_list.clone()),
                Cell::from(r.mode.to_string()),
                Cell::from(format!("{:.0}", r.wpm)),
                Cell::from(format!("{:.0}", r.accuracy * 100.0)),
            ])
        })
        .collect();

    let table = Table::new(
        table_rows,
        &[
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("History ({} most recent)", rows.len())),
    );

    table.render(chunks[0], buf);

    let instructions = Paragraph::new("(b)ack / (r)etry / (esc)ape")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);

    instructions.render(chunks[1], buf);
}

fn render_error_banner(banner: &crate::ErrorBanner, area: Rect, buf: &mut Buffer) {
    let line = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 1.min(area.height),
    };

    let widget = Paragraph::new(Span::styled(
        format!("save failed: {}", banner.message),
        Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);

    widget.render(line, buf);
}
