//! Tabular terminal rendering of chart specifications.
//!
//! Every chart kind is drawn as a bordered [`ratatui::widgets::Table`]: one
//! row per category, one column per series. Summary panels become a
//! paragraph and composite figures are split into their grid.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use audience_core::formatting::format_optional_rating;

use crate::chart::{ChartKind, ChartSpec};
use crate::themes::Theme;

/// Widest category label before truncation.
const MAX_CATEGORY_WIDTH: usize = 28;
const VALUE_WIDTH: u16 = 10;

/// Render any chart spec into `area`.
pub fn render_chart(frame: &mut Frame, area: Rect, chart: &ChartSpec, theme: &Theme) {
    match chart.kind {
        ChartKind::Summary => render_summary(frame, area, chart, theme),
        ChartKind::Composite => render_composite(frame, area, chart, theme),
        _ => render_series_table(frame, area, chart, theme),
    }
}

/// Render a placeholder when there is nothing to show.
pub fn render_no_data(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No chart data", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.dim)),
        Line::from(Span::styled("Press 'q' or Esc to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Audience Analyzer "),
            ),
        area,
    );
}

/// Truncate `label` to at most `max_width` terminal columns, marking the cut
/// with an ellipsis.
pub fn fit_width(label: &str, max_width: usize) -> String {
    if label.width() <= max_width {
        return label.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in label.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn chart_block<'a>(chart: &ChartSpec, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(format!(" {} ", chart.title), theme.title))
}

fn render_series_table(frame: &mut Frame, area: Rect, chart: &ChartSpec, theme: &Theme) {
    let category_width = chart
        .categories
        .iter()
        .map(|c| c.width())
        .chain(std::iter::once(chart.x_label.width()))
        .max()
        .unwrap_or(0)
        .min(MAX_CATEGORY_WIDTH);

    let header_label = match chart.kind {
        ChartKind::Heatmap | ChartKind::HorizontalBar => chart.y_label.as_str(),
        _ => chart.x_label.as_str(),
    };
    let mut header_cells = vec![Cell::from(header_label.to_string()).style(theme.table_header)];
    header_cells.extend(chart.series.iter().map(|s| {
        Cell::from(fit_width(&s.name, VALUE_WIDTH as usize))
            .style(theme.series_header(s.color.as_deref()))
    }));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = chart
        .categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let mut cells = vec![Cell::from(fit_width(category, category_width))];
            cells.extend(chart.series.iter().map(|s| {
                let value = s.values.get(i).copied().flatten();
                let cell = Cell::from(format_optional_rating(value));
                if value.is_none() {
                    cell.style(theme.no_data)
                } else {
                    cell
                }
            }));
            Row::new(cells).style(style)
        })
        .collect();

    let mut widths = vec![Constraint::Length(category_width as u16 + 1)];
    widths.extend(chart.series.iter().map(|_| Constraint::Length(VALUE_WIDTH)));

    let table = Table::new(rows, widths)
        .header(header)
        .block(chart_block(chart, theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

fn render_summary(frame: &mut Frame, area: Rect, chart: &ChartSpec, theme: &Theme) {
    let mut lines: Vec<Line> = chart
        .text
        .iter()
        .map(|l| Line::from(Span::styled(l.clone(), theme.text)))
        .collect();
    if let Some(series) = chart.series.first() {
        lines.extend(chart.categories.iter().enumerate().map(|(i, label)| {
            let value = series.values.get(i).copied().flatten();
            let style = if value.is_none() { theme.no_data } else { theme.text };
            Line::from(vec![
                Span::styled(format!("{}: ", label), theme.text),
                Span::styled(format_optional_rating(value), style),
            ])
        }));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(chart_block(chart, theme)),
        area,
    );
}

fn render_composite(frame: &mut Frame, area: Rect, chart: &ChartSpec, theme: &Theme) {
    let (rows, columns) = chart
        .grid
        .map(|g| (g.rows.max(1), g.columns.max(1)))
        .unwrap_or((chart.panels.len().max(1) as u16, 1));

    let block = chart_block(chart, theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows as usize]).split(inner);
    let mut panels = chart.panels.iter();
    for row_area in row_areas.iter() {
        let cells = Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns as usize])
            .split(*row_area);
        for cell in cells.iter() {
            match panels.next() {
                Some(panel) => render_chart(frame, *cell, panel, theme),
                None => return,
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
