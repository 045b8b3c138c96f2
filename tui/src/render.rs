//! Drawing a [`DashboardView`] with ratatui: the resource table on top, the
//! CPU and memory graphs of the selected entity below it, one footer line.

use std::time::Duration;

use ktop_core::DashboardView;
use ktop_core::InputEvent;
use ktop_core::Renderer;
use ktop_core::Result;
use ktop_core::RowKind;
use ktop_core::dashboard::LOADING_MESSAGE;
use ktop_core::graph::GraphSeries;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::symbols;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Axis;
use ratatui::widgets::Block;
use ratatui::widgets::Cell;
use ratatui::widgets::Chart;
use ratatui::widgets::Dataset;
use ratatui::widgets::GraphType;
use ratatui::widgets::LegendPosition;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Row as TableRow;
use ratatui::widgets::Table;
use ratatui::widgets::TableState;
use unicode_width::UnicodeWidthStr;

use crate::input::KEYMAP;

/// Borders plus the header line.
const TABLE_CHROME: u16 = 3;

/// Areas of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panes {
    pub table: Rect,
    pub cpu: Rect,
    pub memory: Rect,
    pub footer: Rect,
}

/// Half the height for the table, a quarter for each graph, and the last
/// line for the footer.
pub fn layout(area: Rect) -> Panes {
    let [body, footer] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
    let [table, cpu, memory] = Layout::vertical([
        Constraint::Percentage(50),
        Constraint::Percentage(25),
        Constraint::Percentage(25),
    ])
    .areas(body);
    Panes {
        table,
        cpu,
        memory,
        footer,
    }
}

/// Data rows that fit in the table pane.
pub fn table_body_height(table: Rect) -> u16 {
    table.height.saturating_sub(TABLE_CHROME)
}

/// The name column takes half the inner width; the rest is split evenly.
pub fn column_widths(columns: usize, width: u16) -> Vec<Constraint> {
    let inner = width.saturating_sub(2);
    if columns <= 1 {
        return vec![Constraint::Length(inner.saturating_sub(1))];
    }
    let rest = u16::try_from(2 * (columns - 1)).unwrap_or(u16::MAX);
    std::iter::once(Constraint::Length(inner / 2))
        .chain(std::iter::repeat_n(Constraint::Length(inner / rest), columns - 1))
        .collect()
}

/// Static facts about the session shown alongside the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Where pods are listed, e.g. `namespace default`.
    pub scope: String,
    pub interval: Duration,
}

pub fn draw_dashboard(frame: &mut Frame, view: &DashboardView, context: &RenderContext) {
    let panes = layout(frame.area());
    draw_table(frame, panes.table, view, context);
    draw_graph(frame, panes.cpu, &view.cpu, "m");
    draw_graph(frame, panes.memory, &view.memory, "Mi");
    draw_footer(frame, panes.footer, view, context);
}

fn draw_table(frame: &mut Frame, area: Rect, view: &DashboardView, context: &RenderContext) {
    let header = TableRow::new(view.headers.iter().map(|h| Cell::from(*h))).bold();
    let rows = view.visible_rows.iter().map(|row| {
        let style = match row.kind {
            RowKind::Node => Style::default().bold(),
            RowKind::Pod => Style::default(),
            RowKind::Container => Style::default().dim(),
            RowKind::Message => Style::default().italic(),
        };
        TableRow::new(row.elems.iter().map(|elem| Cell::from(elem.as_str()))).style(style)
    });

    let position = if view.total_rows == 0 {
        String::new()
    } else {
        format!(" {}/{} ", view.selected_row + 1, view.total_rows)
    };
    let title = format!(
        " ktop · {} · {} nodes, {} pods, {} containers ",
        context.scope, view.nodes, view.pods, view.containers
    );
    let block = Block::bordered()
        .title(Line::from(title))
        .title_bottom(Line::from(position).right_aligned());

    let table = Table::new(rows, column_widths(view.headers.len(), area.width))
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().reversed());
    let mut state = TableState::default().with_selected(view.selected_in_window());
    frame.render_stateful_widget(table, area, &mut state);
}

/// X and Y bounds for a series: the x axis spans the samples, the y axis
/// reaches the limit or the highest sample, whichever is larger.
fn graph_bounds(series: &GraphSeries) -> ([f64; 2], [f64; 2]) {
    let last = series.values.len().saturating_sub(1).max(1) as f64;
    let peak = series
        .values
        .iter()
        .copied()
        .chain(series.limit)
        .fold(0.0_f64, f64::max);
    ([0.0, last], [0.0, peak.max(1.0)])
}

fn draw_graph(frame: &mut Frame, area: Rect, series: &GraphSeries, unit: &str) {
    let ([x_min, x_max], [y_min, y_max]) = graph_bounds(series);
    let usage: Vec<(f64, f64)> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();
    let limit: Vec<(f64, f64)> = series
        .limit
        .map(|l| vec![(x_min, l), (x_max, l)])
        .unwrap_or_default();

    let mut datasets = vec![
        Dataset::default()
            .name(series.usage_label.clone())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&usage),
    ];
    if !limit.is_empty() {
        datasets.push(
            Dataset::default()
                .name(series.limit_label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(&limit),
        );
    }

    let chart = Chart::new(datasets)
        .block(Block::bordered().title(format!(" {} ", series.title)))
        .x_axis(Axis::default().bounds([x_min, x_max]))
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![
                    Line::from(format!("0{unit}")),
                    Line::from(format!("{y_max:.0}{unit}")),
                ]),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 1), Constraint::Ratio(1, 1)));
    frame.render_widget(chart, area);
}

fn action_label(event: InputEvent) -> &'static str {
    match event {
        InputEvent::Toggle => "expand",
        InputEvent::Up => "up",
        InputEvent::Down => "down",
        InputEvent::PageUp => "page up",
        InputEvent::PageDown => "page down",
        InputEvent::Home => "top",
        InputEvent::End => "bottom",
        InputEvent::CollapseAll => "collapse all",
        InputEvent::Quit => "quit",
        InputEvent::Resize(_, _) => "",
    }
}

/// `key action` pairs for the first binding of every action.
pub(crate) fn key_hints() -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (event, bindings) in KEYMAP {
        let Some(binding) = bindings.first() else {
            continue;
        };
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        spans.push(binding.into());
        spans.push(Span::raw(format!(" {}", action_label(*event))).dim());
    }
    spans
}

fn status_span(view: &DashboardView, context: &RenderContext) -> Span<'static> {
    if let Some(warning) = &view.status.warning {
        return Span::styled(warning.clone(), Style::default().fg(Color::Red));
    }
    match view.status.last_refresh {
        Some(at) => Span::raw(format!(
            "updated {} · every {:?}",
            at.format("%H:%M:%S"),
            context.interval
        ))
        .dim(),
        None => Span::raw(LOADING_MESSAGE).dim(),
    }
}

/// Key hints on the left, refresh status pushed to the right edge. Hints are
/// dropped when both do not fit.
fn footer_line(view: &DashboardView, context: &RenderContext, width: u16) -> Line<'static> {
    let status = status_span(view, context);
    let hints = key_hints();
    let hints_width: usize = hints.iter().map(|s| s.content.width()).sum();
    let status_width = status.content.width();
    let width = usize::from(width);

    if hints_width + 1 + status_width > width {
        return Line::from(status);
    }
    let mut spans = hints;
    spans.push(Span::raw(" ".repeat(width - hints_width - status_width)));
    spans.push(status);
    Line::from(spans)
}

fn draw_footer(frame: &mut Frame, area: Rect, view: &DashboardView, context: &RenderContext) {
    frame.render_widget(Paragraph::new(footer_line(view, context, area.width)), area);
}

/// [`Renderer`] backed by a ratatui terminal.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    context: RenderContext,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>, context: RenderContext) -> Self {
        Self { terminal, context }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, view: &DashboardView) -> Result<()> {
        let context = &self.context;
        self.terminal
            .draw(|frame| draw_dashboard(frame, view, context))?;
        Ok(())
    }

    fn viewport_height(&self) -> Option<u16> {
        let size = self.terminal.size().ok()?;
        let panes = layout(Rect::new(0, 0, size.width, size.height));
        Some(table_body_height(panes.table))
    }
}
