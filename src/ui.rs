use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::symbols;
use tui::text::{Span, Spans};
use tui::widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs, Wrap};
use tui::Frame;

use crate::app::{ChartView, Dashboard};
use crate::compat::ChartKind;
use crate::labels::{self, ChartLabels};

const MENU_TITLES: &[&str] = &["Bar", "Line", "Share", "Quit"];

const PALETTE: &[Color] = &[
    Color::Yellow,
    Color::Cyan,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
    Color::White,
    Color::LightYellow,
];

impl From<ChartKind> for usize {
    fn from(input: ChartKind) -> usize {
        match input {
            ChartKind::Bar => 0,
            ChartKind::Line => 1,
            ChartKind::Share => 2,
        }
    }
}

pub fn draw<B: Backend>(rect: &mut Frame<B>, dashboard: &Dashboard) {
    let size = rect.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)].as_ref())
        .split(size);

    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(chunks[0]);

    rect.render_widget(menu(dashboard.tab), header_chunks[0]);
    rect.render_widget(selections(dashboard), header_chunks[1]);
    draw_view(rect, chunks[1], &dashboard.view);
}

fn menu(tab: ChartKind) -> Tabs<'static> {
    let menu = MENU_TITLES
        .iter()
        .map(|t| {
            let (first, rest) = t.split_at(1);
            Spans::from(vec![
                Span::styled(
                    first,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(rest, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    Tabs::new(menu)
        .select(tab.into())
        .block(Block::default().title("NES-D Dashboard").borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw("|"))
}

fn selection_line(name: &str, value: String) -> Spans<'static> {
    Spans::from(vec![
        Span::styled(format!("{name}: "), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ])
}

fn selections(dashboard: &Dashboard) -> Paragraph<'static> {
    let kind = dashboard.metric.table();
    let color = match dashboard.active_color() {
        Some(c) => labels::dimension_label(c, kind),
        None if dashboard.compare => "(same as group)".to_string(),
        None => "off".to_string(),
    };
    let lines = vec![
        selection_line("Metric", labels::metric_label(dashboard.metric).to_string()),
        selection_line("Group", labels::dimension_label(dashboard.group, kind)),
        selection_line("Color", color),
        selection_line("Year", dashboard.year_label()),
        selection_line("Industry", dashboard.industry_label().to_string()),
        Spans::from(Span::styled(
            "[m]etric [g]roup [c]olor [t]oggle compare [y]ear i[n]dustry",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    Paragraph::new(lines)
        .block(Block::default().title("Selections").borders(Borders::ALL))
        .style(Style::default().fg(Color::Green))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
}

fn draw_view<B: Backend>(rect: &mut Frame<B>, area: Rect, view: &ChartView) {
    match view {
        ChartView::Bars(table) => {
            let bars: Vec<(String, u64)> = table
                .bars()
                .into_iter()
                .map(|(label, value)| (label, value.max(0.0).round() as u64))
                .collect();
            draw_bars(rect, area, &table.labels, &bars);
        }
        ChartView::Lines(table) => {
            draw_series(rect, area, &table.labels, &table.series(), false);
        }
        ChartView::Shares(table) => {
            draw_series(rect, area, &table.labels, &table.series(), true);
        }
        ChartView::Message { title, text } => {
            let message = Paragraph::new(text.clone())
                .block(Block::default().title(title.clone()).borders(Borders::ALL))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            rect.render_widget(message, area);
        }
    }
}

fn draw_bars<B: Backend>(rect: &mut Frame<B>, area: Rect, labels: &ChartLabels, bars: &[(String, u64)]) {
    let data: Vec<(&str, u64)> = bars.iter().map(|(l, v)| (l.as_str(), *v)).collect();
    let slots = area.width.saturating_sub(2) / (data.len().max(1) as u16).max(1);
    let bar_width = slots.saturating_sub(1).clamp(3, 16);

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(format!("{} ({})", labels.title, labels.y_label))
                .borders(Borders::ALL),
        )
        .data(&data)
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::Yellow));
    rect.render_widget(chart, area);
}

fn draw_series<B: Backend>(
    rect: &mut Frame<B>,
    area: Rect,
    labels: &ChartLabels,
    series: &[(String, Vec<(f64, f64)>)],
    percent: bool,
) {
    let points = series.iter().flat_map(|(_, p)| p.iter());
    let (mut x_min, mut x_max, mut y_max) = (f64::MAX, f64::MIN, 0.0f64);
    for (x, y) in points {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_max = y_max.max(*y);
    }
    if x_min > x_max {
        x_min = 0.0;
        x_max = 1.0;
    } else if x_min == x_max {
        x_min -= 0.5;
        x_max += 0.5;
    }
    let y_max = if percent { 100.0 } else { (y_max * 1.1).max(1.0) };

    let datasets = series
        .iter()
        .enumerate()
        .map(|(i, (name, points))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(points)
        })
        .collect();

    let suffix = if percent { "%" } else { "" };
    let chart = Chart::new(datasets)
        .block(Block::default().title(labels.title.clone()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title(labels.x_label.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", x_min.ceil())),
                    Span::raw(format!("{:.0}", x_max.floor())),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(labels.y_label.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw(format!("0{suffix}")),
                    Span::raw(format!("{:.0}{suffix}", y_max / 2.0)),
                    Span::raw(format!("{y_max:.0}{suffix}")),
                ]),
        );
    rect.render_widget(chart, area);
}
