use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType},
    Frame,
};
use serde::Serialize;

use crate::forecast::{ChartSeries, Rgba};

const LINE_TENSION: f64 = 0.1;
const AXIS_COLOR: Color = Color::Rgb(0x80, 0x80, 0x80);

#[derive(Serialize, Debug)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
    pub background_color: String,
    pub tension: f64,
    pub fill: bool,
}

impl From<&ChartSeries> for ChartData {
    fn from(series: &ChartSeries) -> Self {
        Self {
            labels: series.labels.clone(),
            datasets: vec![ChartDataset {
                label: series.series_label.clone(),
                data: series.values.clone(),
                border_color: series.stroke.css(),
                background_color: series.fill.css(),
                tension: LINE_TENSION,
                fill: true,
            }],
        }
    }
}

pub fn tui_color(color: Rgba) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

fn value_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
            (lo.min(*v), hi.max(*v))
        });
    if !min.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((max - min) * 0.1).max(0.5);
    [min - pad, max + pad]
}

fn x_labels(labels: &[String]) -> Vec<Span<'_>> {
    match labels {
        [] => vec![],
        [only] => vec![Span::raw(only.as_str())],
        [first, .., last] => vec![
            Span::raw(first.as_str()),
            Span::raw(labels[labels.len() / 2].as_str()),
            Span::raw(last.as_str()),
        ],
    }
}

pub fn render(f: &mut Frame, area: Rect, series: &ChartSeries) {
    let data = points(&series.values);
    let [lo, hi] = value_bounds(&data);
    let stroke = tui_color(series.stroke);

    let datasets = vec![Dataset::default()
        .name(series.series_label.as_str())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(stroke))
        .data(&data)];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", series.series_label),
            Style::default().fg(stroke),
        ))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(AXIS_COLOR))
                .bounds([0.0, series.values.len().saturating_sub(1).max(1) as f64])
                .labels(x_labels(&series.labels)),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(AXIS_COLOR))
                .bounds([lo, hi])
                .labels(vec![
                    Span::raw(format!("{lo:.1}")),
                    Span::raw(format!("{:.1}", (lo + hi) / 2.0)),
                    Span::raw(format!("{hi:.1}")),
                ]),
        );

    f.render_widget(chart, area);
}
