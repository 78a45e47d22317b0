//! Rendering of balancing results.
//!
//! Three renderings are available: a plain text table, pretty JSON, and a
//! bar chart drawn with ratatui into an off-screen buffer so it can be
//! printed like any other text.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Widget},
};

use crate::balance::BalanceResult;
use crate::Result;

// Column widths for the station table
const STATION_WIDTH: usize = 8;
const NUMBER_WIDTH: usize = 12;
const MIN_TASKS_WIDTH: usize = 5;
const SPACING: usize = 2;

// Chart layout
const CHART_HEIGHT: u16 = 16;
const GROUP_GAP: u16 = 2;
const MAX_BAR_WIDTH: u16 = 7;
/// Bar values are integers; metrics are scaled so decimals still count.
const VALUE_SCALE: f64 = 100.0;

const COLOR_CYCLE_TIME: Color = Color::Cyan;
const COLOR_METABOLIC: Color = Color::Yellow;

/// Plain text summary with one row per station.
pub fn render_text(result: &BalanceResult) -> String {
    let task_lists: Vec<String> = result
        .stations
        .iter()
        .map(|s| {
            s.tasks
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect();
    let tasks_width = task_lists
        .iter()
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_TASKS_WIDTH);

    let mut out = String::new();
    out.push_str(&format!(
        "Objective: {}  Stations: {}  Takt time: {:.2}  Metabolic target: {:.2}\n\n",
        result.objective, result.num_stations, result.takt_time, result.metabolic_target
    ));
    out.push_str(&format!(
        "{:<sw$}{:sp$}{:<tw$}{:sp$}{:>nw$}{:>nw$}{:>nw$}\n",
        "Station",
        "",
        "Tasks",
        "",
        "Cycle time",
        "Metabolic",
        "Load",
        sw = STATION_WIDTH,
        tw = tasks_width,
        nw = NUMBER_WIDTH,
        sp = SPACING,
    ));
    for (station, tasks) in result.stations.iter().zip(&task_lists) {
        out.push_str(&format!(
            "{:<sw$}{:sp$}{:<tw$}{:sp$}{:>nw$.2}{:>nw$.2}{:>nw$.4}\n",
            station.label(),
            "",
            if tasks.is_empty() { "-" } else { tasks.as_str() },
            "",
            station.cycle_time,
            station.metabolic_cost,
            station.load,
            sw = STATION_WIDTH,
            tw = tasks_width,
            nw = NUMBER_WIDTH,
            sp = SPACING,
        ));
    }
    out.push_str(&format!(
        "\nMax load: {:.4}  Imbalance: {:.4}  Variance: {:.4}  Improvement moves: {}\n",
        result.max_load(),
        result.imbalance,
        result.variance,
        result.moves
    ));
    out
}

/// Pretty-printed JSON of the whole result.
pub fn render_json(result: &BalanceResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Bar chart of cycle time (T) and metabolic cost (M) per station.
pub fn render_chart(result: &BalanceResult, width: u16) -> String {
    let stations = result.stations.len().max(1) as u16;
    let inner = width.saturating_sub(2);
    let bar_width = (inner.saturating_sub(stations * GROUP_GAP) / (2 * stations)).clamp(1, MAX_BAR_WIDTH);

    let title = format!(
        " T = cycle time (takt {:.2})  M = metabolic cost (target {:.2}) ",
        result.takt_time, result.metabolic_target
    );
    let mut chart = BarChart::default()
        .block(Block::bordered().title(title))
        .bar_width(bar_width)
        .bar_gap(0)
        .group_gap(GROUP_GAP);
    for station in &result.stations {
        let bars = [
            metric_bar("T", station.cycle_time, COLOR_CYCLE_TIME),
            metric_bar("M", station.metabolic_cost, COLOR_METABOLIC),
        ];
        chart = chart.data(BarGroup::default().label(Line::from(station.label())).bars(&bars));
    }

    let area = Rect::new(0, 0, width, CHART_HEIGHT);
    let mut buf = Buffer::empty(area);
    chart.render(area, &mut buf);

    buf.content
        .chunks(area.width.max(1) as usize)
        .map(|row| {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn metric_bar(label: &'static str, value: f64, color: Color) -> Bar<'static> {
    Bar::default()
        .value((value * VALUE_SCALE).round().max(0.0) as u64)
        .text_value(format!("{:.1}", value))
        .label(Line::from(label))
        .style(Style::default().fg(color))
}
