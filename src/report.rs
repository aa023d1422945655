use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::DateTime;
use tabled::builder::Builder;
use tabled::settings::{Alignment, Height, object::{Columns, Rows}, style::Style};

use crate::metrics::{ChartResult, YUnit};

pub fn print(chart: &ChartResult) {
    let _ = writeln!(io::stdout(), "{}\n\n{}", chart.title, render(chart));
}

/// Renders the chart as a table with a row per bucket and a column per series.
pub fn render(chart: &ChartResult) -> String {
    let mut buckets: BTreeMap<i64, Vec<Option<f64>>> = BTreeMap::new();

    for (index, series) in chart.series.iter().enumerate() {
        for point in &series.data {
            let values = buckets.entry(point.x).or_insert_with(|| vec![None; chart.series.len()]);
            values[index] = point.y;
        }
    }

    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once("Time".to_owned()).chain(chart.series.iter().map(|series| series.title.clone())));

    for (time, values) in buckets {
        builder.push_record(std::iter::once(format_time(time)).chain(
            values.into_iter().map(|value| format_value(chart.y_unit, value))));
    }

    builder.push_record(std::iter::once("Overall".to_owned()).chain(
        chart.series.iter().map(|series| format_value(chart.y_unit, Some(series.overall_value)))));

    let mut table = builder.build();
    table.with(Style::blank());
    table.modify(Rows::first(), Height::increase(2));
    table.modify(Columns::new(1..), Alignment::right());

    table.to_string()
}

fn format_time(timestamp: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

fn format_value(unit: YUnit, value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => match unit {
            YUnit::Time => format!("{:.2} ms", value / 1000.0),
            YUnit::Percent => format!("{:.1}%", value * 100.0),
            YUnit::Bytes | YUnit::Integer => format!("{value:.0}"),
        },
        _ => "-".to_owned(),
    }
}
