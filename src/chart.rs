// THEORY:
// The `chart` module draws the harness's `PerformanceRecord`s as a line chart,
// one point per image in record order: sequential seconds in red, parallel seconds
// in blue. It is the graphical twin of the console table in `report`.
//
// The chart carries no text at all. Axis labels and captions need a font backend,
// and the record order plus the printed table already name every point.

use crate::benchmark::PerformanceRecord;
use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

/// Pixel size of the rendered chart.
pub const CHART_SIZE: (u32, u32) = (800, 400);

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no performance records to chart")]
    NoRecords,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("chart drawing failed: {0}")]
    Drawing(String),
}

fn drawing(err: impl Display) -> ChartError {
    ChartError::Drawing(err.to_string())
}

/// Renders `records` to a PNG at `path`, creating the parent directory if needed.
pub fn write_chart(records: &[PerformanceRecord], path: &Path) -> Result<(), ChartError> {
    if records.is_empty() {
        return Err(ChartError::NoRecords);
    }

    let sequential: Vec<(f64, f64)> = records
        .iter()
        .enumerate()
        .map(|(i, record)| (i as f64, record.sequential().as_secs_f64()))
        .collect();
    let parallel: Vec<(f64, f64)> = records
        .iter()
        .enumerate()
        .map(|(i, record)| (i as f64, record.parallel().as_secs_f64()))
        .collect();

    let slowest = sequential
        .iter()
        .chain(&parallel)
        .map(|&(_, secs)| secs)
        .fold(0.0_f64, f64::max)
        .max(f64::EPSILON);
    let x_range = -0.5..(records.len() as f64 - 0.5);
    let y_range = 0.0..slowest * 1.1;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(x_range, y_range)
        .map_err(drawing)?;

    for (points, color) in [(&sequential, RED), (&parallel, BLUE)] {
        chart
            .draw_series(LineSeries::new(points.iter().copied(), &color))
            .map_err(drawing)?;
        chart
            .draw_series(points.iter().map(|&point| Circle::new(point, 4, color.filled())))
            .map_err(drawing)?;
    }

    root.present().map_err(drawing)?;
    log::debug!("wrote chart of {} records to {}", records.len(), path.display());
    Ok(())
}
