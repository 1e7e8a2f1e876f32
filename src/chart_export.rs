//! Render the visible series to a PNG file.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::Path;

use crate::table::NumericTable;

const PALETTE: [(u8, u8, u8); 12] = [
    (0, 170, 170),
    (170, 0, 170),
    (0, 170, 0),
    (200, 170, 0),
    (0, 0, 200),
    (200, 0, 0),
    (85, 255, 255),
    (255, 85, 255),
    (85, 255, 85),
    (255, 255, 85),
    (85, 85, 255),
    (255, 85, 85),
];

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub title: String,
    pub stacked: bool,
    pub width: u32,
    pub height: u32,
    pub y_starts_at_zero: bool,
    /// Index of each column in the unfiltered table, so colors match the UI.
    /// Empty means columns are numbered in order.
    pub color_ids: Vec<usize>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Flow bps".to_string(),
            stacked: true,
            width: 1024,
            height: 576,
            y_starts_at_zero: true,
            color_ids: Vec::new(),
        }
    }
}

impl ChartOptions {
    fn color_id(&self, series: usize) -> usize {
        self.color_ids.get(series).copied().unwrap_or(series)
    }
}

/// The values each series is drawn at: running totals when stacked.
pub fn plotted_values(table: &NumericTable, stacked: bool) -> Vec<Vec<f64>> {
    if stacked {
        table.stacked()
    } else {
        (0..table.series_count())
            .map(|s| table.series_values(s).collect())
            .collect()
    }
}

/// Y axis range. Starts at zero unless `from_zero` is off, in which case it
/// hugs the smallest value. Never empty.
pub fn y_bounds(values: &[Vec<f64>], from_zero: bool) -> (f64, f64) {
    let all = || values.iter().flatten().copied();
    let max = all().fold(0.0_f64, f64::max);
    let min = if from_zero {
        0.0
    } else {
        all().fold(f64::INFINITY, f64::min).min(max).max(0.0)
    };
    let upper = if max > min { max * 1.05 } else { min + 1.0 };
    (min, upper)
}

/// Write the table as a chart, using plotters' bitmap backend.
pub fn write_chart_png(path: &Path, table: &NumericTable, options: &ChartOptions) -> Result<()> {
    use plotters::prelude::*;

    if table.series_count() == 0 {
        return Err(eyre!("No series selected"));
    }
    if table.is_empty() {
        return Err(eyre!("No data found"));
    }

    let values = plotted_values(table, options.stacked);
    let x_max = (table.rows.len().saturating_sub(1)).max(1) as f64;
    let (y_min, y_max) = y_bounds(&values, options.y_starts_at_zero || options.stacked);

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(options.title.as_str(), ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

    let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|x| {
            let idx = x.round().max(0.0) as usize;
            labels.get(idx).map(|s| s.to_string()).unwrap_or_default()
        })
        .y_desc("bps")
        .draw()?;

    // Tallest first so each lower band is painted over the one above it
    for series in (0..values.len()).rev() {
        let (r, g, b) = PALETTE[options.color_id(series) % PALETTE.len()];
        let color = RGBColor(r, g, b);
        let points = values[series]
            .iter()
            .enumerate()
            .map(|(x, y)| (x as f64, *y));
        let label = table.series_label(series).to_string();
        if options.stacked {
            chart
                .draw_series(AreaSeries::new(points, y_min, color.filled()).border_style(BLACK))?
                .label(label)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
        } else {
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
