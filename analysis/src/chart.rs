use crate::{error::ReportError, stats::Measurement};
use itertools::Itertools;
use plotters::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

const CHART_SIZE: (u32, u32) = (1000, 600);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);

fn draw_error<E: std::error::Error + Send + Sync>(error: DrawingAreaErrorKind<E>) -> ReportError {
    ReportError::Draw(error.to_string())
}

fn tier_label(series: &[Measurement], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::Exact(index) | SegmentValue::CenterOf(index) => series
            .get(*index)
            .map(|measurement| measurement.volume.clone())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

fn points(
    series: &[Measurement],
    value: impl Fn(&Measurement) -> f64,
) -> Vec<(SegmentValue<usize>, f64)> {
    series
        .iter()
        .enumerate()
        .map(|(index, measurement)| (SegmentValue::CenterOf(index), value(measurement)))
        .collect_vec()
}

/// Render both charts of a case into `dir`, returns the paths of the time and
/// improvement chart
pub fn plot(
    series: &[Measurement],
    case: &str,
    dir: &Path,
) -> Result<(PathBuf, PathBuf), ReportError> {
    if series.is_empty() {
        return Err(ReportError::EmptySeries(case.to_owned()));
    }

    fs::create_dir_all(dir)?;

    let time_path = dir.join(format!("{case}_time.svg"));
    let improvement_path = dir.join(format!("{case}_improvement.svg"));

    time_chart(series, case, &time_path)?;
    improvement_chart(series, case, &improvement_path)?;

    info!(case = %case, tiers = series.len(), "Rendered charts");

    Ok((time_path, improvement_path))
}

fn time_chart(series: &[Measurement], case: &str, path: &Path) -> Result<(), ReportError> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let upper = series
        .iter()
        .flat_map(|measurement| [measurement.unindexed, measurement.indexed])
        .fold(0.0_f64, f64::max);
    let upper = if upper > 0.0 { upper * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Execution time - {case}"), CAPTION_FONT)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d((0..series.len()).into_segmented(), 0.0..upper)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_labels(series.len())
        .x_label_formatter(&|value| tier_label(series, value))
        .x_desc("Number of records")
        .y_desc("Time (s)")
        .draw()
        .map_err(draw_error)?;

    for (label, color, data) in [
        (
            "Without index",
            RED,
            points(series, |measurement| measurement.unindexed),
        ),
        (
            "With index",
            BLUE,
            points(series, |measurement| measurement.indexed),
        ),
    ] {
        chart
            .draw_series(LineSeries::new(data.clone(), color.stroke_width(2)))
            .map_err(draw_error)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(
                data.into_iter()
                    .map(|point| Circle::new(point, 4, color.filled())),
            )
            .map_err(draw_error)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_error)?;

    root.present().map_err(draw_error)
}

fn improvement_chart(series: &[Measurement], case: &str, path: &Path) -> Result<(), ReportError> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    // always keep the zero line visible, regressions show up as negative values
    let (lower, upper) = series
        .iter()
        .fold((0.0_f64, 0.0_f64), |(lower, upper), measurement| {
            (
                lower.min(measurement.improvement),
                upper.max(measurement.improvement),
            )
        });
    let padding = (upper - lower).max(1.0) * 0.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Percent improvement - {case}"), CAPTION_FONT)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (0..series.len()).into_segmented(),
            (lower - padding)..(upper + padding),
        )
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_labels(series.len())
        .x_label_formatter(&|value| tier_label(series, value))
        .x_desc("Number of records")
        .y_desc("Improvement (%)")
        .draw()
        .map_err(draw_error)?;

    let data = points(series, |measurement| measurement.improvement);

    chart
        .draw_series(LineSeries::new(data.clone(), GREEN.stroke_width(2)))
        .map_err(draw_error)?;
    chart
        .draw_series(
            data.into_iter()
                .map(|point| Circle::new(point, 4, GREEN.filled())),
        )
        .map_err(draw_error)?;

    root.present().map_err(draw_error)
}
