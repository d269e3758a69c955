//! SVG chart of a heterogeneity result table
//!
//! Two side-by-side panels sharing the condition-ratio x axis:
//! - left: z-score, coloured by IQR call (`Diff` red, `Same` blue)
//! - right: -log10(p), coloured by `p < significance_level`, with a dashed
//!   threshold line at -log10(significance_level)
//!
//! Points are labelled with their cluster ids. Clusters whose z-score (left)
//! or p-value (right) is not finite cannot be placed; they are listed in a
//! footer line instead.

use crate::engine::{IqrCall, ResultTable};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::ops::Range;
use std::path::Path;

const FOOTER_HEIGHT: u32 = 40;

/// Chart geometry and significance threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    /// Raw p-value threshold for the right panel
    pub significance_level: f32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            significance_level: 0.05,
        }
    }
}

/// One cluster's position in both panels
#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    pub label: String,
    pub ratio: f32,
    /// `None` when the z-score is not finite
    pub z_score: Option<f32>,
    /// -log10(p); `None` when the p-value is not finite
    pub neg_log10_p: Option<f32>,
    pub call: Option<IqrCall>,
    pub significant: bool,
}

/// Rendered chart
#[derive(Debug, Clone)]
pub struct Chart {
    title: String,
    svg: String,
    points: Vec<PlotPoint>,
    excluded: Vec<String>,
}

impl Chart {
    pub fn title(&self) -> &str {
        &self.title
    }

    /// SVG document
    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn points(&self) -> &[PlotPoint] {
        &self.points
    }

    /// Clusters missing from at least one panel
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// Write the SVG document to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.svg)
            .with_context(|| format!("Failed to write chart: {}", path.display()))
    }
}

/// Render `table` with default options
pub fn render<C: Display, K>(table: &ResultTable<C, K>, title: &str) -> Result<Chart> {
    render_with_options(table, title, &ChartOptions::default())
}

pub fn render_with_options<C: Display, K>(
    table: &ResultTable<C, K>,
    title: &str,
    options: &ChartOptions,
) -> Result<Chart> {
    if options.width == 0 || options.height <= FOOTER_HEIGHT {
        anyhow::bail!(
            "Chart size {}x{} is too small",
            options.width,
            options.height
        );
    }
    if !(options.significance_level > 0.0 && options.significance_level < 1.0) {
        anyhow::bail!(
            "significance_level must lie in (0, 1), got {}",
            options.significance_level
        );
    }

    let points = plot_points(table, options.significance_level);
    let excluded: Vec<String> = points
        .iter()
        .filter(|p| p.z_score.is_none() || p.neg_log10_p.is_none())
        .map(|p| p.label.clone())
        .collect();

    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill chart background")?;

        let (plot_area, footer) = root.split_vertically(options.height - FOOTER_HEIGHT);
        let panels = plot_area.split_evenly((1, 2));

        draw_z_panel(&panels[0], title, &points)?;
        draw_p_panel(&panels[1], title, &points, options.significance_level)?;
        draw_footer(&footer, &excluded)?;

        root.present().context("Failed to finish SVG document")?;
    }

    tracing::debug!(
        plotted = points.len() - excluded.len(),
        excluded = excluded.len(),
        "Chart rendered"
    );

    Ok(Chart {
        title: title.to_string(),
        svg,
        points,
        excluded,
    })
}

/// Panel coordinates for every record in table order
pub fn plot_points<C: Display, K>(
    table: &ResultTable<C, K>,
    significance_level: f32,
) -> Vec<PlotPoint> {
    table
        .iter()
        .map(|record| {
            let p_finite = record.p_value.is_finite() && record.p_value > 0.0;
            PlotPoint {
                label: record.cluster.to_string(),
                ratio: record.ratio,
                z_score: record.z_score.is_finite().then_some(record.z_score),
                neg_log10_p: p_finite.then(|| -record.p_value.log10()),
                call: record.call,
                significant: p_finite && record.p_value < significance_level,
            }
        })
        .collect()
}

/// Padded axis range covering `values`, or `fallback` if there are none
fn axis_range(values: impl Iterator<Item = f32>, fallback: Range<f32>) -> Range<f32> {
    let (min, max) = values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() {
        return fallback;
    }
    let pad = ((max - min) * 0.1).max(0.5);
    (min - pad)..(max + pad)
}

fn draw_z_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    points: &[PlotPoint],
) -> Result<()> {
    let placed: Vec<(&PlotPoint, f32)> = points
        .iter()
        .filter_map(|p| p.z_score.map(|z| (p, z)))
        .collect();
    let y_range = axis_range(
        placed.iter().map(|(_, z)| *z).chain([0.0]),
        -3.0..3.0,
    );

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{}: z-score", title), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.05f32..1.05f32, y_range)
        .context("Failed to build z-score panel")?;

    chart
        .configure_mesh()
        .x_desc("condition ratio")
        .y_desc("z-score")
        .draw()
        .context("Failed to draw z-score axes")?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(-0.05f32, 0.0f32), (1.05, 0.0)],
            BLACK.mix(0.15),
        )))
        .context("Failed to draw z-score baseline")?;

    chart
        .draw_series(placed.iter().map(|(p, z)| {
            let color = match p.call {
                Some(IqrCall::Diff) => RED,
                _ => BLUE,
            };
            EmptyElement::at((p.ratio, *z))
                + Circle::new((0, 0), 4, color.filled())
                + Text::new(p.label.clone(), (6, -6), ("sans-serif", 12).into_font())
        }))
        .context("Failed to draw z-score points")?;

    Ok(())
}

fn draw_p_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    points: &[PlotPoint],
    significance_level: f32,
) -> Result<()> {
    let threshold = -significance_level.log10();
    let placed: Vec<(&PlotPoint, f32)> = points
        .iter()
        .filter_map(|p| p.neg_log10_p.map(|y| (p, y)))
        .collect();
    let top = placed
        .iter()
        .map(|(_, y)| *y)
        .fold(threshold, f32::max)
        + 0.5;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{}: -log10(p)", title), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.05f32..1.05f32, 0f32..top)
        .context("Failed to build p-value panel")?;

    chart
        .configure_mesh()
        .x_desc("condition ratio")
        .y_desc("-log10(p)")
        .draw()
        .context("Failed to draw p-value axes")?;

    // Dashed threshold line
    let dash = 0.03f32;
    chart
        .draw_series((0..18).map(|i| {
            let start = -0.05 + i as f32 * 2.0 * dash;
            PathElement::new(vec![(start, threshold), (start + dash, threshold)], RED.mix(0.6))
        }))
        .context("Failed to draw significance threshold")?;

    chart
        .draw_series(placed.iter().map(|(p, y)| {
            let color = if p.significant { RED } else { BLACK };
            EmptyElement::at((p.ratio, *y))
                + Circle::new((0, 0), 4, color.filled())
                + Text::new(p.label.clone(), (6, -6), ("sans-serif", 12).into_font())
        }))
        .context("Failed to draw p-value points")?;

    Ok(())
}

fn draw_footer(area: &DrawingArea<SVGBackend<'_>, Shift>, excluded: &[String]) -> Result<()> {
    if excluded.is_empty() {
        return Ok(());
    }
    let text = format!("Not plotted (undefined statistic): {}", excluded.join(", "));
    area.draw(&Text::new(
        text,
        (10, 12),
        ("sans-serif", 14).into_font().color(&BLACK),
    ))
    .context("Failed to draw chart footer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ClusterHeterogeneity, ClusterStatus, CrossStatistic};

    fn record(
        cluster: &str,
        ratio: f32,
        z_score: f32,
        p_value: f32,
        call: Option<IqrCall>,
    ) -> ClusterHeterogeneity<String> {
        ClusterHeterogeneity {
            cluster: cluster.to_string(),
            count_a: 5,
            count_b: 5,
            ratio,
            observed: 1.0,
            null_mean: 1.0,
            null_sd: 1.0,
            z_score,
            p_value,
            call,
            status: if call.is_some() {
                ClusterStatus::Tested
            } else {
                ClusterStatus::SingleCondition
            },
        }
    }

    fn table() -> ResultTable<String, String> {
        ResultTable {
            condition_a: "ctrl".to_string(),
            condition_b: "stim".to_string(),
            resample_count: 1000,
            seed: 0,
            statistic: CrossStatistic::Mean,
            iqr_multiplier: 1.5,
            records: vec![
                record("Tcell", 0.9, 4.2, 0.001, Some(IqrCall::Diff)),
                record("Bcell", 0.5, -0.3, 0.7, Some(IqrCall::Same)),
                record("zero_spread", 0.4, f32::NAN, 0.5, Some(IqrCall::Diff)),
                record("Mk", 0.0, f32::NAN, f32::NAN, None),
            ],
        }
    }

    #[test]
    fn test_plot_points() {
        let points = plot_points(&table(), 0.05);
        assert_eq!(points.len(), 4);

        assert_eq!(points[0].z_score, Some(4.2));
        assert!((points[0].neg_log10_p.unwrap() - 3.0).abs() < 1e-5);
        assert!(points[0].significant);

        assert!(!points[1].significant);
        assert_eq!(points[2].z_score, None);
        assert!(points[2].neg_log10_p.is_some());
        assert_eq!(points[3].neg_log10_p, None);
        assert!(!points[3].significant);
    }

    #[test]
    fn test_render_svg_and_exclusions() {
        let chart = render(&table(), "PBMC").unwrap();

        assert_eq!(chart.title(), "PBMC");
        assert!(chart.svg().contains("<svg"));
        assert!(chart.svg().contains("Tcell"));
        assert!(chart.svg().contains("Bcell"));
        assert_eq!(chart.excluded(), ["zero_spread".to_string(), "Mk".to_string()]);
        assert!(chart.svg().contains("Not plotted"));
    }

    #[test]
    fn test_render_empty_table() {
        let mut table = table();
        table.records.clear();
        let chart = render(&table, "empty").unwrap();
        assert!(chart.points().is_empty());
        assert!(chart.excluded().is_empty());
        assert!(!chart.svg().contains("Not plotted"));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let table = table();
        let tiny = ChartOptions {
            height: 10,
            ..ChartOptions::default()
        };
        assert!(render_with_options(&table, "t", &tiny).is_err());

        let bad_alpha = ChartOptions {
            significance_level: 1.5,
            ..ChartOptions::default()
        };
        assert!(render_with_options(&table, "t", &bad_alpha).is_err());
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        render(&table(), "saved").unwrap().save(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("saved: z-score"));
    }

    #[test]
    fn test_axis_range() {
        assert_eq!(axis_range(std::iter::empty(), -1.0..1.0), -1.0..1.0);
        let range = axis_range([0.0f32, 10.0].into_iter(), -1.0..1.0);
        assert!(range.start < 0.0 && range.end > 10.0);
    }
}
