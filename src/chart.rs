use crate::pivot::{PivotIndex, AGGREGATE_MARKER};
use anyhow::{Context, Result};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use std::path::{Path, PathBuf};

// Font sizes, tuned for the 1200px-wide raster output.
const TITLE_FONT_SIZE: u32 = 28;
const AXIS_LABEL_FONT_SIZE: u32 = 20;
const TICK_LABEL_FONT_SIZE: u32 = 15;
const LEGEND_FONT_SIZE: u32 = 16;
const DATA_LABEL_FONT_SIZE: u32 = 13;

// Layout tuning
// The x label area must fit the longest file name rotated vertically.
const CHART_MARGIN: u32 = 20;
const X_LABEL_AREA_SIZE: u32 = 150;
const Y_LABEL_AREA_SIZE: u32 = 80;

// Bar geometry in category units (one unit per file).
const PAIRED_BAR_WIDTH: f64 = 0.4;
const SINGLE_BAR_WIDTH: f64 = 0.6;
const BAR_INSET: f64 = 0.02;

// Vertical headroom above the tallest bar for its value label.
const Y_HEADROOM: f64 = 1.15;

/// Series colors: baseline first, contender second.
const SERIES_COLORS: [RGBColor; 2] = [RGBColor(31, 119, 180), RGBColor(255, 127, 14)];

/// Files pinned to the front of the throughput chart, in display order.
pub const PREFERRED_FILE_ORDER: &[&str] = &[
    "public_state.data",
    "private_state_hashes.data",
    "txids.data",
    "_all.data",
    "TOTAL",
];

type BarChart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// The three image paths derived from the input file's base name.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPaths {
    pub time: PathBuf,
    pub speedup: PathBuf,
    pub throughput: PathBuf,
}

pub fn output_paths(csv: &Path, outdir: &Path) -> Result<ChartPaths> {
    let base = csv
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("cannot derive an output name from {}", csv.display()))?;

    Ok(ChartPaths {
        time: outdir.join(format!("{base}_time.png")),
        speedup: outdir.join(format!("{base}_speedup.png")),
        throughput: outdir.join(format!("{base}_throughput.png")),
    })
}

/// Per-file (baseline ms, contender ms), skipping the aggregate row.
pub fn time_points(index: &PivotIndex) -> Vec<(String, f64, f64)> {
    index
        .paired()
        .filter(|(file, _, _)| *file != AGGREGATE_MARKER)
        .map(|(file, baseline, contender)| {
            (
                file.to_string(),
                baseline.elapsed_ms_median,
                contender.elapsed_ms_median,
            )
        })
        .collect()
}

/// Per-file throughput ratio, contender over baseline.
///
/// Files where either side reports zero throughput are skipped.
pub fn speedup_points(index: &PivotIndex) -> Vec<(String, f64)> {
    index
        .paired()
        .filter(|(_, baseline, contender)| {
            baseline.throughput_mib_per_s != 0.0 && contender.throughput_mib_per_s != 0.0
        })
        .map(|(file, baseline, contender)| {
            (
                file.to_string(),
                contender.throughput_mib_per_s / baseline.throughput_mib_per_s,
            )
        })
        .collect()
}

/// Per-file (baseline MiB/s, contender MiB/s), preferred names first,
/// the remainder in lexicographic order.
pub fn throughput_points(index: &PivotIndex) -> Vec<(String, f64, f64)> {
    let paired: Vec<(&str, f64, f64)> = index
        .paired()
        .map(|(file, baseline, contender)| {
            (
                file,
                baseline.throughput_mib_per_s,
                contender.throughput_mib_per_s,
            )
        })
        .collect();

    let mut ordered: Vec<(&str, f64, f64)> = PREFERRED_FILE_ORDER
        .iter()
        .filter_map(|preferred| paired.iter().find(|(file, _, _)| file == preferred).copied())
        .collect();

    let mut rest: Vec<(&str, f64, f64)> = paired
        .iter()
        .filter(|(file, _, _)| !PREFERRED_FILE_ORDER.contains(file))
        .copied()
        .collect();
    rest.sort_unstable_by(|a, b| a.0.cmp(b.0));
    ordered.extend(rest);

    ordered
        .into_iter()
        .map(|(file, baseline, contender)| (file.to_string(), baseline, contender))
        .collect()
}

/// Grouped bars of median elapsed time per file.
pub fn render_time_chart(index: &PivotIndex, path: &Path) -> Result<()> {
    let points = time_points(index);
    let pair = index.pair();
    render_paired_bar_chart(
        path,
        (1200, 600),
        "Elapsed time (ms) per file",
        "Median time (ms)",
        (&pair.baseline, &pair.contender),
        &points,
    )
}

/// Single bars of the throughput speedup ratio per file.
pub fn render_speedup_chart(index: &PivotIndex, path: &Path) -> Result<()> {
    let points = speedup_points(index);
    let pair = index.pair();
    let caption = format!("Throughput speedup ({} / {})", pair.contender, pair.baseline);

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    if points.is_empty() {
        root.present()?;
        return Ok(());
    }

    let labels: Vec<String> = points.iter().map(|(file, _)| file.clone()).collect();
    let y_max = (points
        .iter()
        .map(|(_, ratio)| *ratio)
        .fold(0.0_f64, f64::max)
        * Y_HEADROOM)
        .max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", TITLE_FONT_SIZE))
        .margin(CHART_MARGIN)
        .x_label_area_size(X_LABEL_AREA_SIZE)
        .y_label_area_size(Y_LABEL_AREA_SIZE)
        .build_cartesian_2d(-0.5..(points.len() as f64 - 0.5), 0.0..y_max)?;

    draw_category_mesh(&mut chart, &labels, "Speedup (×)")?;

    for (idx, (_, ratio)) in points.iter().enumerate() {
        let x_center = idx as f64;
        let x_left = x_center - SINGLE_BAR_WIDTH / 2.0;
        let x_right = x_center + SINGLE_BAR_WIDTH / 2.0;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(x_left, 0.0), (x_right, *ratio)],
            SERIES_COLORS[0].filled(),
        )))?;

        draw_bar_label(&mut chart, x_center, *ratio, y_max)?;
    }

    root.present()?;
    Ok(())
}

/// Grouped bars of absolute throughput per file, with a caller title.
pub fn render_throughput_chart(index: &PivotIndex, path: &Path, title: &str) -> Result<()> {
    let points = throughput_points(index);
    let pair = index.pair();
    render_paired_bar_chart(
        path,
        (1320, 660),
        title,
        "Throughput (MiB/s)",
        (&pair.baseline, &pair.contender),
        &points,
    )
}

/// Shared renderer for the two-series charts (time and throughput).
fn render_paired_bar_chart(
    path: &Path,
    size: (u32, u32),
    caption: &str,
    y_desc: &str,
    series_names: (&str, &str),
    points: &[(String, f64, f64)],
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    if points.is_empty() {
        root.present()?;
        return Ok(());
    }

    let labels: Vec<String> = points.iter().map(|(file, _, _)| file.clone()).collect();
    let y_max = (points
        .iter()
        .map(|(_, baseline, contender)| baseline.max(*contender))
        .fold(0.0_f64, f64::max)
        * Y_HEADROOM)
        .max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", TITLE_FONT_SIZE))
        .margin(CHART_MARGIN)
        .x_label_area_size(X_LABEL_AREA_SIZE)
        .y_label_area_size(Y_LABEL_AREA_SIZE)
        .build_cartesian_2d(-0.5..(points.len() as f64 - 0.5), 0.0..y_max)?;

    draw_category_mesh(&mut chart, &labels, y_desc)?;

    for (idx, (_, baseline, contender)) in points.iter().enumerate() {
        let x_center = idx as f64;

        for (series_idx, &value) in [*baseline, *contender].iter().enumerate() {
            let x_offset = (series_idx as f64 - 0.5) * PAIRED_BAR_WIDTH;
            let x_left = x_center + x_offset - PAIRED_BAR_WIDTH / 2.0 + BAR_INSET;
            let x_right = x_center + x_offset + PAIRED_BAR_WIDTH / 2.0 - BAR_INSET;

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x_left, 0.0), (x_right, value)],
                SERIES_COLORS[series_idx].filled(),
            )))?;

            draw_bar_label(&mut chart, (x_left + x_right) / 2.0, value, y_max)?;
        }
    }

    for (series_idx, name) in [series_names.0, series_names.1].iter().enumerate() {
        let color = SERIES_COLORS[series_idx];
        chart
            .draw_series(std::iter::once(Circle::new(
                (points.len() as f64 - 1.0, y_max),
                0,
                color.filled(),
            )))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", LEGEND_FONT_SIZE))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Horizontal-only grid, rotated category tick labels, axis titles.
fn draw_category_mesh(chart: &mut BarChart<'_, '_>, labels: &[String], y_desc: &str) -> Result<()> {
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            if idx < labels.len() && (x - idx as f64).abs() < 0.3 {
                labels[idx].clone()
            } else {
                String::new()
            }
        })
        .x_label_style(
            ("sans-serif", TICK_LABEL_FONT_SIZE)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_desc(y_desc)
        .x_desc("File")
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;
    Ok(())
}

/// Numeric value centered above a bar, two decimal places.
fn draw_bar_label(chart: &mut BarChart<'_, '_>, x: f64, value: f64, y_max: f64) -> Result<()> {
    chart.draw_series(std::iter::once(Text::new(
        format!("{value:.2}"),
        (x, value + y_max * 0.01),
        ("sans-serif", DATA_LABEL_FONT_SIZE)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom)),
    )))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::AlgoPair;
    use crate::record::Record;

    fn record(algo: &str, file: &str, elapsed_ms: f64, throughput: f64) -> Record {
        Record {
            algorithm: algo.to_string(),
            file: file.to_string(),
            declared_size: None,
            actual_bytes: 1_048_576,
            elapsed_ms_median: elapsed_ms,
            throughput_mib_per_s: throughput,
            checksum_hex: String::new(),
        }
    }

    fn build_index(records: Vec<Record>) -> PivotIndex {
        PivotIndex::build(AlgoPair::default(), records)
    }

    #[test]
    fn test_worked_example() {
        let index = build_index(vec![
            record("SHA-256", "data.bin", 100.0, 10.0),
            record("PH128", "data.bin", 20.0, 50.0),
        ]);

        assert_eq!(
            time_points(&index),
            vec![("data.bin".to_string(), 100.0, 20.0)]
        );
        assert_eq!(
            throughput_points(&index),
            vec![("data.bin".to_string(), 10.0, 50.0)]
        );
        assert_eq!(speedup_points(&index), vec![("data.bin".to_string(), 5.0)]);
    }

    #[test]
    fn test_lonely_file_absent_from_all_charts() {
        let index = build_index(vec![record("SHA-256", "lonely.bin", 1.0, 2.0)]);

        assert!(time_points(&index).is_empty());
        assert!(speedup_points(&index).is_empty());
        assert!(throughput_points(&index).is_empty());
    }

    #[test]
    fn test_time_chart_excludes_aggregate_row() {
        let index = build_index(vec![
            record("SHA-256", "a.data", 1.0, 2.0),
            record("PH128", "a.data", 1.0, 2.0),
            record("SHA-256", "TOTAL", 9.0, 2.0),
            record("PH128", "TOTAL", 9.0, 2.0),
        ]);

        let tp = time_points(&index);
        let files: Vec<&str> = tp
            .iter()
            .map(|(file, _, _)| file.as_str())
            .collect();
        assert_eq!(files, vec!["a.data"]);

        // The aggregate row still counts for the other two charts.
        assert_eq!(speedup_points(&index).len(), 2);
        assert_eq!(throughput_points(&index).len(), 2);
    }

    #[test]
    fn test_speedup_skips_zero_throughput() {
        let index = build_index(vec![
            record("SHA-256", "zero.data", 1.0, 0.0),
            record("PH128", "zero.data", 1.0, 50.0),
            record("SHA-256", "ok.data", 1.0, 25.0),
            record("PH128", "ok.data", 1.0, 100.0),
        ]);

        assert_eq!(speedup_points(&index), vec![("ok.data".to_string(), 4.0)]);
        // The zero-throughput file still shows up in the other charts.
        assert_eq!(time_points(&index).len(), 2);
        assert_eq!(throughput_points(&index).len(), 2);
    }

    #[test]
    fn test_speedup_ratio_is_exact() {
        let index = build_index(vec![
            record("SHA-256", "a.data", 1.0, 3.0),
            record("PH128", "a.data", 1.0, 10.0),
        ]);

        assert_eq!(
            speedup_points(&index),
            vec![("a.data".to_string(), 10.0 / 3.0)]
        );
    }

    #[test]
    fn test_throughput_order_preferred_then_lexicographic() {
        let mut records = Vec::new();
        for file in ["zzz.data", "TOTAL", "aaa.data", "txids.data", "_all.data"] {
            records.push(record("SHA-256", file, 1.0, 2.0));
            records.push(record("PH128", file, 1.0, 2.0));
        }

        let files: Vec<String> = throughput_points(&build_index(records))
            .into_iter()
            .map(|(file, _, _)| file)
            .collect();
        assert_eq!(
            files,
            vec!["txids.data", "_all.data", "TOTAL", "aaa.data", "zzz.data"]
        );
    }

    #[test]
    fn test_output_paths_derived_from_stem() {
        let paths = output_paths(
            Path::new("results/snapshot_bench.csv"),
            Path::new("/tmp/out"),
        )
        .unwrap();

        assert_eq!(
            paths.time,
            PathBuf::from("/tmp/out/snapshot_bench_time.png")
        );
        assert_eq!(
            paths.speedup,
            PathBuf::from("/tmp/out/snapshot_bench_speedup.png")
        );
        assert_eq!(
            paths.throughput,
            PathBuf::from("/tmp/out/snapshot_bench_throughput.png")
        );
    }

    #[test]
    fn test_empty_index_renders_blank_images() {
        let dir = tempfile::tempdir().unwrap();
        let empty = build_index(Vec::new());

        let time_png = dir.path().join("empty_time.png");
        let speedup_png = dir.path().join("empty_speedup.png");
        let throughput_png = dir.path().join("empty_throughput.png");

        render_time_chart(&empty, &time_png).unwrap();
        render_speedup_chart(&empty, &speedup_png).unwrap();
        render_throughput_chart(&empty, &throughput_png, "title").unwrap();

        for path in [time_png, speedup_png, throughput_png] {
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }
}
