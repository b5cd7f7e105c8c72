//! Static Chart Renderer
//! Draws cost-vs-size line charts with plotters and writes them as PNG.
//!
//! Layout follows a 12x6 inch matplotlib figure:
//! 1. Title centered on top
//! 2. Grid, axis labels and ticks
//! 3. One line per structure, legend in the upper-left corner
//!
//! Every chart is written twice, once with a linear y axis and once with a
//! logarithmic one.

use super::plotter::{ChartSpec, PlotModel, YScale};
use crate::config::{ImageConfig, SeriesLabelMap};
use crate::data::ResultTable;
use image::{ImageFormat, RgbImage};
use plotters::coord::ranged1d::{Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const FONT: &str = "sans-serif";
const GRID: RGBAColor = RGBAColor(0, 0, 0, 0.15);
const MINOR_GRID: RGBAColor = RGBAColor(0, 0, 0, 0.05);

// Typographic sizes in points
const TITLE_PT: f64 = 12.0;
const LABEL_PT: f64 = 10.0;
const LINE_PT: f64 = 2.0;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("series '{series}' not present in table (available: {})", available.join(", "))]
    UnknownSeries {
        series: String,
        available: Vec<String>,
    },
    #[error("'{title}': no strictly positive cost to place on a log axis")]
    NoPositiveValues { title: String },
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Paths of the two images produced for one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub linear: PathBuf,
    pub log: PathBuf,
}

/// Renders `ChartSpec`s with a fixed label map and figure geometry.
pub struct StaticChartRenderer<'a> {
    labels: &'a SeriesLabelMap,
    image: ImageConfig,
}

impl<'a> StaticChartRenderer<'a> {
    pub fn new(labels: &'a SeriesLabelMap, image: ImageConfig) -> Self {
        Self { labels, image }
    }

    /// Write `{stem}_linear.png` then `{stem}_log.png`, replacing any
    /// existing files.
    ///
    /// Both plot models are resolved before anything is drawn, so a bad
    /// series identifier or an all-zero log chart leaves the output
    /// directory untouched.
    pub fn render(
        &self,
        table: &ResultTable,
        spec: &ChartSpec,
    ) -> Result<RenderedChart, RenderError> {
        let models = YScale::ALL
            .iter()
            .map(|&scale| PlotModel::build(table, spec, self.labels, scale))
            .collect::<Result<Vec<_>, _>>()?;

        for model in &models {
            let path = spec.output_path(model.scale);
            let img = self.draw(model)?;
            write_png(&img, &path)?;
            info!(
                path = %path.display(),
                scale = model.scale.file_suffix(),
                legend = ?model.legend_labels(),
                omitted = model.omitted_points(),
                "wrote chart"
            );
        }

        Ok(RenderedChart {
            linear: spec.output_path(YScale::Linear),
            log: spec.output_path(YScale::Log),
        })
    }

    /// Draw one model into an RGB pixel buffer.
    pub fn draw(&self, model: &PlotModel) -> Result<RgbImage, RenderError> {
        let (width, height) = self.image.pixel_size();
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let margin = self.px(LABEL_PT);
            let mut builder = ChartBuilder::on(&root);
            builder
                .caption(&model.title, (FONT, self.image.pt(TITLE_PT)).into_font())
                .margin(margin)
                .margin_right(margin * 2)
                .x_label_area_size(self.px(LABEL_PT * 3.5))
                .y_label_area_size(self.px(LABEL_PT * 6.0));

            match model.scale {
                YScale::Linear => {
                    let mut chart = builder
                        .build_cartesian_2d(model.x_range.clone(), model.y_range.clone())
                        .map_err(draw_err)?;
                    self.draw_chart(&mut chart, model)?;
                }
                YScale::Log => {
                    let mut chart = builder
                        .build_cartesian_2d(model.x_range.clone(), model.y_range.clone().log_scale())
                        .map_err(draw_err)?;
                    self.draw_chart(&mut chart, model)?;
                }
            }

            root.present().map_err(draw_err)?;
        }

        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Draw("pixel buffer size mismatch".into()))
    }

    fn draw_chart<'b, Y>(
        &self,
        chart: &mut ChartContext<'b, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, Y>>,
        model: &PlotModel,
    ) -> Result<(), RenderError>
    where
        Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
    {
        let label_font = (FONT, self.image.pt(LABEL_PT)).into_font();

        chart
            .configure_mesh()
            .x_desc(model.x_label.as_str())
            .y_desc(model.y_label.as_str())
            .label_style(label_font.clone())
            .axis_desc_style(label_font.clone())
            .bold_line_style(GRID)
            .light_line_style(MINOR_GRID)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format_cost(*y))
            .draw()
            .map_err(draw_err)?;

        let stroke = self.px(LINE_PT).max(1);
        let legend_len = self.px(LABEL_PT * 2.0) as i32;
        let empty: [(f64, f64); 0] = [];

        for line in &model.lines {
            let style = line.color.stroke_width(stroke);
            debug!(series = %line.id, segments = line.segments.len(), "drawing series");

            // A series with nothing drawable still gets its legend entry.
            let mut segments: Vec<&[(f64, f64)]> =
                line.segments.iter().map(Vec::as_slice).collect();
            if segments.is_empty() {
                segments.push(&empty);
            }

            for (i, segment) in segments.iter().enumerate() {
                let anno = chart
                    .draw_series(LineSeries::new(segment.iter().copied(), style))
                    .map_err(draw_err)?;
                if i == 0 {
                    anno.label(line.label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + legend_len, y)], style)
                    });
                }
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .margin(self.px(LABEL_PT))
            .legend_area_size(legend_len as u32 + self.px(LABEL_PT / 2.0))
            .label_font(label_font)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()
            .map_err(draw_err)?;

        Ok(())
    }

    fn px(&self, points: f64) -> u32 {
        self.image.pt(points).round() as u32
    }
}

/// Tick labels: integers for counts, a few decimals below one.
fn format_cost(value: f64) -> String {
    if value >= 1.0 || value == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Encode into a temp file next to `path`, then rename over it, so readers
/// never see a half-written image.
fn write_png(img: &RgbImage, path: &Path) -> Result<(), RenderError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_err = |source: std::io::Error| RenderError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Same mode a plain `File::create` would get under the process umask.
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let tmp = builder.tempfile_in(dir).map_err(write_err)?;

    // Replacing a chart keeps whatever mode it had.
    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(write_err)?;
    }

    img.save_with_format(tmp.path(), ImageFormat::Png)
        .map_err(|source| RenderError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
