//! Chart Plotter Module
//! Turns a result table and a chart request into drawable line series,
//! axis ranges and legend entries, independent of any drawing backend.

use super::renderer::RenderError;
use crate::config::SeriesLabelMap;
use crate::data::ResultTable;
use plotters::style::RGBColor;
use std::ops::Range;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Line colours, assigned by position in the series list.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),  // Blue
    RGBColor(255, 127, 14),  // Orange
    RGBColor(44, 160, 44),   // Green
    RGBColor(214, 39, 40),   // Red
    RGBColor(148, 103, 189), // Purple
    RGBColor(140, 86, 75),   // Brown
    RGBColor(227, 119, 194), // Pink
    RGBColor(127, 127, 127), // Grey
    RGBColor(188, 189, 34),  // Olive
    RGBColor(23, 190, 207),  // Cyan
];

/// Y-axis transform of one output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YScale {
    Linear,
    Log,
}

impl YScale {
    /// Both variants, in the order they are written.
    pub const ALL: [YScale; 2] = [YScale::Linear, YScale::Log];

    pub fn file_suffix(self) -> &'static str {
        match self {
            YScale::Linear => "linear",
            YScale::Log => "log",
        }
    }
}

/// One figure to produce: what to draw from a table and where to write it.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    /// Result file the table is loaded from
    pub source: PathBuf,
    /// Series identifiers, in legend order
    pub series: Vec<String>,
    pub title: String,
    /// Title of the log variant before the ` (Escala Log)` suffix; falls
    /// back to `title`
    pub log_title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    /// Y label of the log variant; falls back to `y_label`
    pub log_y_label: Option<String>,
    /// Output path without the `_linear.png` / `_log.png` suffix
    pub output_stem: PathBuf,
}

impl ChartSpec {
    /// `{output_stem}_{linear|log}.png`
    pub fn output_path(&self, scale: YScale) -> PathBuf {
        let mut name = self.output_stem.as_os_str().to_owned();
        name.push(format!("_{}.png", scale.file_suffix()));
        PathBuf::from(name)
    }

    pub fn title_for(&self, scale: YScale) -> String {
        match scale {
            YScale::Linear => self.title.clone(),
            YScale::Log => format!(
                "{} (Escala Log)",
                self.log_title.as_deref().unwrap_or(&self.title)
            ),
        }
    }

    pub fn y_label_for(&self, scale: YScale) -> &str {
        match scale {
            YScale::Linear => &self.y_label,
            YScale::Log => self.log_y_label.as_deref().unwrap_or(&self.y_label),
        }
    }
}

/// One structure's cost curve, ready to draw.
#[derive(Debug, Clone)]
pub struct SeriesLine {
    pub id: String,
    pub label: String,
    pub color: RGBColor,
    /// Contiguous runs of drawable points. The log variant splits a run
    /// wherever a non-positive value was dropped.
    pub segments: Vec<Vec<(f64, f64)>>,
    pub omitted: usize,
}

impl SeriesLine {
    pub fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.segments.iter().flatten()
    }
}

/// Everything needed to draw one image.
#[derive(Debug, Clone)]
pub struct PlotModel {
    pub scale: YScale,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub lines: Vec<SeriesLine>,
}

impl PlotModel {
    /// Resolve every requested series against the table.
    ///
    /// On a log axis, points with a cost of zero or less cannot be placed;
    /// they are dropped and the line is broken around them. A log chart with
    /// no positive value at all is rejected.
    pub fn build(
        table: &ResultTable,
        spec: &ChartSpec,
        labels: &SeriesLabelMap,
        scale: YScale,
    ) -> Result<Self, RenderError> {
        let sizes = table.sizes();
        let mut lines = Vec::with_capacity(spec.series.len());

        for (idx, id) in spec.series.iter().enumerate() {
            let values = table.series(id).ok_or_else(|| RenderError::UnknownSeries {
                series: id.clone(),
                available: table.series_ids(),
            })?;

            let mut segments = Vec::new();
            let mut current = Vec::new();
            let mut omitted = 0;

            for (&x, &y) in sizes.iter().zip(values.iter()) {
                if scale == YScale::Log && y <= 0.0 {
                    omitted += 1;
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    continue;
                }
                current.push((x, y));
            }
            if !current.is_empty() {
                segments.push(current);
            }

            if omitted > 0 {
                warn!(
                    series = %id,
                    omitted,
                    "dropping non-positive costs from log-scale chart"
                );
            }

            lines.push(SeriesLine {
                id: id.clone(),
                label: labels.label(id).to_string(),
                color: PALETTE[idx % PALETTE.len()],
                segments,
                omitted,
            });
        }

        let x_range = Self::x_range(&sizes);
        let y_range = Self::y_range(&lines, scale)
            .ok_or_else(|| RenderError::NoPositiveValues { title: spec.title.clone() })?;

        debug!(
            scale = scale.file_suffix(),
            x = ?x_range,
            y = ?y_range,
            "computed plot ranges"
        );

        Ok(Self {
            scale,
            title: spec.title_for(scale),
            x_label: spec.x_label.clone(),
            y_label: spec.y_label_for(scale).to_string(),
            x_range,
            y_range,
            lines,
        })
    }

    /// Legend entries in drawing order.
    pub fn legend_labels(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.label.as_str()).collect()
    }

    pub fn omitted_points(&self) -> usize {
        self.lines.iter().map(|l| l.omitted).sum()
    }

    fn x_range(sizes: &[f64]) -> Range<f64> {
        match (sizes.first(), sizes.last()) {
            (Some(&lo), Some(&hi)) if hi > lo => lo..hi,
            (Some(&x), _) => (x - 1.0)..(x + 1.0),
            _ => 0.0..1.0,
        }
    }

    fn y_range(lines: &[SeriesLine], scale: YScale) -> Option<Range<f64>> {
        let ys = lines.iter().flat_map(|l| l.points().map(|&(_, y)| y));

        match scale {
            YScale::Linear => {
                let max = ys.fold(0.0_f64, f64::max);
                let top = if max > 0.0 { max * 1.05 } else { 1.0 };
                Some(0.0..top)
            }
            YScale::Log => {
                let (lo, hi) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                    (lo.min(y), hi.max(y))
                });
                if lo.is_finite() {
                    Some((lo / 1.5)..(hi * 1.5))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[f64; 6]]) -> ResultTable {
        let ids = ["avl", "rb", "b1", "b5", "b10"];
        ResultTable::from_columns(
            rows.iter().map(|r| r[0]).collect(),
            ids.iter()
                .enumerate()
                .map(|(i, id)| (id.to_string(), rows.iter().map(|r| r[i + 1]).collect()))
                .collect(),
        )
        .unwrap()
    }

    fn spec(series: &[&str]) -> ChartSpec {
        ChartSpec {
            source: PathBuf::from("resultados_insercao_acumulado.csv"),
            series: series.iter().map(|s| s.to_string()).collect(),
            title: "Custo ACUMULADO de Inserção por Estrutura".into(),
            log_title: None,
            x_label: "Tamanho n".into(),
            y_label: "Custo acumulado (operações)".into(),
            log_y_label: Some("Custo acumulado (log)".into()),
            output_stem: PathBuf::from("out/grafico_insercao_acumulado"),
        }
    }

    fn line<'m>(model: &'m PlotModel, id: &str) -> Option<&'m SeriesLine> {
        model.lines.iter().find(|l| l.id == id)
    }

    fn sample() -> ResultTable {
        table(&[
            [10.0, 5.0, 5.0, 8.0, 4.0, 3.0],
            [20.0, 9.0, 9.0, 16.0, 7.0, 5.0],
        ])
    }

    #[test]
    fn output_names_derive_from_stem() {
        let spec = spec(&["avl"]);
        assert_eq!(
            spec.output_path(YScale::Linear),
            PathBuf::from("out/grafico_insercao_acumulado_linear.png")
        );
        assert_eq!(
            spec.output_path(YScale::Log),
            PathBuf::from("out/grafico_insercao_acumulado_log.png")
        );
    }

    #[test]
    fn log_title_uses_its_own_base() {
        let mut spec = spec(&["avl"]);
        assert_eq!(
            spec.title_for(YScale::Log),
            "Custo ACUMULADO de Inserção por Estrutura (Escala Log)"
        );

        spec.log_title = Some("Custo ACUMULADO de Inserção".into());
        assert_eq!(spec.title_for(YScale::Linear), "Custo ACUMULADO de Inserção por Estrutura");
        assert_eq!(spec.title_for(YScale::Log), "Custo ACUMULADO de Inserção (Escala Log)");
    }

    #[test]
    fn legend_follows_requested_order() {
        let labels = SeriesLabelMap::default();
        let model = PlotModel::build(
            &sample(),
            &spec(&["b10", "avl", "b1", "rb", "b5"]),
            &labels,
            YScale::Linear,
        )
        .unwrap();

        assert_eq!(
            model.legend_labels(),
            vec![
                "B-tree (ord. 10)",
                "AVL",
                "B-tree (ord. 1)",
                "Rubro-Negra",
                "B-tree (ord. 5)"
            ]
        );
        assert_eq!(model.lines[0].color, PALETTE[0]);
    }

    #[test]
    fn equal_costs_plot_at_equal_heights() {
        let labels = SeriesLabelMap::default();
        let model = PlotModel::build(
            &sample(),
            &spec(&["avl", "rb", "b1", "b5", "b10"]),
            &labels,
            YScale::Linear,
        )
        .unwrap();

        let avl: Vec<_> = line(&model, "avl").unwrap().points().copied().collect();
        let rb: Vec<_> = line(&model, "rb").unwrap().points().copied().collect();
        assert_eq!(avl, vec![(10.0, 5.0), (20.0, 9.0)]);
        assert_eq!(avl, rb);
        assert_eq!(model.x_range, 10.0..20.0);
        assert_eq!(model.y_range.start, 0.0);
        assert!((model.y_range.end - 16.8).abs() < 1e-9);
    }

    #[test]
    fn unknown_series_is_rejected() {
        let labels = SeriesLabelMap::default();
        let err = PlotModel::build(&sample(), &spec(&["avl", "splay"]), &labels, YScale::Linear)
            .unwrap_err();

        match err {
            RenderError::UnknownSeries { series, available } => {
                assert_eq!(series, "splay");
                assert_eq!(available.len(), 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn log_scale_drops_zero_costs_and_splits_line() {
        let labels = SeriesLabelMap::default();
        let data = table(&[
            [1.0, 0.0, 1.0, 1.0, 1.0, 1.0],
            [2.0, 4.0, 2.0, 2.0, 2.0, 2.0],
            [3.0, 0.0, 3.0, 3.0, 3.0, 3.0],
            [4.0, 8.0, 4.0, 4.0, 4.0, 4.0],
            [5.0, 9.0, 5.0, 5.0, 5.0, 5.0],
        ]);

        let model = PlotModel::build(&data, &spec(&["avl", "rb"]), &labels, YScale::Log).unwrap();
        let avl = line(&model, "avl").unwrap();
        assert_eq!(avl.omitted, 2);
        assert_eq!(
            avl.segments,
            vec![vec![(2.0, 4.0)], vec![(4.0, 8.0), (5.0, 9.0)]]
        );
        assert_eq!(model.omitted_points(), 2);
        assert!((model.y_range.start - 1.0 / 1.5).abs() < 1e-9);
        assert!((model.y_range.end - 13.5).abs() < 1e-9);
        assert_eq!(model.title, "Custo ACUMULADO de Inserção por Estrutura (Escala Log)");
        assert_eq!(model.y_label, "Custo acumulado (log)");
    }

    #[test]
    fn linear_scale_keeps_zero_costs() {
        let labels = SeriesLabelMap::default();
        let data = table(&[
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ]);

        let model = PlotModel::build(&data, &spec(&["avl"]), &labels, YScale::Linear).unwrap();
        assert_eq!(line(&model, "avl").unwrap().points().count(), 2);
        assert_eq!(model.y_range, 0.0..1.0);
    }

    #[test]
    fn log_scale_without_positive_costs_is_an_error() {
        let labels = SeriesLabelMap::default();
        let data = table(&[
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ]);

        let err = PlotModel::build(&data, &spec(&["avl", "rb"]), &labels, YScale::Log).unwrap_err();
        assert!(matches!(err, RenderError::NoPositiveValues { .. }));
    }

    #[test]
    fn single_row_gets_padded_x_range() {
        let labels = SeriesLabelMap::default();
        let data = table(&[[100.0, 1.0, 1.0, 1.0, 1.0, 1.0]]);

        let model = PlotModel::build(&data, &spec(&["avl"]), &labels, YScale::Linear).unwrap();
        assert_eq!(model.x_range, 99.0..101.0);
    }
}
