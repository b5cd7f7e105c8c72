//! Run Orchestrator Module
//! Builds the chart list for a dataset variant, loads each result file once
//! and renders every chart in declared order.
//!
//! Failure policy: a chart that fails to load or render is recorded and the
//! run moves on to the next one. The caller inspects the `RunReport`.

use crate::charts::{ChartSpec, RenderedChart, StaticChartRenderer};
use crate::config::{RunConfig, Variant};
use crate::data::{DataLoader, ResultTable};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Benchmark workload, one chart each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    Insertion,
    Removal,
}

impl Workload {
    pub const ALL: [Workload; 2] = [Workload::Insertion, Workload::Removal];

    pub fn file_tag(self) -> &'static str {
        match self {
            Workload::Insertion => "insercao",
            Workload::Removal => "remocao",
        }
    }

    /// Short title used as the base of the log chart's title.
    fn log_title(self, variant: Variant) -> String {
        match self {
            Workload::Insertion => format!("Custo {} de Inserção", variant.title_word()),
            Workload::Removal => format!("Custo {} de Remoção", variant.title_word()),
        }
    }

    fn title(self, variant: Variant) -> String {
        match self {
            Workload::Insertion => {
                format!("Custo {} de Inserção por Estrutura", variant.title_word())
            }
            Workload::Removal => {
                format!("Custo {} de Remoção (Esvaziamento)", variant.title_word())
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Load(#[from] crate::data::LoadError),
    #[error(transparent)]
    Render(#[from] crate::charts::RenderError),
    #[error("{path}: source failed to load earlier: {message}")]
    SourceUnavailable { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Load,
    Render,
}

/// One chart that could not be produced.
#[derive(Debug, Clone, Serialize)]
pub struct SpecFailure {
    pub chart: PathBuf,
    pub source: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of a run: images written, sources read and charts that failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub loaded: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<SpecFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, spec: &ChartSpec, outcome: Result<RenderedChart, ChartError>) {
        match outcome {
            Ok(rendered) => {
                info!(chart = %spec.output_stem.display(), "chart complete");
                self.written.push(rendered.linear);
                self.written.push(rendered.log);
            }
            Err(err) => {
                warn!(chart = %spec.output_stem.display(), error = %err, "chart failed");
                let kind = match &err {
                    ChartError::Render(_) => FailureKind::Render,
                    ChartError::Load(_) | ChartError::SourceUnavailable { .. } => {
                        FailureKind::Load
                    }
                };
                self.failures.push(SpecFailure {
                    chart: spec.output_stem.clone(),
                    source: spec.source.clone(),
                    kind,
                    message: err.to_string(),
                });
            }
        }
    }
}

pub struct Orchestrator<'a> {
    config: &'a RunConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Insertion and removal charts for the configured variant.
    pub fn chart_specs(&self) -> Vec<ChartSpec> {
        let variant = self.config.variant;
        let tag = variant.file_tag();
        let y_label = format!("Custo {} (operações)", tag);

        Workload::ALL
            .iter()
            .map(|&workload| ChartSpec {
                source: self
                    .config
                    .data_dir
                    .join(format!("resultados_{}_{}.csv", workload.file_tag(), tag)),
                series: self.config.series.clone(),
                title: workload.title(variant),
                log_title: Some(workload.log_title(variant)),
                x_label: "Tamanho n".to_string(),
                y_label: y_label.clone(),
                log_y_label: Some(format!("Custo {} (log)", tag)),
                output_stem: self.config.out_dir.join(format!(
                    "{}_{}_{}",
                    self.config.prefix,
                    workload.file_tag(),
                    tag
                )),
            })
            .collect()
    }

    /// Render the configured variant's charts.
    pub fn run(&self) -> RunReport {
        self.run_specs(&self.chart_specs())
    }

    /// Render `specs` one at a time. Each distinct source file is read at
    /// most once; a file that failed to load fails every chart using it.
    pub fn run_specs(&self, specs: &[ChartSpec]) -> RunReport {
        let loader = DataLoader::new(&self.config.size_columns(), &self.config.series);
        let renderer = StaticChartRenderer::new(&self.config.labels, self.config.image);

        let mut tables: HashMap<PathBuf, Result<ResultTable, String>> = HashMap::new();
        let mut report = RunReport::default();

        for spec in specs {
            if !tables.contains_key(&spec.source) {
                match loader.load_csv(&spec.source) {
                    Ok(table) => {
                        report.loaded.push(spec.source.clone());
                        tables.insert(spec.source.clone(), Ok(table));
                    }
                    Err(err) => {
                        tables.insert(spec.source.clone(), Err(err.to_string()));
                        report.record(spec, Err(ChartError::Load(err)));
                        continue;
                    }
                }
            }

            let outcome = match &tables[&spec.source] {
                Ok(table) => renderer.render(table, spec).map_err(ChartError::from),
                Err(message) => Err(ChartError::SourceUnavailable {
                    path: spec.source.clone(),
                    message: message.clone(),
                }),
            };
            report.record(spec, outcome);
        }

        report
    }
}
