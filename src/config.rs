//! Run Configuration Module
//! Series labels, figure geometry and dataset selection, with JSON overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Series drawn by default, in legend order.
pub const DEFAULT_SERIES: [(&str, &str); 5] = [
    ("avl", "AVL"),
    ("rb", "Rubro-Negra"),
    ("b1", "B-tree (ord. 1)"),
    ("b5", "B-tree (ord. 5)"),
    ("b10", "B-tree (ord. 10)"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Benchmark dataset flavour. Both produce an insertion and a removal chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Running totals over the full size sweep
    Accumulated,
    /// Costs recorded at discrete sampled sizes
    Sampled,
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Accumulated
    }
}

impl Variant {
    /// Suffix used in source and output file names.
    pub fn file_tag(self) -> &'static str {
        match self {
            Variant::Accumulated => "acumulado",
            Variant::Sampled => "amostrado",
        }
    }

    /// Word used in chart titles and axis labels.
    pub fn title_word(self) -> &'static str {
        match self {
            Variant::Accumulated => "ACUMULADO",
            Variant::Sampled => "AMOSTRADO",
        }
    }
}

/// Display label per series identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesLabelMap(BTreeMap<String, String>);

impl Default for SeriesLabelMap {
    fn default() -> Self {
        Self(
            DEFAULT_SERIES
                .iter()
                .map(|(id, label)| (id.to_string(), label.to_string()))
                .collect(),
        )
    }
}

impl SeriesLabelMap {
    /// Label for a series; unknown identifiers are shown as-is.
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.0.get(id).map(String::as_str).unwrap_or(id)
    }
}

/// Output figure geometry. Sizes are in inches, like a matplotlib figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width_in: 12.0,
            height_in: 6.0,
            dpi: 300,
        }
    }
}

impl ImageConfig {
    /// Pixel dimensions of the rendered image.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }

    /// Convert a typographic point size to pixels at this DPI.
    pub fn pt(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}

/// Everything one run needs. Every field can be overridden from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub variant: Variant,
    pub series: Vec<String>,
    pub labels: SeriesLabelMap,
    pub size_column: String,
    pub size_aliases: Vec<String>,
    pub image: ImageConfig,
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub prefix: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            series: DEFAULT_SERIES.iter().map(|(id, _)| id.to_string()).collect(),
            labels: SeriesLabelMap::default(),
            size_column: "size".to_string(),
            size_aliases: vec!["tamanho".to_string()],
            image: ImageConfig::default(),
            data_dir: PathBuf::from("."),
            out_dir: PathBuf::from("."),
            prefix: "grafico".to_string(),
        }
    }
}

impl RunConfig {
    /// Load a config file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.series.is_empty() {
            return Err(ConfigError::Invalid("series list is empty".into()));
        }
        if self.size_column.trim().is_empty() {
            return Err(ConfigError::Invalid("size column name is empty".into()));
        }
        if self.image.dpi == 0 || self.image.width_in <= 0.0 || self.image.height_in <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "image geometry must be positive, got {:?}",
                self.image
            )));
        }
        Ok(())
    }

    /// Accepted names for the x-axis column, preferred name first.
    pub fn size_columns(&self) -> Vec<&str> {
        std::iter::once(self.size_column.as_str())
            .chain(self.size_aliases.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_geometry_matches_300_dpi_figure() {
        let image = ImageConfig::default();
        assert_eq!(image.pixel_size(), (3600, 1800));
        assert!((image.pt(72.0) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_label_falls_back_to_identifier() {
        let labels = SeriesLabelMap::default();
        assert_eq!(labels.label("b5"), "B-tree (ord. 5)");
        assert_eq!(labels.label("splay"), "splay");
    }

    #[test]
    fn json_overrides_keep_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "variant": "sampled", "prefix": "fig", "image": {{ "dpi": 100 }} }}"#
        )
        .unwrap();

        let config = RunConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.variant, Variant::Sampled);
        assert_eq!(config.prefix, "fig");
        assert_eq!(config.image.dpi, 100);
        assert_eq!(config.image.width_in, 12.0);
        assert_eq!(config.series, vec!["avl", "rb", "b1", "b5", "b10"]);
        assert_eq!(config.size_columns(), vec!["size", "tamanho"]);
    }

    #[test]
    fn empty_series_list_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "series": [] }}"#).unwrap();

        let err = RunConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = RunConfig::from_json_file(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
