use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "rollup.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RollupConfig {
    #[serde(default)]
    pub columns: ColumnVocabulary,
    #[serde(default)]
    pub units: UnitConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Header words used to infer column roles. Substring lists match anywhere in
/// the lower-cased header, exact lists must equal it.
#[derive(Debug, Deserialize, Clone)]
pub struct ColumnVocabulary {
    #[serde(default = "default_date_keywords")]
    pub date_keywords: Vec<String>,
    #[serde(default = "default_length_keywords")]
    pub length_keywords: Vec<String>,
    #[serde(default = "default_length_exact")]
    pub length_exact: Vec<String>,
    #[serde(default = "default_length_priority")]
    pub length_priority: Vec<String>,
}

impl Default for ColumnVocabulary {
    fn default() -> Self {
        Self {
            date_keywords: default_date_keywords(),
            length_keywords: default_length_keywords(),
            length_exact: default_length_exact(),
            length_priority: default_length_priority(),
        }
    }
}

fn default_date_keywords() -> Vec<String> {
    to_strings(&["datum", "dne", "kdy", "termín", "termin", "date"])
}
fn default_length_keywords() -> Vec<String> {
    to_strings(&[
        "délka", "delka", "metr", "metráž", "meter", "length", "footage",
    ])
}
fn default_length_exact() -> Vec<String> {
    to_strings(&["m", "bm"])
}
fn default_length_priority() -> Vec<String> {
    to_strings(&["zkontrolováno", "zkontrolovano"])
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnitConfig {
    #[serde(default = "default_unspecified")]
    pub unspecified: String,
    #[serde(default = "default_unknown_title")]
    pub unknown_title: String,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            unspecified: default_unspecified(),
            unknown_title: default_unknown_title(),
        }
    }
}

impl UnitConfig {
    /// Units that never get their own statistics entry.
    pub fn is_unassigned(&self, unit: &str) -> bool {
        unit.is_empty() || unit == self.unspecified
    }
}

fn default_unspecified() -> String {
    "Neurčeno".to_string()
}
fn default_unknown_title() -> String {
    "Neznámé středisko".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlanConfig {
    #[serde(default = "default_near_target_ratio")]
    pub near_target_ratio: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            near_target_ratio: default_near_target_ratio(),
        }
    }
}

fn default_near_target_ratio() -> f64 {
    0.8
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".cache/rollup/rollup.sqlite")
}

/// Loads the explicit config path, or `rollup.toml` from the working
/// directory when present, or the built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<RollupConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.exists() {
                load_config(fallback)
            } else {
                Ok(RollupConfig::default())
            }
        }
    }
}

pub fn load_config(path: &Path) -> Result<RollupConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("failed to load config file: {}", path.display()))?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<RollupConfig> {
    let config: RollupConfig = toml::from_str(content).context("failed to parse config toml")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &RollupConfig) -> Result<()> {
    let ratio = config.plan.near_target_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        bail!("plan.near_target_ratio must be in (0.0, 1.0], got {ratio}");
    }
    if config.columns.date_keywords.is_empty() {
        bail!("columns.date_keywords must not be empty");
    }
    if config.columns.length_keywords.is_empty() && config.columns.length_exact.is_empty() {
        bail!("columns.length_keywords and columns.length_exact must not both be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").expect("empty config should parse");
        assert_eq!(config.units.unspecified, "Neurčeno");
        assert_eq!(config.columns.length_exact, vec!["m", "bm"]);
        assert!((config.plan.near_target_ratio - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let raw = r#"
            [columns]
            date_keywords = ["inspected"]

            [store]
            path = "/tmp/rollup.sqlite"
        "#;
        let config = parse_config(raw).expect("partial config should parse");
        assert_eq!(config.columns.date_keywords, vec!["inspected"]);
        assert!(config.columns.length_keywords.contains(&"délka".to_string()));
        assert_eq!(config.store.path, PathBuf::from("/tmp/rollup.sqlite"));
    }

    #[test]
    fn out_of_range_ratio_is_rejected() {
        let err = parse_config("[plan]\nnear_target_ratio = 1.5\n")
            .expect_err("ratio above one should fail validation");
        assert!(err.to_string().contains("near_target_ratio"));
    }

    #[test]
    fn unassigned_units_cover_sentinel_and_empty() {
        let units = UnitConfig::default();
        assert!(units.is_unassigned(""));
        assert!(units.is_unassigned("Neurčeno"));
        assert!(!units.is_unassigned("Most"));
    }
}
