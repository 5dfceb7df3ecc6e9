//! Configuration file loading for docufill.
//!
//! Discovers and loads `docufill.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use docufill_core::{CleanupOptions, FillOptions};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "docufill.toml";

/// Top-level configuration from docufill.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocufillConfig {
    pub annotations: AnnotationsConfig,
    pub fill: FillConfig,
    pub cleanup: CleanupConfig,
    pub batch: BatchConfig,
}

/// Annotations section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnotationsConfig {
    /// Record an annotation for every filled placeholder.
    pub enabled: bool,

    /// Author written on each annotation.
    pub author: String,
}

impl Default for AnnotationsConfig {
    fn default() -> Self {
        let defaults = FillOptions::default();
        Self {
            enabled: defaults.annotate,
            author: defaults.author,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Colour painted on new content, e.g. `FF0000`.
    pub highlight_color: Option<String>,

    pub merge_cell_paragraphs: bool,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            highlight_color: None,
            merge_cell_paragraphs: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Colour restored on runs inside annotated spans.
    pub neutral_color: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            neutral_color: CleanupOptions::default().neutral_color,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// Discover the docufill.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a docufill.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<DocufillConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<DocufillConfig> {
    let config: DocufillConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load an explicit config file, or discover one in `dir`, or fall back to defaults.
///
/// An explicit path that does not exist is an error; a missing discovered file is not.
pub fn load_or_default(
    dir: &Utf8Path,
    explicit: Option<&Utf8Path>,
) -> anyhow::Result<DocufillConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(DocufillConfig::default()),
    }
}

/// Fill-related CLI flags. `None` and `false` leave the config file value in place.
#[derive(Debug, Clone, Default)]
pub struct FillArgsOverride {
    pub no_annotate: bool,
    pub author: Option<String>,
    pub highlight_color: Option<String>,
    pub no_merge_cells: bool,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: DocufillConfig,
}

impl ConfigMerger {
    pub fn new(config: DocufillConfig) -> Self {
        Self { config }
    }

    /// Merge with fill CLI arguments.
    pub fn fill_options(&self, cli: &FillArgsOverride) -> FillOptions {
        FillOptions {
            author: cli
                .author
                .clone()
                .unwrap_or_else(|| self.config.annotations.author.clone()),
            annotate: self.config.annotations.enabled && !cli.no_annotate,
            highlight_color: cli
                .highlight_color
                .clone()
                .or_else(|| self.config.fill.highlight_color.clone()),
            merge_cell_paragraphs: self.config.fill.merge_cell_paragraphs && !cli.no_merge_cells,
        }
    }

    /// Merge with cleanup CLI arguments.
    pub fn cleanup_options(
        &self,
        cli_neutral_color: Option<&str>,
        keep_annotations: bool,
        keep_placeholders: bool,
    ) -> CleanupOptions {
        CleanupOptions {
            neutral_color: cli_neutral_color
                .map(str::to_string)
                .unwrap_or_else(|| self.config.cleanup.neutral_color.clone()),
            strip_annotations: !keep_annotations,
            unwrap_placeholders: !keep_placeholders,
        }
    }

    pub fn workers(&self, cli_workers: Option<usize>) -> usize {
        cli_workers.unwrap_or(self.config.batch.workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let contents = r#"
[annotations]
enabled = true
author = "records office"

[fill]
highlight_color = "FF0000"
merge_cell_paragraphs = false

[cleanup]
neutral_color = "333333"

[batch]
workers = 4
"#;

        let config = parse_config(contents).unwrap();
        assert!(config.annotations.enabled);
        assert_eq!(config.annotations.author, "records office");
        assert_eq!(config.fill.highlight_color.as_deref(), Some("FF0000"));
        assert!(!config.fill.merge_cell_paragraphs);
        assert_eq!(config.cleanup.neutral_color, "333333");
        assert_eq!(config.batch.workers, 4);
    }

    #[test]
    fn test_parse_empty_config_uses_library_defaults() {
        let config = parse_config("").unwrap();
        let merged = ConfigMerger::new(config).fill_options(&FillArgsOverride::default());
        assert_eq!(merged, FillOptions::default());
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        let err = parse_config("[batch]\nworkers = \"many\"\n").unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_cli_overrides_fill_config() {
        let config = parse_config(
            r#"
[annotations]
author = "config author"
[fill]
highlight_color = "00FF00"
"#,
        )
        .unwrap();

        let merged = ConfigMerger::new(config).fill_options(&FillArgsOverride {
            no_annotate: true,
            author: Some("cli author".to_string()),
            highlight_color: Some("FF0000".to_string()),
            no_merge_cells: true,
        });

        assert!(!merged.annotate);
        assert_eq!(merged.author, "cli author");
        assert_eq!(merged.highlight_color.as_deref(), Some("FF0000"));
        assert!(!merged.merge_cell_paragraphs);
    }

    #[test]
    fn test_config_disabling_annotations_wins_over_absent_flag() {
        let config = parse_config("[annotations]\nenabled = false\n").unwrap();
        let merged = ConfigMerger::new(config).fill_options(&FillArgsOverride::default());
        assert!(!merged.annotate);
    }

    #[test]
    fn test_cleanup_and_workers_merge() {
        let config = parse_config("[cleanup]\nneutral_color = \"111111\"\n[batch]\nworkers = 3\n")
            .unwrap();
        let merger = ConfigMerger::new(config);

        let opts = merger.cleanup_options(None, false, true);
        assert_eq!(opts.neutral_color, "111111");
        assert!(opts.strip_annotations);
        assert!(!opts.unwrap_placeholders);
        assert_eq!(merger.cleanup_options(Some("222222"), false, false).neutral_color, "222222");

        assert_eq!(merger.workers(None), 3);
        assert_eq!(merger.workers(Some(8)), 8);
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let missing = root.join("elsewhere.toml");
        assert!(load_or_default(&root, Some(&missing)).is_err());

        let cfg = load_or_default(&root, None).expect("load default");
        assert_eq!(cfg.batch.workers, 1);
        assert!(cfg.annotations.enabled);
    }
}
