//! Clap-free settings for the fill, cleanup and batch pipelines.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use docufill_edit::{CleanupOptions, FillOptions};

/// What a batch does to each document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchMode {
    #[default]
    Fill,
    Cleanup,
}

/// Settings for a single-document fill.
#[derive(Debug, Clone, Default)]
pub struct FillSettings {
    pub input: String,

    /// Where the filled document is persisted. `None` overwrites the input.
    pub output: Option<String>,

    /// Fill a copy and report, but persist nothing.
    pub dry_run: bool,

    pub options: FillOptions,
}

impl FillSettings {
    pub fn output_key(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

/// Settings for a single-document cleanup.
#[derive(Debug, Clone, Default)]
pub struct CleanupSettings {
    pub input: String,
    pub output: Option<String>,
    pub options: CleanupOptions,
}

impl CleanupSettings {
    pub fn output_key(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

/// Settings for a batch over many documents.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub inputs: Vec<String>,

    /// Outputs go here, mirroring the inputs' relative layout. `None` overwrites inputs.
    pub out_dir: Option<Utf8PathBuf>,

    /// Concurrent documents. Zero is treated as one.
    pub workers: usize,

    pub mode: BatchMode,
    pub fill: FillOptions,
    pub cleanup: CleanupOptions,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            out_dir: None,
            workers: 1,
            mode: BatchMode::default(),
            fill: FillOptions::default(),
            cleanup: CleanupOptions::default(),
        }
    }
}

impl BatchSettings {
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    /// Output key for every input, in input order.
    ///
    /// Under `out_dir` each input keeps its path relative to the deepest directory all inputs
    /// share, so `a/x.json` and `b/x.json` land apart. An input that cannot be expressed
    /// below that directory falls back to its file name.
    pub fn output_keys(&self) -> Vec<String> {
        let Some(dir) = &self.out_dir else {
            return self.inputs.clone();
        };
        let base = common_parent(&self.inputs);
        self.inputs
            .iter()
            .map(|input| dir.join(relative_to(Utf8Path::new(input), &base)).to_string())
            .collect()
    }
}

fn common_parent(inputs: &[String]) -> Utf8PathBuf {
    let mut shared: Option<Vec<Utf8Component<'_>>> = None;
    for input in inputs {
        let parent: Vec<_> = Utf8Path::new(input)
            .parent()
            .map(|p| p.components().collect())
            .unwrap_or_default();
        shared = Some(match shared {
            None => parent,
            Some(prefix) => prefix
                .into_iter()
                .zip(parent)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }
    shared.unwrap_or_default().into_iter().collect()
}

fn relative_to<'a>(input: &'a Utf8Path, base: &Utf8Path) -> &'a str {
    match input.strip_prefix(base) {
        Ok(rel)
            if !rel.as_str().is_empty()
                && rel.components().all(|c| matches!(c, Utf8Component::Normal(_))) =>
        {
            rel.as_str()
        }
        _ => input.file_name().unwrap_or(input.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_means_one() {
        let settings = BatchSettings {
            workers: 0,
            ..BatchSettings::default()
        };
        assert_eq!(settings.effective_workers(), 1);
    }

    fn batch(inputs: &[&str], out_dir: Option<&str>) -> BatchSettings {
        BatchSettings {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            out_dir: out_dir.map(Utf8PathBuf::from),
            ..BatchSettings::default()
        }
    }

    #[test]
    fn output_keys_use_file_name_under_out_dir() {
        let settings = batch(&["in/a.json", "in/b.json"], Some("filled"));
        assert_eq!(settings.output_keys(), vec!["filled/a.json", "filled/b.json"]);

        let in_place = batch(&["in/a.json"], None);
        assert_eq!(in_place.output_keys(), vec!["in/a.json"]);
    }

    #[test]
    fn same_file_name_in_different_dirs_keeps_outputs_apart() {
        let settings = batch(&["docs/a/x.json", "docs/b/x.json"], Some("out"));
        assert_eq!(settings.output_keys(), vec!["out/a/x.json", "out/b/x.json"]);
    }

    #[test]
    fn nested_inputs_keep_their_depth() {
        let settings = batch(&["in/x.json", "in/sub/x.json", "top.json"], Some("out"));
        assert_eq!(
            settings.output_keys(),
            vec!["out/in/x.json", "out/in/sub/x.json", "out/top.json"]
        );
    }

    #[test]
    fn parent_dir_inputs_fall_back_to_file_name() {
        let settings = batch(&["../shared/a.json", "local/b.json"], Some("out"));
        assert_eq!(settings.output_keys(), vec!["out/a.json", "out/local/b.json"]);
    }

    #[test]
    fn single_document_output_defaults_to_input() {
        let settings = FillSettings {
            input: "a.json".to_string(),
            ..FillSettings::default()
        };
        assert_eq!(settings.output_key(), "a.json");
    }
}
