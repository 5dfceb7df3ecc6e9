//! Fill, cleanup and batch pipelines.
//!
//! These entry points are I/O-agnostic: documents are opened and persisted through
//! [`DocumentStore`], artifacts go through [`WritePort`].

use crate::ports::{DocumentStore, WritePort};
use crate::settings::{BatchMode, BatchSettings, CleanupSettings, FillSettings};
use anyhow::Context;
use camino::Utf8Path;
use diffy::PatchFormatter;
use docufill_edit::{cleanup_document, fill_document, CancelToken, DocumentError, FillOptions};
use docufill_render::{render_batch_md, render_fill_md};
use docufill_tree::DocTree;
use docufill_types::{
    BatchSummary, CleanupReport, DocumentOutcome, DocumentStatus, FillData, FillReport, Scope,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Error type for pipeline results.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Opening or persisting the document failed.
    #[error("{0:#}")]
    Io(anyhow::Error),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Document(err) if err.is_cancelled())
    }
}

/// Outcome of `run_fill`.
#[derive(Debug)]
pub struct FillOutcome {
    pub report: FillReport,

    /// Unified diff of visible text; only produced for dry runs.
    pub preview: Option<String>,
    pub persisted: bool,
}

/// Fill one document and persist it, unless this is a dry run or the fill was cancelled.
pub fn run_fill(
    settings: &FillSettings,
    data: &FillData,
    store: &dyn DocumentStore,
    cancel: &CancelToken,
) -> Result<FillOutcome, PipelineError> {
    let original = store.open(&settings.input).map_err(PipelineError::Io)?;
    let mut tree = original.clone();
    let report = fill_document(&mut tree, data, &settings.options, cancel)?;

    if settings.dry_run {
        debug!(input = %settings.input, "dry run, not persisting");
        return Ok(FillOutcome {
            report,
            preview: Some(render_text_diff(&original, &tree)),
            persisted: false,
        });
    }

    store
        .persist(settings.output_key(), &tree)
        .map_err(PipelineError::Io)?;
    info!(
        input = %settings.input,
        output = settings.output_key(),
        mutated = report.mutated,
        "document filled"
    );

    Ok(FillOutcome {
        report,
        preview: None,
        persisted: true,
    })
}

/// Strip annotations and unwrap placeholders, then persist once.
pub fn run_cleanup(
    settings: &CleanupSettings,
    store: &dyn DocumentStore,
) -> Result<CleanupReport, PipelineError> {
    let mut tree = store.open(&settings.input).map_err(PipelineError::Io)?;
    let report = cleanup_document(&mut tree, &settings.options)?;
    store
        .persist(settings.output_key(), &tree)
        .map_err(PipelineError::Io)?;
    info!(
        input = %settings.input,
        output = settings.output_key(),
        "document cleaned"
    );
    Ok(report)
}

/// Fill a copy of the stored document and diff its visible text, scope by scope.
///
/// The stored document is never touched.
pub fn preview_fill(
    input: &str,
    data: &FillData,
    options: &FillOptions,
    store: &dyn DocumentStore,
) -> Result<String, PipelineError> {
    let original = store.open(input).map_err(PipelineError::Io)?;
    let mut filled = original.clone();
    fill_document(&mut filled, data, options, &CancelToken::new())?;
    Ok(render_text_diff(&original, &filled))
}

fn scope_label(scope: Scope, index: usize) -> String {
    match scope {
        Scope::Body => "body".to_string(),
        Scope::Header | Scope::Footer => format!("{scope}{index}"),
    }
}

fn labelled_texts(tree: &DocTree) -> Vec<(String, String)> {
    let mut headers = 0;
    let mut footers = 0;
    tree.scope_roots()
        .into_iter()
        .map(|(scope, root)| {
            let index = match scope {
                Scope::Body => 0,
                Scope::Header => {
                    headers += 1;
                    headers
                }
                Scope::Footer => {
                    footers += 1;
                    footers
                }
            };
            (scope_label(scope, index), tree.visible_text(root))
        })
        .collect()
}

fn render_text_diff(before: &DocTree, after: &DocTree) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();
    let after_texts = labelled_texts(after);

    for (label, old) in labelled_texts(before) {
        let new = after_texts
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, t)| t.as_str())
            .unwrap_or_default();
        if old == new {
            continue;
        }

        out.push_str(&format!("--- a/{label}\n+++ b/{label}\n"));
        let patch = diffy::create_patch(&old, new);
        out.push_str(&formatter.fmt_patch(&patch).to_string());
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}

/// Run fill or cleanup over every input with up to `workers` documents in flight.
///
/// Each worker opens its own tree, so nothing mutable is shared between documents. Failures are
/// recorded per document and never stop the batch. Cancellation is checked before each document;
/// documents not yet started are reported as cancelled.
pub fn run_batch(
    settings: &BatchSettings,
    data: &FillData,
    store: &(dyn DocumentStore + Sync),
    cancel: &CancelToken,
) -> BatchSummary {
    let total = settings.inputs.len();
    let workers = settings.effective_workers().min(total.max(1));
    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<DocumentOutcome>>> = Mutex::new(vec![None; total]);
    let outputs = settings.output_keys();
    let collisions = earlier_owners(&settings.inputs, &outputs);

    info!(documents = total, workers, "starting batch");

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let (Some(input), Some(output)) =
                        (settings.inputs.get(index), outputs.get(index))
                    else {
                        break;
                    };
                    let outcome = match &collisions[index] {
                        Some(earlier) => collided(input, output, earlier),
                        None => process_document(settings, input, output, data, store, cancel),
                    };
                    if let Ok(mut slots) = slots.lock() {
                        slots[index] = Some(outcome);
                    }
                }
            });
        }
    });

    let slots = slots.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    let documents = slots
        .into_iter()
        .zip(settings.inputs.iter().zip(&outputs))
        .map(|(slot, (input, output))| {
            slot.unwrap_or_else(|| DocumentOutcome {
                input: input.clone(),
                output: output.clone(),
                status: DocumentStatus::Failed {
                    error: "worker exited before recording a result".to_string(),
                },
                warnings: vec![],
            })
        })
        .collect();

    let summary = BatchSummary {
        documents,
        ..BatchSummary::default()
    };
    info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        cancelled = summary.cancelled(),
        "batch finished"
    );
    summary
}

/// For each input, the earlier input already writing to the same output, if any.
fn earlier_owners(inputs: &[String], outputs: &[String]) -> Vec<Option<String>> {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    inputs
        .iter()
        .zip(outputs)
        .map(|(input, output)| match owners.get(output.as_str()) {
            Some(&earlier) => Some(earlier.to_string()),
            None => {
                owners.insert(output.as_str(), input.as_str());
                None
            }
        })
        .collect()
}

fn collided(input: &str, output: &str, earlier: &str) -> DocumentOutcome {
    warn!(input, output, earlier, "output already claimed, skipping document");
    DocumentOutcome {
        input: input.to_string(),
        output: output.to_string(),
        status: DocumentStatus::Failed {
            error: format!("output {output} already produced by {earlier}"),
        },
        warnings: vec![],
    }
}

fn process_document(
    settings: &BatchSettings,
    input: &str,
    output: &str,
    data: &FillData,
    store: &dyn DocumentStore,
    cancel: &CancelToken,
) -> DocumentOutcome {
    let mut outcome = DocumentOutcome {
        input: input.to_string(),
        output: output.to_string(),
        status: DocumentStatus::Cancelled,
        warnings: vec![],
    };
    if cancel.is_cancelled() {
        return outcome;
    }

    let result = match settings.mode {
        BatchMode::Fill => run_fill(
            &FillSettings {
                input: input.to_string(),
                output: Some(output.to_string()),
                dry_run: false,
                options: settings.fill.clone(),
            },
            data,
            store,
            cancel,
        )
        .map(|filled| {
            (
                DocumentStatus::Filled {
                    mutated: filled.report.mutated,
                },
                filled.report.warnings,
            )
        }),
        BatchMode::Cleanup => run_cleanup(
            &CleanupSettings {
                input: input.to_string(),
                output: Some(output.to_string()),
                options: settings.cleanup.clone(),
            },
            store,
        )
        .map(|report| {
            (
                DocumentStatus::Cleaned {
                    annotations_removed: report.annotations_removed,
                    placeholders_unwrapped: report.placeholders_unwrapped,
                },
                report.warnings,
            )
        }),
    };

    match result {
        Ok((status, warnings)) => {
            outcome.status = status;
            outcome.warnings = warnings;
        }
        Err(err) if err.is_cancelled() => {
            debug!(input, "document cancelled mid-fill, not persisted");
        }
        Err(err) => {
            warn!(input, error = %err, "document failed");
            outcome.status = DocumentStatus::Failed {
                error: err.to_string(),
            };
        }
    }
    outcome
}

/// Write `summary.json` and `summary.md` to the output directory.
pub fn write_batch_artifacts(
    summary: &BatchSummary,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let json = serde_json::to_string_pretty(summary).context("serialize batch summary")?;
    writer.write_file(&out_dir.join("summary.json"), json.as_bytes())?;

    let md = render_batch_md(summary);
    writer.write_file(&out_dir.join("summary.md"), md.as_bytes())?;

    Ok(())
}

/// Write `report.json` and `report.md` for a single fill.
pub fn write_fill_artifacts(
    report: &FillReport,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let json = serde_json::to_string_pretty(report).context("serialize fill report")?;
    writer.write_file(&out_dir.join("report.json"), json.as_bytes())?;

    let md = render_fill_md(report);
    writer.write_file(&out_dir.join("report.md"), md.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDocumentStore;
    use docufill_tree::{ContainerKind, PlaceholderProps};
    use docufill_types::StructuralKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn template(value: &str) -> DocTree {
        let mut tree = DocTree::new();
        let para = tree.add_paragraph(tree.body()).unwrap();
        let (_, c) = tree
            .add_placeholder(
                para,
                PlaceholderProps::new("name", StructuralKind::Inline),
                ContainerKind::Inline,
            )
            .unwrap();
        tree.add_run(c, value, None).unwrap();
        tree
    }

    #[derive(Default)]
    struct MemWritePort {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl WritePort for MemWritePort {
        fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.as_str().replace('\\', "/"), contents.to_vec());
            Ok(())
        }

        fn create_dir_all(&self, _path: &Utf8Path) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn dry_run_previews_without_persisting() {
        let store = InMemoryDocumentStore::new().with("a", template("old"));
        let settings = FillSettings {
            input: "a".to_string(),
            output: Some("b".to_string()),
            dry_run: true,
            ..FillSettings::default()
        };
        let outcome = run_fill(
            &settings,
            &FillData::new().with("name", "new"),
            &store,
            &CancelToken::new(),
        )
        .unwrap();

        assert!(!outcome.persisted);
        assert_eq!(outcome.report.mutated, 1);
        let preview = outcome.preview.unwrap();
        assert!(preview.contains("--- a/body"));
        assert!(preview.contains("-old"));
        assert!(preview.contains("+new"));
        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a"), Some(template("old")));
    }

    #[test]
    fn cancelled_fill_is_not_persisted() {
        let store = InMemoryDocumentStore::new().with("a", template("old"));
        let cancel = CancelToken::new();
        cancel.cancel();
        let settings = FillSettings {
            input: "a".to_string(),
            ..FillSettings::default()
        };

        let err = run_fill(&settings, &FillData::new(), &store, &cancel).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(store.get("a"), Some(template("old")));
    }

    #[test]
    fn preview_of_unchanged_document_is_empty() {
        let store = InMemoryDocumentStore::new().with("a", template("old"));
        let diff = preview_fill("a", &FillData::new(), &FillOptions::default(), &store).unwrap();
        assert_eq!(diff, "");
    }

    #[test]
    fn batch_artifacts_are_written() {
        let writer = MemWritePort::default();
        let summary = BatchSummary::default();
        write_batch_artifacts(&summary, Utf8Path::new("out"), &writer).unwrap();

        let files = writer.files.lock().unwrap();
        assert!(files.contains_key("out/summary.json"));
        assert!(files.contains_key("out/summary.md"));
    }

    #[test]
    fn fill_artifacts_are_written() {
        let writer = MemWritePort::default();
        write_fill_artifacts(&FillReport::default(), Utf8Path::new("out"), &writer).unwrap();

        let files = writer.files.lock().unwrap();
        let json = String::from_utf8(files["out/report.json"].clone()).unwrap();
        assert!(json.contains("docufill.fill_report.v1"));
        assert!(files.contains_key("out/report.md"));
    }
}
