mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{ConfigMerger, FillArgsOverride};
use docufill_core::adapters::{FsWritePort, JsonDocumentStore};
use docufill_core::pipeline::{
    run_batch, run_cleanup, run_fill, write_batch_artifacts, write_fill_artifacts,
};
use docufill_core::ports::DocumentStore;
use docufill_core::settings::{BatchMode, BatchSettings, CleanupSettings, FillSettings};
use docufill_core::CancelToken;
use docufill_render::{render_cleanup_md, render_fill_md, render_placeholder_list};
use docufill_types::FillData;
use fs_err as fs;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "docufill",
    version,
    about = "Fill tagged placeholders in document templates, then clean up the audit trail."
)]
struct Cli {
    /// Config file (default: ./docufill.toml when present).
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fill one document from a JSON data file.
    Fill(FillArgs),
    /// Strip annotations and unwrap placeholders in one document.
    Cleanup(CleanupArgs),
    /// List the tagged placeholders in a document.
    List(ListArgs),
    /// Fill or clean every document matching a glob pattern.
    Batch(BatchArgs),
}

#[derive(Debug, Parser)]
struct FillArgs {
    /// Document snapshot (JSON) to fill.
    #[arg(long)]
    doc: Utf8PathBuf,

    /// Fill data: a JSON object mapping tags to strings or fragment lists.
    #[arg(long)]
    data: Utf8PathBuf,

    /// Where to write the filled document (default: overwrite --doc).
    #[arg(long)]
    out: Option<Utf8PathBuf>,

    /// Print a text diff of the fill instead of writing the document.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Directory for report.json and report.md.
    #[arg(long)]
    report_dir: Option<Utf8PathBuf>,

    /// Do not record annotations.
    #[arg(long, default_value_t = false)]
    no_annotate: bool,

    /// Annotation author.
    #[arg(long)]
    author: Option<String>,

    /// Colour painted on new content, e.g. FF0000.
    #[arg(long)]
    highlight_color: Option<String>,

    /// Keep multi-paragraph table cells as they are.
    #[arg(long, default_value_t = false)]
    no_merge_cells: bool,
}

#[derive(Debug, Parser)]
struct CleanupArgs {
    /// Document snapshot (JSON) to clean.
    #[arg(long)]
    doc: Utf8PathBuf,

    /// Where to write the cleaned document (default: overwrite --doc).
    #[arg(long)]
    out: Option<Utf8PathBuf>,

    /// Colour restored on runs inside annotated spans.
    #[arg(long)]
    neutral_color: Option<String>,

    #[arg(long, default_value_t = false)]
    keep_annotations: bool,

    #[arg(long, default_value_t = false)]
    keep_placeholders: bool,
}

#[derive(Debug, Parser)]
struct ListArgs {
    #[arg(long)]
    doc: Utf8PathBuf,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct BatchArgs {
    /// Glob pattern selecting documents; may be repeated.
    #[arg(long = "pattern", required = true)]
    patterns: Vec<String>,

    /// Fill data (required unless --cleanup).
    #[arg(long, required_unless_present = "cleanup")]
    data: Option<Utf8PathBuf>,

    /// Output directory for processed documents (default: overwrite inputs).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Run cleanup instead of fill.
    #[arg(long, default_value_t = false)]
    cleanup: bool,

    /// Documents processed concurrently.
    #[arg(long)]
    workers: Option<usize>,

    /// Directory for summary.json and summary.md.
    #[arg(long)]
    report_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = config::load_or_default(Utf8Path::new("."), cli.config.as_deref())
        .context("load docufill.toml config")?;
    let merger = ConfigMerger::new(file_config);

    match cli.cmd {
        Command::Fill(args) => cmd_fill(args, &merger),
        Command::Cleanup(args) => cmd_cleanup(args, &merger),
        Command::List(args) => cmd_list(args),
        Command::Batch(args) => cmd_batch(args, &merger),
    }
}

fn cmd_fill(args: FillArgs, merger: &ConfigMerger) -> anyhow::Result<()> {
    let data = load_data(&args.data)?;
    let options = merger.fill_options(&FillArgsOverride {
        no_annotate: args.no_annotate,
        author: args.author,
        highlight_color: args.highlight_color,
        no_merge_cells: args.no_merge_cells,
    });
    debug!(?options, "merged fill options");

    let settings = FillSettings {
        input: args.doc.to_string(),
        output: args.out.map(|p| p.to_string()),
        dry_run: args.dry_run,
        options,
    };
    let store = JsonDocumentStore::new(".");
    let outcome = run_fill(&settings, &data, &store, &CancelToken::new())?;

    if let Some(dir) = &args.report_dir {
        write_fill_artifacts(&outcome.report, dir, &FsWritePort)?;
    }
    match &outcome.preview {
        Some(diff) => print!("{diff}"),
        None => print!("{}", render_fill_md(&outcome.report)),
    }
    for warning in &outcome.report.warnings {
        warn!("{warning}");
    }
    if outcome.report.failed > 0 {
        anyhow::bail!("{} placeholder(s) failed to fill", outcome.report.failed);
    }
    Ok(())
}

fn cmd_cleanup(args: CleanupArgs, merger: &ConfigMerger) -> anyhow::Result<()> {
    let settings = CleanupSettings {
        input: args.doc.to_string(),
        output: args.out.map(|p| p.to_string()),
        options: merger.cleanup_options(
            args.neutral_color.as_deref(),
            args.keep_annotations,
            args.keep_placeholders,
        ),
    };
    let store = JsonDocumentStore::new(".");
    let report = run_cleanup(&settings, &store)?;
    print!("{}", render_cleanup_md(&report));
    Ok(())
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let store = JsonDocumentStore::new(".");
    let tree = store.open(args.doc.as_str())?;
    let placeholders = docufill_tree::resolve::list_placeholders(&tree);

    match args.format {
        OutputFormat::Text => print!("{}", render_placeholder_list(&placeholders)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&placeholders)?),
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs, merger: &ConfigMerger) -> anyhow::Result<()> {
    let inputs = expand_patterns(&args.patterns)?;
    if inputs.is_empty() {
        anyhow::bail!("no documents match {:?}", args.patterns);
    }

    let data = match &args.data {
        Some(path) => load_data(path)?,
        None => FillData::new(),
    };
    let settings = BatchSettings {
        inputs,
        out_dir: args.out_dir,
        workers: merger.workers(args.workers),
        mode: if args.cleanup {
            BatchMode::Cleanup
        } else {
            BatchMode::Fill
        },
        fill: merger.fill_options(&FillArgsOverride::default()),
        cleanup: merger.cleanup_options(None, false, false),
    };

    let store = JsonDocumentStore::new(".");
    let summary = run_batch(&settings, &data, &store, &CancelToken::new());

    if let Some(dir) = &args.report_dir {
        write_batch_artifacts(&summary, dir, &FsWritePort)?;
        info!("wrote batch summary to {}", dir);
    }
    print!("{}", docufill_render::render_batch_md(&summary));

    let failed = summary.failed();
    if failed > 0 {
        anyhow::bail!("{failed} document(s) failed");
    }
    Ok(())
}

fn load_data(path: &Utf8Path) -> anyhow::Result<FillData> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    let data: FillData =
        serde_json::from_str(&text).with_context(|| format!("parse fill data {}", path))?;
    debug!(entries = data.len(), "loaded fill data");
    Ok(data)
}

/// Expand glob patterns into a sorted, de-duplicated list of files.
fn expand_patterns(patterns: &[String]) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::new();
    for pattern in patterns {
        let paths = glob::glob(pattern).with_context(|| format!("invalid pattern {pattern}"))?;
        for entry in paths {
            let path = entry.with_context(|| format!("read match for {pattern}"))?;
            if !path.is_file() {
                continue;
            }
            let path = Utf8PathBuf::from_path_buf(path)
                .map_err(|p| anyhow::anyhow!("non-UTF-8 path {}", p.display()))?;
            out.push(path.into_string());
        }
    }
    out.sort();
    out.dedup();
    Ok(out)
}
