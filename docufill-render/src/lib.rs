//! Rendering helpers (markdown) for human-readable summaries.

use docufill_types::{BatchSummary, CleanupReport, DocumentStatus, FillReport, PlaceholderInfo};

pub fn render_fill_md(report: &FillReport) -> String {
    let mut out = String::new();
    out.push_str("# docufill fill\n\n");
    out.push_str(&format!(
        "- Mutated: {}\n- Skipped (no data): {}\n- Skipped (untagged): {}\n- Skipped (structure): {}\n- Failed: {}\n- Annotations added: {}\n\n",
        report.mutated,
        report.skipped_missing,
        report.skipped_untagged,
        report.skipped_structural,
        report.failed,
        report.annotations_added
    ));

    out.push_str("## Placeholders\n\n");
    if report.events.is_empty() {
        out.push_str("_No placeholders filled._\n");
    } else {
        out.push_str("| Tag | Scope | Strategy | Previous | New | Annotation |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for e in &report.events {
            out.push_str(&format!(
                "| `{}` | {} | `{}` | {} | {} | {} |\n",
                e.tag,
                e.scope,
                e.strategy,
                cell(&e.previous),
                cell(&e.new),
                e.annotation_id.as_deref().unwrap_or("-")
            ));
        }
    }

    push_warnings(&mut out, report.warnings.iter().map(String::as_str));
    out
}

pub fn render_cleanup_md(report: &CleanupReport) -> String {
    let mut out = String::new();
    out.push_str("# docufill cleanup\n\n");
    out.push_str(&format!(
        "- Annotations removed: {}\n- Placeholders unwrapped: {}\n",
        report.annotations_removed, report.placeholders_unwrapped
    ));
    if report.is_noop() {
        out.push_str("\n_Nothing to clean._\n");
    }
    push_warnings(&mut out, report.warnings.iter().map(String::as_str));
    out
}

pub fn render_batch_md(summary: &BatchSummary) -> String {
    let mut out = String::new();
    out.push_str("# docufill batch\n\n");
    out.push_str(&format!(
        "- Documents: {}\n- Succeeded: {}\n- Failed: {}\n- Cancelled: {}\n\n",
        summary.documents.len(),
        summary.succeeded(),
        summary.failed(),
        summary.cancelled()
    ));

    out.push_str("## Documents\n\n");
    if summary.documents.is_empty() {
        out.push_str("_No documents._\n");
    } else {
        for (i, d) in summary.documents.iter().enumerate() {
            out.push_str(&format!(
                "{}. `{}` → `{}`: {}\n",
                i + 1,
                d.input,
                d.output,
                status_line(&d.status)
            ));
        }
    }

    let warnings: Vec<String> = summary
        .warnings()
        .map(|(input, w)| format!("`{input}`: {w}"))
        .collect();
    push_warnings(&mut out, warnings.iter().map(String::as_str));
    out
}

/// Plain listing used by `docufill list`.
pub fn render_placeholder_list(placeholders: &[PlaceholderInfo]) -> String {
    let mut out = String::new();
    for p in placeholders {
        out.push_str(&format!("{}\t{}\t{}", p.scope, p.kind, p.tag));
        if let Some(title) = &p.title {
            out.push_str(&format!("\t{title}"));
        }
        out.push('\n');
    }
    out
}

fn status_line(status: &DocumentStatus) -> String {
    match status {
        DocumentStatus::Filled { mutated } => format!("filled ({mutated} mutated)"),
        DocumentStatus::Cleaned {
            annotations_removed,
            placeholders_unwrapped,
        } => format!(
            "cleaned ({annotations_removed} annotations, {placeholders_unwrapped} placeholders)"
        ),
        DocumentStatus::Failed { error } => format!("failed: {error}"),
        DocumentStatus::Cancelled => "cancelled".to_string(),
    }
}

fn push_warnings<'a>(out: &mut String, warnings: impl Iterator<Item = &'a str>) {
    let mut warnings = warnings.peekable();
    if warnings.peek().is_none() {
        return;
    }
    out.push_str("\n## Warnings\n\n");
    for w in warnings {
        out.push_str(&format!("- {w}\n"));
    }
}

/// Escape a value for a markdown table cell.
fn cell(value: &str) -> String {
    if value.is_empty() {
        return "_empty_".to_string();
    }
    value.replace('|', "\\|").replace('\n', "<br>")
}
