//! Fragment rendering: values to run sequences.
//!
//! Pure functions. Nothing here touches a tree; the replacement engine materializes the result.

use docufill_tree::{RunStyle, VerticalPosition};
use docufill_types::{FillValue, TextFragment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    Text(String),
    Break,
}

/// One run to be written into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRun {
    pub style: Option<RunStyle>,
    pub content: Vec<RunContent>,
}

impl RenderedRun {
    pub fn has_text(&self) -> bool {
        self.content.iter().any(|c| matches!(c, RunContent::Text(_)))
    }

    pub fn is_break(&self) -> bool {
        self.content == [RunContent::Break]
    }
}

/// Folds `\r\n` and lone `\r` into `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// A plain string becomes one run per line with a bare break run between lines.
///
/// The empty string still yields one run holding one empty text node.
pub fn render_plain(text: &str, base: Option<&RunStyle>) -> Vec<RenderedRun> {
    let normalized = normalize_line_endings(text);
    let mut runs = Vec::new();
    for (i, line) in normalized.split('\n').enumerate() {
        if i > 0 {
            runs.push(RenderedRun {
                style: None,
                content: vec![RunContent::Break],
            });
        }
        runs.push(RenderedRun {
            style: base.cloned(),
            content: vec![RunContent::Text(line.to_string())],
        });
    }
    runs
}

/// One run per fragment, each cloning `base`.
///
/// Script fragments set the vertical position on their clone; every other fragment explicitly
/// clears it. Line breaks inside a fragment become break nodes within that fragment's run. An
/// empty fragment list renders to no runs at all.
pub fn render_fragments(fragments: &[TextFragment], base: Option<&RunStyle>) -> Vec<RenderedRun> {
    fragments
        .iter()
        .map(|fragment| RenderedRun {
            style: fragment_style(fragment, base),
            content: text_with_breaks(&fragment.text),
        })
        .collect()
}

pub fn render_value(value: &FillValue, base: Option<&RunStyle>) -> Vec<RenderedRun> {
    match value {
        FillValue::Plain(text) => render_plain(text, base),
        FillValue::Formatted(formatted) => render_fragments(&formatted.fragments, base),
    }
}

fn fragment_style(fragment: &TextFragment, base: Option<&RunStyle>) -> Option<RunStyle> {
    // Superscript wins if a fragment claims both.
    let vertical = if fragment.is_superscript {
        Some(VerticalPosition::Superscript)
    } else if fragment.is_subscript {
        Some(VerticalPosition::Subscript)
    } else {
        None
    };

    match (base, vertical) {
        (None, None) => None,
        (base, vertical) => {
            let mut style = base.cloned().unwrap_or_default();
            style.vertical = vertical;
            Some(style)
        }
    }
}

fn text_with_breaks(text: &str) -> Vec<RunContent> {
    let normalized = normalize_line_endings(text);
    let mut content = Vec::new();
    for (i, line) in normalized.split('\n').enumerate() {
        if i > 0 {
            content.push(RunContent::Break);
        }
        content.push(RunContent::Text(line.to_string()));
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use docufill_types::FormattedValue;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn bold() -> RunStyle {
        RunStyle {
            bold: true,
            font: Some("Calibri".to_string()),
            ..RunStyle::default()
        }
    }

    #[test]
    fn h2o_renders_three_runs_with_middle_subscript() {
        let value = FormattedValue::new(vec![
            TextFragment::plain("H"),
            TextFragment::subscript("2"),
            TextFragment::plain("O"),
        ]);
        let base = bold();
        let runs = render_fragments(&value.fragments, Some(&base));

        assert_eq!(runs.len(), 3);
        let verticals: Vec<_> = runs
            .iter()
            .map(|r| r.style.as_ref().and_then(|s| s.vertical))
            .collect();
        assert_eq!(
            verticals,
            vec![None, Some(VerticalPosition::Subscript), None]
        );
        assert!(runs.iter().all(|r| r.style.as_ref().is_some_and(|s| s.bold)));
    }

    #[test]
    fn plain_fragments_clear_inherited_vertical() {
        let base = RunStyle {
            vertical: Some(VerticalPosition::Superscript),
            ..RunStyle::default()
        };
        let runs = render_fragments(&[TextFragment::plain("x")], Some(&base));
        assert_eq!(runs[0].style.as_ref().and_then(|s| s.vertical), None);
    }

    #[test]
    fn unstyled_base_stays_unstyled_for_plain_fragments() {
        let runs = render_fragments(
            &[TextFragment::plain("a"), TextFragment::superscript("b")],
            None,
        );
        assert_eq!(runs[0].style, None);
        assert_eq!(
            runs[1].style,
            Some(RunStyle {
                vertical: Some(VerticalPosition::Superscript),
                ..RunStyle::default()
            })
        );
    }

    #[test]
    fn multi_line_scalar_interleaves_breaks() {
        let runs = render_plain("Line1\nLine2\nLine3", None);
        let shape: Vec<_> = runs
            .iter()
            .map(|r| match r.content.as_slice() {
                [RunContent::Text(t)] => t.clone(),
                [RunContent::Break] => "<br>".to_string(),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(shape, vec!["Line1", "<br>", "Line2", "<br>", "Line3"]);
        assert_eq!(runs.iter().filter(|r| r.has_text()).count(), 3);
        assert_eq!(runs.iter().filter(|r| r.is_break()).count(), 2);
    }

    #[test]
    fn line_endings_are_normalized() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert_eq!(render_plain("a\r\nb", None).len(), 3);
    }

    #[test]
    fn empty_values_diverge_by_path() {
        let plain = render_plain("", None);
        assert_eq!(
            plain,
            vec![RenderedRun {
                style: None,
                content: vec![RunContent::Text(String::new())],
            }]
        );
        assert!(render_fragments(&[], Some(&bold())).is_empty());
    }

    #[test]
    fn fragment_breaks_stay_inside_one_run() {
        let runs = render_fragments(&[TextFragment::plain("a\nb")], None);
        assert_eq!(runs.len(), 1);
        assert_eq!(
            runs[0].content,
            vec![
                RunContent::Text("a".to_string()),
                RunContent::Break,
                RunContent::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn break_runs_carry_no_style() {
        let base = bold();
        let runs = render_plain("a\nb", Some(&base));
        assert_eq!(runs[0].style.as_ref(), Some(&base));
        assert!(runs[1].is_break());
        assert_eq!(runs[1].style, None);
        assert_eq!(runs[2].style.as_ref(), Some(&base));
    }

    #[test]
    fn trailing_break_in_fragment_keeps_an_empty_text() {
        let runs = render_fragments(&[TextFragment::plain("a\n")], None);
        assert_eq!(
            runs[0].content,
            vec![
                RunContent::Text("a".to_string()),
                RunContent::Break,
                RunContent::Text(String::new()),
            ]
        );
    }

    proptest! {
        /// n lines always render to n text runs and n-1 break runs.
        #[test]
        fn line_count_matches_runs(lines in prop::collection::vec("[a-zA-Z0-9 ]{0,8}", 1..10)) {
            let text = lines.join("\n");
            let runs = render_plain(&text, None);
            prop_assert_eq!(runs.iter().filter(|r| r.has_text()).count(), lines.len());
            prop_assert_eq!(runs.iter().filter(|r| r.is_break()).count(), lines.len() - 1);
        }
    }
}
