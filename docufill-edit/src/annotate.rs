//! Audit annotations anchored to run ranges.
//!
//! One store per document, shared by every scope. Ids are recomputed from the store on each call
//! (max + 1), so they stay valid after manual edits between runs. That read-then-write is not
//! synchronized: a document must only be annotated from one thread.

use chrono::{DateTime, Local, Utc};
use docufill_tree::{
    Annotation, AnnotationStore, DocTree, NodeId, NodeKind, TreeError, TreeResult,
};
use docufill_types::Scope;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The document's store, created if absent.
pub fn ensure_store(tree: &mut DocTree) -> &mut AnnotationStore {
    tree.annotations_or_default()
}

/// Largest numeric id in the store plus one, or `"1"` for an empty store.
///
/// Ids that don't parse as integers are ignored. Ids are never reused, so a store holding
/// `u64::MAX` cannot issue another one.
pub fn next_id(store: &AnnotationStore) -> TreeResult<String> {
    let Some(max) = store
        .ids()
        .filter_map(|id| id.trim().parse::<u64>().ok())
        .max()
    else {
        return Ok("1".to_string());
    };
    max.checked_add(1)
        .map(|id| id.to_string())
        .ok_or(TreeError::AnnotationIdsExhausted {
            last: max.to_string(),
        })
}

/// First two characters of the author.
pub fn initials(author: &str) -> String {
    author.chars().take(2).collect()
}

pub fn change_message(
    scope: Scope,
    timestamp: DateTime<Utc>,
    tag: &str,
    previous: &str,
    new: &str,
) -> String {
    let local = timestamp.with_timezone(&Local).format(TIMESTAMP_FORMAT);
    format!(
        "Field ({scope}) updated at {local}. Tag: {tag}, old value: [{previous}], new value: {new}"
    )
}

/// Anchors one annotation to `runs` (first..=last, in document order).
///
/// Inserts a range start right before the first run, a range end right after the last, and a
/// reference marker as the last child of the last run. Returns the new id, or `None` when there
/// is nothing to anchor to.
///
/// On error the tree is left as it was: markers already placed are removed again and nothing is
/// added to the store.
pub fn record_change(
    tree: &mut DocTree,
    runs: &[NodeId],
    body: impl Into<String>,
    author: &str,
    timestamp: DateTime<Utc>,
) -> TreeResult<Option<String>> {
    let (Some(&first), Some(&last)) = (runs.first(), runs.last()) else {
        return Ok(None);
    };

    let id = match tree.annotations() {
        Some(store) => next_id(store)?,
        None => "1".to_string(),
    };

    let mut placed = Vec::with_capacity(3);
    if let Err(err) = place_markers(tree, first, last, &id, &mut placed) {
        for marker in placed {
            if tree.contains(marker) {
                tree.remove(marker)?;
            }
        }
        return Err(err);
    }

    ensure_store(tree).push(Annotation {
        id: id.clone(),
        author: author.to_string(),
        initials: initials(author),
        timestamp,
        body: body.into(),
    });

    Ok(Some(id))
}

fn place_markers(
    tree: &mut DocTree,
    first: NodeId,
    last: NodeId,
    id: &str,
    placed: &mut Vec<NodeId>,
) -> TreeResult<()> {
    placed.push(tree.insert_before(first, NodeKind::AnnotationStart { id: id.to_string() })?);
    placed.push(tree.insert_after(last, NodeKind::AnnotationEnd { id: id.to_string() })?);
    placed.push(tree.append_child(last, NodeKind::AnnotationReference { id: id.to_string() })?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
    }

    fn note(id: &str) -> Annotation {
        Annotation {
            id: id.to_string(),
            author: "a".to_string(),
            initials: "a".to_string(),
            timestamp: at(),
            body: String::new(),
        }
    }

    #[test]
    fn next_id_starts_at_one() {
        assert_eq!(next_id(&AnnotationStore::default()).unwrap(), "1");
    }

    #[test]
    fn next_id_refuses_to_wrap_past_u64_max() {
        let mut store = AnnotationStore::default();
        store.push(note(&u64::MAX.to_string()));
        assert_eq!(
            next_id(&store),
            Err(TreeError::AnnotationIdsExhausted {
                last: u64::MAX.to_string()
            })
        );
    }

    #[test]
    fn failed_record_leaves_tree_and_store_untouched() {
        let mut tree = DocTree::new();
        let para = tree.add_paragraph(tree.body()).unwrap();
        let run = tree.add_run(para, "a", None).unwrap();
        tree.annotations_or_default().push(note(&u64::MAX.to_string()));
        let before = tree.clone();

        assert!(record_change(&mut tree, &[run], "x", "a", at()).is_err());
        assert_eq!(tree, before);
    }

    #[test]
    fn next_id_is_max_plus_one_not_count_plus_one() {
        let mut store = AnnotationStore::default();
        store.push(note("7"));
        store.push(note("3"));
        store.push(note("draft"));
        assert_eq!(next_id(&store).unwrap(), "8");
    }

    #[test]
    fn initials_take_two_chars() {
        assert_eq!(initials("docufill"), "do");
        assert_eq!(initials("Z"), "Z");
        assert_eq!(initials("张三丰"), "张三");
    }

    #[test]
    fn record_change_brackets_the_run_range() {
        let mut tree = DocTree::new();
        let para = tree.add_paragraph(tree.body()).unwrap();
        let a = tree.add_run(para, "a", None).unwrap();
        let b = tree.add_run(para, "b", None).unwrap();

        let id = record_change(&mut tree, &[a, b], "changed", "docufill", at())
            .unwrap()
            .unwrap();
        assert_eq!(id, "1");

        let kinds: Vec<_> = tree
            .children(para)
            .iter()
            .map(|&c| tree.kind(c).unwrap().name())
            .collect();
        assert_eq!(kinds, vec!["annotation start", "run", "run", "annotation end"]);

        let reference = *tree.children(b).last().unwrap();
        assert_eq!(
            tree.kind(reference),
            Some(&NodeKind::AnnotationReference {
                id: "1".to_string()
            })
        );

        let stored = tree.annotations().unwrap().get("1").unwrap();
        assert_eq!(stored.initials, "do");
        assert_eq!(stored.body, "changed");
    }

    #[test]
    fn record_change_without_runs_adds_nothing() {
        let mut tree = DocTree::new();
        assert_eq!(record_change(&mut tree, &[], "x", "a", at()).unwrap(), None);
        assert!(tree.annotations().is_none());
    }

    #[test]
    fn message_carries_old_and_new_values() {
        let msg = change_message(Scope::Header, at(), "name", "old", "new");
        assert!(msg.starts_with("Field (header) updated at "));
        assert!(msg.ends_with("Tag: name, old value: [old], new value: new"));
    }
}
