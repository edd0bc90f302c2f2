//! Structural comparison of optional tree entries.

use regraft_object::{ObjectId, TreeEntry};

/// Whether two optional entries are structurally the same thing: both
/// absent, or both present with equal id, name, and kind. File mode is
/// compared additionally for blob kinds; subtrees carry no mode of their
/// own.
pub(crate) fn items_match(a: Option<&TreeEntry>, b: Option<&TreeEntry>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.mode.is_tree() == b.mode.is_tree()
                && a.oid == b.oid
                && a.name == b.name
                && (a.mode.is_tree() || a.mode == b.mode)
        }
        _ => false,
    }
}

/// The de-duplicated set of `(old, new)` parent pairs that differ at a
/// path. Equality of a pair is by value (id + mode), so two parents that
/// underwent the same change contribute one pair.
pub(crate) fn differing_pairs<'t>(
    old_items: &[Option<&'t TreeEntry>],
    new_items: &[Option<&'t TreeEntry>],
) -> Vec<(Option<&'t TreeEntry>, Option<&'t TreeEntry>)> {
    let mut pairs: Vec<(Option<&TreeEntry>, Option<&TreeEntry>)> = Vec::new();

    for (&old, &new) in old_items.iter().zip(new_items) {
        if items_match(old, new) {
            continue;
        }
        let key = (pair_key(old), pair_key(new));
        if pairs
            .iter()
            .any(|&(o, n)| (pair_key(o), pair_key(n)) == key)
        {
            continue;
        }
        pairs.push((old, new));
    }

    pairs
}

fn pair_key(item: Option<&TreeEntry>) -> Option<(ObjectId, u32)> {
    item.map(|e| (e.oid, e.mode.raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BString;
    use regraft_object::FileMode;

    fn entry(name: &str, hex_byte: u8, mode: FileMode) -> TreeEntry {
        let mut bytes = [0u8; 20];
        bytes[19] = hex_byte;
        TreeEntry {
            name: BString::from(name),
            oid: ObjectId::from_bytes(&bytes).unwrap(),
            mode,
        }
    }

    #[test]
    fn both_absent_match() {
        assert!(items_match(None, None));
    }

    #[test]
    fn presence_mismatch_does_not_match() {
        let e = entry("f", 1, FileMode::Regular);
        assert!(!items_match(Some(&e), None));
        assert!(!items_match(None, Some(&e)));
    }

    #[test]
    fn blobs_compare_mode() {
        let regular = entry("f", 1, FileMode::Regular);
        let executable = entry("f", 1, FileMode::Executable);
        assert!(items_match(Some(&regular), Some(&regular)));
        assert!(!items_match(Some(&regular), Some(&executable)));
    }

    #[test]
    fn different_ids_do_not_match() {
        let a = entry("f", 1, FileMode::Regular);
        let b = entry("f", 2, FileMode::Regular);
        assert!(!items_match(Some(&a), Some(&b)));
    }

    #[test]
    fn different_names_do_not_match() {
        let a = entry("a", 1, FileMode::Regular);
        let b = entry("b", 1, FileMode::Regular);
        assert!(!items_match(Some(&a), Some(&b)));
    }

    #[test]
    fn blob_vs_subtree_do_not_match() {
        let blob = entry("x", 1, FileMode::Regular);
        let tree = entry("x", 1, FileMode::Tree);
        assert!(!items_match(Some(&blob), Some(&tree)));
    }

    #[test]
    fn equal_changes_deduplicate() {
        let old = entry("f", 1, FileMode::Regular);
        let new = entry("f", 2, FileMode::Regular);

        let olds = vec![Some(&old), Some(&old)];
        let news = vec![Some(&new), Some(&new)];
        let pairs = differing_pairs(&olds, &news);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn unchanged_pairs_are_dropped() {
        let old = entry("f", 1, FileMode::Regular);
        let new = entry("f", 2, FileMode::Regular);

        let olds = vec![Some(&old), Some(&old)];
        let news = vec![Some(&old), Some(&new)];
        let pairs = differing_pairs(&olds, &news);
        assert_eq!(pairs.len(), 1);
        assert!(items_match(pairs[0].0, Some(&old)));
        assert!(items_match(pairs[0].1, Some(&new)));
    }

    #[test]
    fn mode_only_difference_counts_as_differing() {
        let old = entry("f", 1, FileMode::Regular);
        let new = entry("f", 1, FileMode::Executable);

        let olds = vec![Some(&old)];
        let news = vec![Some(&new)];
        assert_eq!(differing_pairs(&olds, &news).len(), 1);
    }
}
