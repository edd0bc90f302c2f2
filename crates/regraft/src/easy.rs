//! The single-pair fast path: reconcile one item without a textual merge.

use regraft_object::TreeEntry;

use crate::item::items_match;

/// Outcome of the fast path.
#[derive(Debug)]
pub(crate) enum EasyMerge<'t> {
    /// Reconciled; place this item at the path (`None` means delete it).
    Solved(Option<&'t TreeEntry>),
    /// No cheap resolution; fall through to the full blob merge.
    Unsolved,
}

/// Try to reconcile a path where exactly one `(old, new)` parent pair
/// differs, without touching blob content.
///
/// The cases: the pair does not actually differ (take the commit's item);
/// one side already made the change (take it); or the change has not been
/// applied on our side yet (take the rebased parent's item).
pub(crate) fn easy_merge<'t>(
    commit_item: Option<&'t TreeEntry>,
    old_item: Option<&'t TreeEntry>,
    new_item: Option<&'t TreeEntry>,
) -> EasyMerge<'t> {
    if items_match(old_item, new_item) {
        return EasyMerge::Solved(commit_item);
    }

    match commit_item {
        None => {
            if old_item.is_none() {
                // Added on the rebased side only.
                return EasyMerge::Solved(new_item);
            }
            if new_item.is_none() {
                // Already deleted over there as well.
                return EasyMerge::Solved(None);
            }
            // Deleted here, changed there: a tree conflict.
            EasyMerge::Unsolved
        }
        Some(_) => {
            if old_item.is_none() {
                // The rebased parent must be present since the pair differs.
                if items_match(new_item, commit_item) {
                    return EasyMerge::Solved(commit_item);
                }
                return EasyMerge::Unsolved;
            }
            if items_match(commit_item, old_item) {
                // The change has not been applied on our side yet.
                return EasyMerge::Solved(new_item);
            }
            if new_item.is_some() && items_match(new_item, commit_item) {
                // The change has already been applied on the rebased parent.
                return EasyMerge::Solved(new_item);
            }
            EasyMerge::Unsolved
        }
    }
}
