//! Content merging for regraft.
//!
//! Three layers: a line-level Myers diff (`diff`), a three-way content
//! merge producing either clean bytes or marker-annotated conflicts
//! (`content`), and a three-way merge of optional `(id, mode)` tree
//! entries that reads and writes blobs through the store (`entry`). The
//! rebase engine defers to the entry merge wherever a textual merge is
//! required; the only failure mode besides a reported conflict is store
//! access, so these functions return [`regraft_store::StoreError`].

pub mod content;
pub mod diff;
pub mod entry;

pub use content::{merge_content, ContentMerge, MergeLabels};
pub use entry::{merge_entries, EntryMerge};
