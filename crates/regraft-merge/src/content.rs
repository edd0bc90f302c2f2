//! Three-way content merge using diff edit scripts.
//!
//! Diffs base→ours and base→theirs, interleaves non-overlapping change
//! regions, and inserts conflict markers where changes overlap and differ.

use crate::diff::{diff_lines, split_lines, Edit, EditOp};

/// Labels for conflict markers.
#[derive(Debug, Clone)]
pub struct MergeLabels<'a> {
    pub ours: &'a str,
    pub theirs: &'a str,
}

impl Default for MergeLabels<'_> {
    fn default() -> Self {
        Self {
            ours: "ours",
            theirs: "theirs",
        }
    }
}

/// Result of a three-way content merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMerge {
    /// Clean merge.
    Clean(Vec<u8>),
    /// Overlapping changes; content contains conflict markers.
    Conflict {
        content: Vec<u8>,
        conflict_count: usize,
    },
}

impl ContentMerge {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean(_))
    }

    /// The merged content, with or without conflict markers.
    pub fn content(&self) -> &[u8] {
        match self {
            Self::Clean(data) => data,
            Self::Conflict { content, .. } => content,
        }
    }
}

/// Perform a three-way content merge.
pub fn merge_content(
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
    labels: &MergeLabels<'_>,
) -> ContentMerge {
    if ours == theirs {
        return ContentMerge::Clean(ours.to_vec());
    }
    if base == ours {
        return ContentMerge::Clean(theirs.to_vec());
    }
    if base == theirs {
        return ContentMerge::Clean(ours.to_vec());
    }

    let base_lines = split_lines(base);
    let ours_lines = split_lines(ours);
    let theirs_lines = split_lines(theirs);

    let regions_ours = change_regions(&diff_lines(&base_lines, &ours_lines));
    let regions_theirs = change_regions(&diff_lines(&base_lines, &theirs_lines));

    merge_regions(
        &base_lines,
        &ours_lines,
        &theirs_lines,
        &regions_ours,
        &regions_theirs,
        labels,
    )
}

/// A contiguous run of changes relative to the base.
#[derive(Debug, Clone)]
struct ChangeRegion {
    /// First changed line in the base (0-indexed).
    base_start: usize,
    /// Number of base lines removed.
    base_len: usize,
    /// First line of the replacement in the changed file.
    new_start: usize,
    /// Number of replacement lines.
    new_len: usize,
}

fn change_regions(edits: &[Edit]) -> Vec<ChangeRegion> {
    let mut regions = Vec::new();
    let mut i = 0;

    while i < edits.len() {
        if edits[i].op == EditOp::Equal {
            i += 1;
            continue;
        }

        let base_start = edits[i].old_index;
        let new_start = edits[i].new_index;
        let mut base_end = base_start;
        let mut new_end = new_start;

        while i < edits.len() && edits[i].op != EditOp::Equal {
            match edits[i].op {
                EditOp::Delete => base_end = edits[i].old_index + 1,
                EditOp::Insert => new_end = edits[i].new_index + 1,
                EditOp::Equal => unreachable!(),
            }
            i += 1;
        }

        regions.push(ChangeRegion {
            base_start,
            base_len: base_end - base_start,
            new_start,
            new_len: new_end - new_start,
        });
    }

    regions
}

fn merge_regions(
    base_lines: &[&[u8]],
    ours_lines: &[&[u8]],
    theirs_lines: &[&[u8]],
    regions_ours: &[ChangeRegion],
    regions_theirs: &[ChangeRegion],
    labels: &MergeLabels<'_>,
) -> ContentMerge {
    let mut output: Vec<u8> = Vec::new();
    let mut conflict_count = 0;

    let mut base_pos = 0;
    let mut oi = 0;
    let mut ti = 0;

    while oi < regions_ours.len() || ti < regions_theirs.len() {
        let o_region = regions_ours.get(oi);
        let t_region = regions_theirs.get(ti);

        match (o_region, t_region) {
            (Some(o), Some(t)) => {
                let o_end = o.base_start + o.base_len;
                let t_end = t.base_start + t.base_len;

                if o_end < t.base_start || (o_end == t.base_start && o.base_start < t.base_start)
                {
                    // Ours comes strictly first.
                    emit_lines(
                        &mut output,
                        base_lines,
                        base_pos,
                        o.base_start.saturating_sub(base_pos),
                    );
                    emit_lines(&mut output, ours_lines, o.new_start, o.new_len);
                    base_pos = o_end;
                    oi += 1;
                } else if t_end < o.base_start
                    || (t_end == o.base_start && t.base_start < o.base_start)
                {
                    // Theirs comes strictly first.
                    emit_lines(
                        &mut output,
                        base_lines,
                        base_pos,
                        t.base_start.saturating_sub(base_pos),
                    );
                    emit_lines(&mut output, theirs_lines, t.new_start, t.new_len);
                    base_pos = t_end;
                    ti += 1;
                } else {
                    // Overlap. Widen the span until no further region on
                    // either side starts inside it, then compare each
                    // side's rendition of the whole span.
                    let overlap_start = o.base_start.min(t.base_start);
                    let mut overlap_end = o_end.max(t_end);
                    let mut o_until = oi + 1;
                    let mut t_until = ti + 1;
                    loop {
                        if let Some(next) = regions_ours.get(o_until) {
                            if next.base_start < overlap_end {
                                overlap_end = overlap_end.max(next.base_start + next.base_len);
                                o_until += 1;
                                continue;
                            }
                        }
                        if let Some(next) = regions_theirs.get(t_until) {
                            if next.base_start < overlap_end {
                                overlap_end = overlap_end.max(next.base_start + next.base_len);
                                t_until += 1;
                                continue;
                            }
                        }
                        break;
                    }

                    let ours_content = render_span(
                        base_lines,
                        ours_lines,
                        &regions_ours[oi..o_until],
                        overlap_start,
                        overlap_end,
                    );
                    let theirs_content = render_span(
                        base_lines,
                        theirs_lines,
                        &regions_theirs[ti..t_until],
                        overlap_start,
                        overlap_end,
                    );

                    emit_lines(
                        &mut output,
                        base_lines,
                        base_pos,
                        overlap_start.saturating_sub(base_pos),
                    );

                    if ours_content == theirs_content {
                        output.extend_from_slice(&ours_content);
                    } else {
                        conflict_count += 1;
                        emit_conflict(&mut output, &ours_content, &theirs_content, labels);
                    }

                    base_pos = overlap_end;
                    oi = o_until;
                    ti = t_until;
                }
            }
            (Some(o), None) => {
                emit_lines(
                    &mut output,
                    base_lines,
                    base_pos,
                    o.base_start.saturating_sub(base_pos),
                );
                emit_lines(&mut output, ours_lines, o.new_start, o.new_len);
                base_pos = o.base_start + o.base_len;
                oi += 1;
            }
            (None, Some(t)) => {
                emit_lines(
                    &mut output,
                    base_lines,
                    base_pos,
                    t.base_start.saturating_sub(base_pos),
                );
                emit_lines(&mut output, theirs_lines, t.new_start, t.new_len);
                base_pos = t.base_start + t.base_len;
                ti += 1;
            }
            (None, None) => unreachable!(),
        }
    }

    emit_lines(
        &mut output,
        base_lines,
        base_pos,
        base_lines.len().saturating_sub(base_pos),
    );

    if conflict_count > 0 {
        ContentMerge::Conflict {
            content: output,
            conflict_count,
        }
    } else {
        ContentMerge::Clean(output)
    }
}

/// Emit `count` lines verbatim starting at `start`. Lines carry their own
/// endings, so nothing is appended.
fn emit_lines(output: &mut Vec<u8>, lines: &[&[u8]], start: usize, count: usize) {
    for line in lines.iter().skip(start).take(count) {
        output.extend_from_slice(line);
    }
}

/// One side's rendition of the base span `[from, to)`: its change regions
/// interleaved with the base lines it left alone.
fn render_span(
    base_lines: &[&[u8]],
    side_lines: &[&[u8]],
    regions: &[ChangeRegion],
    from: usize,
    to: usize,
) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pos = from;
    for region in regions {
        if region.base_start > pos {
            emit_lines(&mut out, base_lines, pos, region.base_start - pos);
        }
        emit_lines(&mut out, side_lines, region.new_start, region.new_len);
        pos = pos.max(region.base_start + region.base_len);
    }
    if pos < to {
        emit_lines(&mut out, base_lines, pos, to - pos);
    }
    out
}

fn emit_conflict(
    output: &mut Vec<u8>,
    ours_content: &[u8],
    theirs_content: &[u8],
    labels: &MergeLabels<'_>,
) {
    output.extend_from_slice(b"<<<<<<< ");
    output.extend_from_slice(labels.ours.as_bytes());
    output.push(b'\n');
    output.extend_from_slice(ours_content);
    output.extend_from_slice(b"=======\n");
    output.extend_from_slice(theirs_content);
    output.extend_from_slice(b">>>>>>> ");
    output.extend_from_slice(labels.theirs.as_bytes());
    output.push(b'\n');
}
