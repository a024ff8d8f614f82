//! Grouping of an edit script into unified-diff hunks.

use crate::types::{Edit, Hunk, HunkLine};

/// File positions `(line1, line2)` reached before each edit, plus the final
/// position after the last one.
fn positions(edits: &[Edit]) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(edits.len() + 1);
    let (mut p1, mut p2) = (0, 0);
    for edit in edits {
        out.push((p1, p2));
        match edit {
            Edit::Keep { .. } => {
                p1 += 1;
                p2 += 1;
            }
            Edit::Delete { .. } => p1 += 1,
            Edit::Insert { .. } => p2 += 1,
        }
    }
    out.push((p1, p2));
    out
}

/// Splits `edits` into hunks. Change clusters separated by more than
/// `2 * context` unchanged lines get their own hunk; closer clusters share
/// one. Each hunk carries up to `context` unchanged lines on either side.
pub fn group(edits: &[Edit], context: usize) -> Vec<Hunk> {
    let mut clusters: Vec<(usize, usize)> = Vec::new();
    let mut last_change: Option<usize> = None;

    for (k, edit) in edits.iter().enumerate() {
        if !edit.is_change() {
            continue;
        }
        match (clusters.last_mut(), last_change) {
            (Some(cluster), Some(prev)) if k - prev - 1 <= context.saturating_mul(2) => {
                cluster.1 = k + 1
            }
            _ => clusters.push((k, k + 1)),
        }
        last_change = Some(k);
    }

    let pos = positions(edits);
    clusters
        .into_iter()
        .map(|(first, end)| {
            let lead = edits[..first]
                .iter()
                .rev()
                .take(context)
                .take_while(|e| !e.is_change())
                .count();
            let trail = edits[end..]
                .iter()
                .take(context)
                .take_while(|e| !e.is_change())
                .count();
            let range = first - lead..end + trail;
            let (start1, start2) = pos[range.start];
            let (end1, end2) = pos[range.end];
            Hunk {
                start1,
                start2,
                edits: range,
                old_len: end1 - start1,
                new_len: end2 - start2,
            }
        })
        .collect()
}

fn header_side(start: usize, len: usize) -> String {
    // An empty side names the line it follows, as GNU diff does.
    if len == 0 {
        format!("{},0", start)
    } else {
        format!("{},{}", start + 1, len)
    }
}

/// `@@ -start,count +start,count @@`. A side with no lines prints its
/// 0-based start (the line it follows), as GNU diff does.
pub fn header(hunk: &Hunk) -> String {
    format!(
        "@@ -{} +{} @@",
        header_side(hunk.start1, hunk.old_len),
        header_side(hunk.start2, hunk.new_len)
    )
}

pub fn render<S: AsRef<[u8]>>(
    hunk: &Hunk,
    edits: &[Edit],
    lines1: &[S],
    lines2: &[S],
) -> Vec<HunkLine> {
    edits[hunk.edits.clone()]
        .iter()
        .map(|edit| match *edit {
            Edit::Keep { old, .. } => HunkLine::Context(lines1[old].as_ref().to_vec()),
            Edit::Delete { old } => HunkLine::Remove(lines1[old].as_ref().to_vec()),
            Edit::Insert { new } => HunkLine::Add(lines2[new].as_ref().to_vec()),
        })
        .collect()
}

/// Full unified diff output; empty when the script has no changes.
pub fn unified<S: AsRef<[u8]>>(
    path1: &str,
    path2: &str,
    edits: &[Edit],
    lines1: &[S],
    lines2: &[S],
    context: usize,
) -> Vec<u8> {
    let hunks = group(edits, context);
    if hunks.is_empty() {
        return Vec::new();
    }

    let mut out = format!("--- {}\n+++ {}\n", path1, path2).into_bytes();
    for hunk in &hunks {
        out.extend_from_slice(header(hunk).as_bytes());
        out.push(b'\n');
        for line in render(hunk, edits, lines1, lines2) {
            out.push(line.prefix());
            out.extend_from_slice(line.text());
            out.push(b'\n');
        }
    }
    out
}
