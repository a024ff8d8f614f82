//! Longest-common-subsequence diff between two line sequences.

use crate::types::Edit;
use log::trace;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Same length and pairwise equal. This is all `diff --brief` needs.
pub fn identical<S: AsRef<[u8]>>(lines1: &[S], lines2: &[S]) -> bool {
    lines1.len() == lines2.len()
        && lines1
            .iter()
            .zip(lines2)
            .all(|(a, b)| a.as_ref() == b.as_ref())
}

fn hash_lines<S: AsRef<[u8]>>(lines: &[S]) -> Vec<u64> {
    lines
        .iter()
        .map(|line| {
            let mut hasher = DefaultHasher::new();
            line.as_ref().hash(&mut hasher);
            hasher.finish()
        })
        .collect()
}

/// Dense `(m + 1) x (n + 1)` table of common-subsequence lengths.
struct LcsTable {
    cols: usize,
    cells: Vec<usize>,
}

impl LcsTable {
    fn build<S: AsRef<[u8]>>(lines1: &[S], lines2: &[S]) -> Self {
        let (m, n) = (lines1.len(), lines2.len());
        let hash1 = hash_lines(lines1);
        let hash2 = hash_lines(lines2);
        let cols = n + 1;
        let mut cells = vec![0usize; (m + 1) * cols];

        for i in 1..=m {
            for j in 1..=n {
                // Hashes only rule pairs out; equal hashes are confirmed on
                // the bytes so colliding lines never merge.
                let same = hash1[i - 1] == hash2[j - 1]
                    && lines1[i - 1].as_ref() == lines2[j - 1].as_ref();
                cells[i * cols + j] = if same {
                    cells[(i - 1) * cols + (j - 1)] + 1
                } else {
                    cells[(i - 1) * cols + j].max(cells[i * cols + (j - 1)])
                };
            }
        }

        Self { cols, cells }
    }

    fn get(&self, i: usize, j: usize) -> usize {
        self.cells[i * self.cols + j]
    }
}

/// Computes the edit script turning `lines1` into `lines2`.
///
/// Identical inputs return an empty script without building the table.
/// When both directions score the same during backtracking the insertion is
/// taken first, which after reversal puts deletions ahead of insertions.
pub fn diff<S: AsRef<[u8]>>(lines1: &[S], lines2: &[S]) -> Vec<Edit> {
    if identical(lines1, lines2) {
        return Vec::new();
    }

    let table = LcsTable::build(lines1, lines2);
    trace!(
        "lcs table {}x{}, common length {}",
        lines1.len() + 1,
        lines2.len() + 1,
        table.get(lines1.len(), lines2.len())
    );

    let mut edits = Vec::with_capacity(lines1.len() + lines2.len());
    let (mut i, mut j) = (lines1.len(), lines2.len());
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && lines1[i - 1].as_ref() == lines2[j - 1].as_ref() {
            edits.push(Edit::Keep {
                old: i - 1,
                new: j - 1,
            });
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table.get(i, j - 1) >= table.get(i - 1, j)) {
            edits.push(Edit::Insert { new: j - 1 });
            j -= 1;
        } else {
            edits.push(Edit::Delete { old: i - 1 });
            i -= 1;
        }
    }

    edits.reverse();
    edits
}

/// Replays `edits` against `lines1`, taking inserted lines from `lines2`.
pub fn apply<'a, S: AsRef<[u8]>>(
    edits: &[Edit],
    lines1: &'a [S],
    lines2: &'a [S],
) -> Vec<&'a [u8]> {
    if edits.is_empty() {
        return lines1.iter().map(|l| l.as_ref()).collect();
    }
    edits
        .iter()
        .filter_map(|edit| match *edit {
            Edit::Keep { old, .. } => Some(lines1[old].as_ref()),
            Edit::Insert { new } => Some(lines2[new].as_ref()),
            Edit::Delete { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lines(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_identical_inputs_give_empty_script() {
        for text in ["", "a", "a b c", "x x x y"] {
            let l = lines(text);
            assert!(diff(&l, &l).is_empty());
        }
    }

    #[test]
    fn test_single_change_orders_delete_before_insert() {
        let edits = diff(&lines("a b c"), &lines("a x c"));
        assert_eq!(
            edits,
            vec![
                Edit::Keep { old: 0, new: 0 },
                Edit::Delete { old: 1 },
                Edit::Insert { new: 1 },
                Edit::Keep { old: 2, new: 2 },
            ]
        );
    }

    #[test]
    fn test_pure_insertions_and_deletions() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(
            diff(&empty, &lines("a b")),
            vec![Edit::Insert { new: 0 }, Edit::Insert { new: 1 }]
        );
        assert_eq!(
            diff(&lines("a b"), &empty),
            vec![Edit::Delete { old: 0 }, Edit::Delete { old: 1 }]
        );
    }

    #[test]
    fn test_script_keeps_a_longest_common_subsequence() {
        let a = lines("a b c a b b a");
        let b = lines("c b a b a c");
        let edits = diff(&a, &b);
        let kept = edits.iter().filter(|e| !e.is_change()).count();
        assert_eq!(kept, 4);
    }

    #[test]
    fn test_applying_the_script_reconstructs_the_target() {
        let cases = [
            ("a b c", "a x c"),
            ("", "p q"),
            ("p q", ""),
            ("a b c d e f", "b c x e f g"),
            ("same same same", "same other same same"),
            ("1 2 3 4 5 6 7 8 9", "0 1 2 4 5 6 8 9 10"),
        ];
        for (old, new) in cases {
            let (a, b) = (lines(old), lines(new));
            let edits = diff(&a, &b);
            let expected: Vec<&[u8]> = b.iter().map(|l| l.as_bytes()).collect();
            assert_eq!(apply(&edits, &a, &b), expected, "{:?} -> {:?}", old, new);
        }
    }

    #[test]
    fn test_brief_comparison_agrees_with_full_diff() {
        let cases = [("a b", "a b"), ("a b", "a c"), ("a", "a a"), ("", "")];
        for (old, new) in cases {
            let (a, b) = (lines(old), lines(new));
            assert_eq!(identical(&a, &b), diff(&a, &b).is_empty());
        }
    }

    #[test]
    fn test_lines_differing_only_in_invalid_bytes_stay_distinct() {
        let a: Vec<&[u8]> = vec![&b"caf\xff"[..]];
        let b: Vec<&[u8]> = vec![&b"caf\xfe"[..]];
        assert!(!identical(&a, &b));
        assert_eq!(
            diff(&a, &b),
            vec![Edit::Delete { old: 0 }, Edit::Insert { new: 0 }]
        );
    }

    /// Lines drawn from a small pool so inputs share lines, mixed with
    /// arbitrary bytes.
    fn line_strategy() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            prop::sample::select(vec![
                b"a".to_vec(),
                b"b".to_vec(),
                Vec::new(),
                b"caf\xff".to_vec(),
                b"caf\xfe".to_vec(),
            ]),
            prop::collection::vec(any::<u8>(), 0..4),
        ]
    }

    fn lines_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
        prop::collection::vec(line_strategy(), 0..12)
    }

    proptest! {
        #[test]
        fn applying_any_script_reconstructs_the_target(
            a in lines_strategy(),
            b in lines_strategy(),
        ) {
            let edits = diff(&a, &b);
            let expected: Vec<&[u8]> = b.iter().map(|l| l.as_slice()).collect();
            prop_assert_eq!(apply(&edits, &a, &b), expected);
            for edit in &edits {
                if let Edit::Keep { old, new } = *edit {
                    prop_assert_eq!(&a[old], &b[new]);
                }
            }
        }

        #[test]
        fn diff_of_a_sequence_with_itself_is_empty(a in lines_strategy()) {
            prop_assert!(diff(&a, &a).is_empty());
        }

        #[test]
        fn brief_comparison_agrees_with_full_diff(
            a in lines_strategy(),
            b in lines_strategy(),
        ) {
            let changed = diff(&a, &b).iter().any(|e| e.is_change());
            prop_assert_eq!(identical(&a, &b), !changed);
        }
    }
}
