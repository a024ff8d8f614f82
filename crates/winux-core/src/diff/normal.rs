use crate::types::Edit;

fn range(first: usize, count: usize) -> String {
    if count == 1 {
        format!("{}", first)
    } else {
        format!("{},{}", first, first + count - 1)
    }
}

fn push_line(out: &mut Vec<u8>, marker: &[u8], line: &[u8]) {
    out.extend_from_slice(marker);
    out.extend_from_slice(line);
    out.push(b'\n');
}

/// Classic `diff` output: one `a`/`d`/`c` command per run of changes,
/// removed lines as `< `, added lines as `> `.
pub fn render<S: AsRef<[u8]>>(edits: &[Edit], lines1: &[S], lines2: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    let (mut p1, mut p2) = (0usize, 0usize);
    let mut k = 0;

    while k < edits.len() {
        if let Edit::Keep { .. } = edits[k] {
            p1 += 1;
            p2 += 1;
            k += 1;
            continue;
        }

        let mut removed = Vec::new();
        let mut added = Vec::new();
        while k < edits.len() {
            match edits[k] {
                Edit::Delete { old } => removed.push(old),
                Edit::Insert { new } => added.push(new),
                Edit::Keep { .. } => break,
            }
            k += 1;
        }

        let command = match (removed.len(), added.len()) {
            (r, 0) => format!("{}d{}", range(p1 + 1, r), p2),
            (0, a) => format!("{}a{}", p1, range(p2 + 1, a)),
            (r, a) => format!("{}c{}", range(p1 + 1, r), range(p2 + 1, a)),
        };
        out.extend_from_slice(command.as_bytes());
        out.push(b'\n');
        for &i in &removed {
            push_line(&mut out, b"< ", lines1[i].as_ref());
        }
        if !removed.is_empty() && !added.is_empty() {
            out.extend_from_slice(b"---\n");
        }
        for &j in &added {
            push_line(&mut out, b"> ", lines2[j].as_ref());
        }

        p1 += removed.len();
        p2 += added.len();
    }

    out
}
