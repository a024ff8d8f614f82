//! Translation of POSIX basic and extended regular expressions into the
//! syntax understood by the `regex` crate.

const CLASS_ESCAPES: &[char] = &['w', 'W', 's', 'S', 'b', 'B', '<', '>'];

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Copies a POSIX bracket expression starting at `chars[start] == '['`.
/// Returns the translated class and the index just past its `]`, or `None`
/// when the bracket is never closed.
fn bracket(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut out = String::from("[");
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        out.push('^');
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        out.push_str("\\]");
        i += 1;
    }

    while i < chars.len() {
        match chars[i] {
            ']' => {
                out.push(']');
                return Some((out, i + 1));
            }
            '[' if chars.get(i + 1) == Some(&':') => {
                let rest: String = chars[i..].iter().collect();
                let close = rest.find(":]")?;
                out.push_str(&rest[..close + 2]);
                i += rest[..close + 2].chars().count();
                continue;
            }
            '\\' | '[' | '&' | '~' => {
                out.push('\\');
                out.push(chars[i]);
            }
            c => out.push(c),
        }
        i += 1;
    }
    None
}

fn is_interval(chars: &[char], open: usize) -> bool {
    let mut i = open + 1;
    let mut digits = 0;
    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == ',') {
        if chars[i].is_ascii_digit() {
            digits += 1;
        }
        i += 1;
    }
    digits > 0 && chars.get(i) == Some(&'}')
}

/// Rewrites `pattern` so that the `regex` crate gives it POSIX meaning.
///
/// In basic syntax `\( \) \{ \} \| \+ \?` are operators and their bare forms
/// are literals; a leading `*` is literal; `^` and `$` anchor only at the
/// edges of an expression. In extended syntax only bracket expressions and
/// stray braces need rewriting. Backreferences are passed through and
/// rejected later by the regex compiler.
pub fn translate(pattern: &str, extended: bool) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut at_start = true;
    let mut interval_open = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let mut next_at_start = false;

        match c {
            '\\' => {
                let Some(&e) = chars.get(i + 1) else {
                    out.push('\\');
                    break;
                };
                i += 1;
                match e {
                    '(' | ')' | '{' | '}' | '|' | '+' | '?' if !extended => {
                        out.push(e);
                        next_at_start = e == '(' || e == '|';
                    }
                    '`' => out.push_str("\\A"),
                    '\'' => out.push_str("\\z"),
                    '1'..='9' => {
                        out.push('\\');
                        out.push(e);
                    }
                    e if CLASS_ESCAPES.contains(&e) => {
                        out.push('\\');
                        out.push(e);
                    }
                    e => push_literal(&mut out, e),
                }
            }
            '[' => match bracket(&chars, i) {
                Some((class, next)) => {
                    out.push_str(&class);
                    i = next;
                    at_start = false;
                    continue;
                }
                None => out.push('['),
            },
            '*' if at_start => out.push_str("\\*"),
            '+' | '?' if extended && at_start => push_literal(&mut out, c),
            '^' if extended || at_start => {
                out.push('^');
                next_at_start = true;
            }
            '$' if extended => out.push('$'),
            '$' => {
                let rest = &chars[i + 1..];
                let at_end = rest.is_empty()
                    || rest.starts_with(&['\\', ')'])
                    || rest.starts_with(&['\\', '|']);
                if at_end {
                    out.push('$');
                } else {
                    out.push_str("\\$");
                }
            }
            '(' | '|' if extended => {
                out.push(c);
                next_at_start = true;
            }
            '{' if extended && !at_start && is_interval(&chars, i) => {
                out.push('{');
                interval_open = true;
            }
            '}' if extended && interval_open => {
                out.push('}');
                interval_open = false;
            }
            ')' | '+' | '?' | '*' | '.' if extended => out.push(c),
            '*' | '.' => out.push(c),
            c => push_literal(&mut out, c),
        }

        at_start = next_at_start;
        i += 1;
    }

    out
}
