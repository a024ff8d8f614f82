//! Shell-style wildcard matching for file names (`*`, `?`, `[...]`).

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(char),
    AnyChar,
    AnyRun,
    Class { items: Vec<ClassItem>, negated: bool },
}

#[derive(Debug, Clone, PartialEq)]
enum ClassItem {
    Single(char),
    Range(char, char),
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyChar => true,
            Token::AnyRun => false,
            Token::Class { items, negated } => {
                let hit = items.iter().any(|item| match *item {
                    ClassItem::Single(s) => s == c,
                    ClassItem::Range(lo, hi) => lo <= c && c <= hi,
                });
                hit != *negated
            }
        }
    }
}

fn tokenize(pattern: &[char]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut i = 0;
    while i < pattern.len() {
        match pattern[i] {
            '*' => {
                while i < pattern.len() && pattern[i] == '*' {
                    i += 1;
                }
                tokens.push(Token::AnyRun);
                continue;
            }
            '?' => tokens.push(Token::AnyChar),
            '[' => {
                let close = pattern[i + 1..].iter().position(|&c| c == ']');
                match close {
                    Some(offset) => {
                        let end = i + 1 + offset;
                        tokens.push(parse_class(&pattern[i + 1..end]));
                        i = end + 1;
                        continue;
                    }
                    None => tokens.push(Token::Literal('[')),
                }
            }
            c => tokens.push(Token::Literal(c)),
        }
        i += 1;
    }
    tokens
}

fn parse_class(content: &[char]) -> Token {
    let (negated, content) = match content.first() {
        Some('^') | Some('!') => (true, &content[1..]),
        _ => (false, content),
    };

    let mut items = Vec::new();
    let mut i = 0;
    while i < content.len() {
        if i + 2 < content.len() && content[i + 1] == '-' {
            items.push(ClassItem::Range(content[i], content[i + 2]));
            i += 3;
        } else {
            items.push(ClassItem::Single(content[i]));
            i += 1;
        }
    }
    Token::Class { items, negated }
}

/// Returns whether `text` matches the whole of `pattern`.
///
/// With `ignore_case`, both sides are ASCII-lowercased first. A `[` with no
/// closing `]` is an ordinary character.
pub fn matches(pattern: &str, text: &str, ignore_case: bool) -> bool {
    let fold = |s: &str| -> Vec<char> {
        if ignore_case {
            s.chars().map(|c| c.to_ascii_lowercase()).collect()
        } else {
            s.chars().collect()
        }
    };
    let tokens = tokenize(&fold(pattern));
    let text = fold(text);

    // Every token except `*` consumes exactly one char, so remembering only
    // the latest star and retrying it one char further is enough.
    let (mut ti, mut si) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while si < text.len() {
        match tokens.get(ti) {
            Some(Token::AnyRun) => {
                star = Some((ti + 1, si));
                ti += 1;
            }
            Some(token) if token.matches(text[si]) => {
                ti += 1;
                si += 1;
            }
            _ => match star {
                Some((resume, from)) => {
                    ti = resume;
                    si = from + 1;
                    star = Some((resume, from + 1));
                }
                None => return false,
            },
        }
    }

    tokens[ti..].iter().all(|t| *t == Token::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_patterns() {
        assert!(matches("*.cpp", "main.cpp", false));
        assert!(!matches("*.cpp", "main.CPP", false));
        assert!(matches("*.cpp", "main.CPP", true));
        assert!(!matches("*.cpp", "main.cpp.bak", false));
    }

    #[test]
    fn test_question_mark() {
        assert!(matches("a?c", "abc", false));
        assert!(!matches("a?c", "ac", false));
        assert!(!matches("a?c", "abbc", false));
    }

    #[test]
    fn test_empty_pattern_and_text() {
        assert!(matches("", "", false));
        assert!(!matches("", "a", false));
        assert!(matches("*", "", false));
        assert!(matches("**", "anything", false));
        assert!(!matches("a", "", false));
    }

    #[test]
    fn test_star_backtracking() {
        assert!(matches("a*b*c", "axxbyyc", false));
        assert!(matches("*ab", "aab", false));
        assert!(matches("*a*", "banana", false));
        assert!(!matches("a*b", "ac", false));
        assert!(matches("README*", "README.md", false));
        assert!(!matches("*x", "xxxy", false));
    }

    #[test]
    fn test_character_classes() {
        assert!(matches("file[0-9].txt", "file7.txt", false));
        assert!(!matches("file[0-9].txt", "filex.txt", false));
        assert!(matches("[abc]*", "cat", false));
        assert!(!matches("[^abc]*", "cat", false));
        assert!(matches("[!abc]*", "dog", false));
        assert!(matches("[A-Z]*", "readme", true));
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        assert!(matches("[abc", "[abc", false));
        assert!(!matches("[abc", "a", false));
        assert!(matches("x[*", "x[yz", false));
    }

    #[test]
    fn test_many_stars_do_not_blow_up() {
        let pattern = "*".repeat(64) + "x";
        let text = "a".repeat(10_000);
        assert!(!matches(&pattern, &text, false));
        assert!(matches(&pattern, &(text + "x"), false));
    }
}
