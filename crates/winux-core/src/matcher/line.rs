//! Line matching for grep: fixed strings and basic/extended regular
//! expressions with word and whole-line constraints.

use super::syntax;
use crate::error::{Error, Result};
use crate::types::{MatchOptions, MatchSpan, PatternMode};
use log::debug;
use regex::bytes::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
pub struct CompiledRegex {
    search: Regex,
    whole: Regex,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub raw: String,
    pub lowered: String,
    pub compiled: Option<CompiledRegex>,
}

fn build_regex(source: &str, ignore_case: bool, raw: &str) -> Result<Regex> {
    // Byte semantics: `.` and negated classes match any byte, including
    // bytes that are not valid UTF-8. Case folding is ASCII only.
    RegexBuilder::new(source)
        .unicode(false)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| Error::InvalidPattern {
            pattern: raw.to_string(),
            message: e.to_string(),
        })
}

impl Pattern {
    /// Builds a pattern. Regex modes compile here so a bad expression is
    /// reported before any input is read.
    pub fn compile(mode: PatternMode, ignore_case: bool, raw: &str) -> Result<Self> {
        let lowered = raw.to_ascii_lowercase();
        let compiled = match mode {
            PatternMode::Fixed => None,
            PatternMode::BasicRegex | PatternMode::ExtendedRegex => {
                let source = syntax::translate(raw, mode == PatternMode::ExtendedRegex);
                debug!("compiled {:?} as {:?}", raw, source);
                let search = build_regex(&source, ignore_case, raw)?;
                let whole = build_regex(&format!(r"\A(?:{})\z", source), ignore_case, raw)?;
                Some(CompiledRegex { search, whole })
            }
        };
        Ok(Self {
            raw: raw.to_string(),
            lowered,
            compiled,
        })
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn word_boundary_ok(line: &[u8], span: MatchSpan) -> bool {
    let left_ok = span.begin == 0 || !is_word_byte(line[span.begin - 1]);
    let right_ok = span.end >= line.len() || !is_word_byte(line[span.end]);
    left_ok && right_ok
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn fixed_matches(
    line: &[u8],
    folded: Option<&[u8]>,
    pattern: &Pattern,
    options: &MatchOptions,
    out: &mut Vec<MatchSpan>,
) {
    let (haystack, needle) = match folded {
        Some(lowered) => (lowered, pattern.lowered.as_bytes()),
        None => (line, pattern.raw.as_bytes()),
    };

    if options.line_regexp {
        if haystack == needle {
            out.push(MatchSpan::new(0, line.len()));
        }
        return;
    }

    let mut cursor = 0;
    while let Some(pos) = find_from(haystack, needle, cursor) {
        let span = MatchSpan::new(pos, pos + needle.len());
        if !options.word_regexp || word_boundary_ok(line, span) {
            out.push(span);
        }
        cursor = pos + 1;
    }
}

fn regex_matches(
    line: &[u8],
    compiled: &CompiledRegex,
    options: &MatchOptions,
    out: &mut Vec<MatchSpan>,
) {
    if options.line_regexp {
        if compiled.whole.is_match(line) {
            out.push(MatchSpan::new(0, line.len()));
        }
        return;
    }

    for m in compiled.search.find_iter(line) {
        if m.start() == m.end() {
            continue;
        }
        let span = MatchSpan::new(m.start(), m.end());
        if !options.word_regexp || word_boundary_ok(line, span) {
            out.push(span);
        }
    }
}

/// Collects the spans of every pattern in `line`, sorted by `(begin, end)`
/// with exact duplicates removed.
pub fn find_matches(
    line: &[u8],
    patterns: &[Pattern],
    options: &MatchOptions,
) -> Vec<MatchSpan> {
    let mut out = Vec::new();
    let mut lowered_line: Option<Vec<u8>> = None;

    for pattern in patterns {
        match (&pattern.compiled, options.mode) {
            (_, PatternMode::Fixed) => {
                let folded = if options.ignore_case {
                    let lowered = lowered_line.get_or_insert_with(|| line.to_ascii_lowercase());
                    Some(lowered.as_slice())
                } else {
                    None
                };
                fixed_matches(line, folded, pattern, options, &mut out);
            }
            (Some(compiled), _) => regex_matches(line, compiled, options, &mut out),
            (None, _) => {}
        }
    }

    out.sort_unstable();
    out.dedup();
    out
}

/// A compiled pattern list together with the options it was built for.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    patterns: Vec<Pattern>,
    options: MatchOptions,
}

impl LineMatcher {
    pub fn new<S: AsRef<str>>(raw_patterns: &[S], options: MatchOptions) -> Result<Self> {
        let patterns = raw_patterns
            .iter()
            .map(|raw| Pattern::compile(options.mode, options.ignore_case, raw.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns, options })
    }

    pub fn find_matches(&self, line: &[u8]) -> Vec<MatchSpan> {
        find_matches(line, &self.patterns, &self.options)
    }

    pub fn is_selected(&self, line: &[u8], invert: bool) -> bool {
        self.find_matches(line).is_empty() == invert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn options(mode: PatternMode) -> MatchOptions {
        MatchOptions {
            mode,
            ..Default::default()
        }
    }

    fn spans(patterns: &[&str], opts: MatchOptions, line: &str) -> Vec<(usize, usize)> {
        let matcher = LineMatcher::new(patterns, opts).unwrap();
        matcher
            .find_matches(line.as_bytes())
            .into_iter()
            .map(|s| (s.begin, s.end))
            .collect()
    }

    #[test]
    fn test_fixed_finds_overlapping_occurrences() {
        assert_eq!(
            spans(&["aa"], options(PatternMode::Fixed), "aaa"),
            vec![(0, 2), (1, 3)]
        );
    }

    #[test]
    fn test_fixed_ignore_case_and_line_regexp() {
        let mut opts = options(PatternMode::Fixed);
        opts.ignore_case = true;
        assert_eq!(spans(&["HeLLo"], opts, "say hello"), vec![(4, 9)]);

        opts.line_regexp = true;
        assert_eq!(spans(&["HELLO"], opts, "hello"), vec![(0, 5)]);
        assert!(spans(&["HELLO"], opts, "hello!").is_empty());
    }

    #[test]
    fn test_fixed_treats_metacharacters_literally() {
        assert_eq!(
            spans(&["a.c"], options(PatternMode::Fixed), "abc a.c"),
            vec![(4, 7)]
        );
    }

    #[test]
    fn test_empty_fixed_pattern_selects_every_line() {
        let matcher = LineMatcher::new(&[""], options(PatternMode::Fixed)).unwrap();
        assert!(matcher.is_selected(b"", false));
        assert!(matcher.is_selected(b"anything", false));
    }

    #[test]
    fn test_word_regexp_filters_embedded_matches() {
        for mode in [
            PatternMode::Fixed,
            PatternMode::BasicRegex,
            PatternMode::ExtendedRegex,
        ] {
            let mut opts = options(mode);
            opts.word_regexp = true;
            assert!(spans(&["cat"], opts, "concatenate").is_empty());
            assert_eq!(spans(&["cat"], opts, "the cat sat"), vec![(4, 7)]);
            assert_eq!(spans(&["cat"], opts, "cat_food cat"), vec![(9, 12)]);
        }
    }

    #[test]
    fn test_regex_skips_zero_length_matches() {
        let opts = options(PatternMode::BasicRegex);
        assert!(spans(&["x*"], opts, "abc").is_empty());
        assert_eq!(spans(&["x*"], opts, "axxb"), vec![(1, 3)]);
    }

    #[test]
    fn test_regex_line_regexp_uses_whole_line() {
        let mut opts = options(PatternMode::ExtendedRegex);
        opts.line_regexp = true;
        assert_eq!(spans(&["a|ab"], opts, "ab"), vec![(0, 2)]);
        assert!(spans(&["a|ab"], opts, "abc").is_empty());
    }

    #[test]
    fn test_basic_and_extended_syntax_differ() {
        let basic = options(PatternMode::BasicRegex);
        let extended = options(PatternMode::ExtendedRegex);
        assert_eq!(spans(&["a+"], basic, "aa a+"), vec![(3, 5)]);
        assert_eq!(spans(&["a+"], extended, "aa a+"), vec![(0, 2), (3, 4)]);
        assert_eq!(spans(&[r"\(ab\)\{2\}"], basic, "xabab"), vec![(1, 5)]);
    }

    #[test]
    fn test_regex_ignore_case() {
        let mut opts = options(PatternMode::ExtendedRegex);
        opts.ignore_case = true;
        assert_eq!(spans(&["foo|bar"], opts, "FOO Bar"), vec![(0, 3), (4, 7)]);
    }

    #[test]
    fn test_spans_from_all_patterns_are_sorted_and_unique() {
        let found = spans(&["b", "ab", "b"], options(PatternMode::Fixed), "abab");
        assert_eq!(found, vec![(0, 2), (1, 2), (2, 4), (3, 4)]);
        for w in found.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_invalid_pattern_fails_at_compile_time() {
        let err =
            LineMatcher::new(&["ok", "a\\("], options(PatternMode::BasicRegex)).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "a\\("));
        assert!(LineMatcher::new(&["(a"], options(PatternMode::ExtendedRegex)).is_err());
        assert!(LineMatcher::new(&["(a"], options(PatternMode::Fixed)).is_ok());
    }

    #[test]
    fn test_selection_respects_invert() {
        let matcher = LineMatcher::new(&["needle"], options(PatternMode::Fixed)).unwrap();
        assert!(matcher.is_selected(b"a needle here", false));
        assert!(!matcher.is_selected(b"a needle here", true));
        assert!(matcher.is_selected(b"hay", true));
    }

    #[test]
    fn test_non_utf8_input() {
        let matcher = LineMatcher::new(&["ab"], options(PatternMode::ExtendedRegex)).unwrap();
        let line = [0xffu8, b'a', b'b', 0xfe];
        assert_eq!(matcher.find_matches(&line), vec![MatchSpan::new(1, 3)]);
    }

    #[test]
    fn test_dot_and_negated_class_match_invalid_utf8_bytes() {
        for mode in [PatternMode::BasicRegex, PatternMode::ExtendedRegex] {
            let matcher = LineMatcher::new(&["a.b"], options(mode)).unwrap();
            assert_eq!(matcher.find_matches(b"a\xffb"), vec![MatchSpan::new(0, 3)]);
            let matcher = LineMatcher::new(&["a[^x]b"], options(mode)).unwrap();
            assert_eq!(matcher.find_matches(b"a\xfeb"), vec![MatchSpan::new(0, 3)]);
        }
    }

    #[test]
    fn test_non_ascii_literal_still_matches_its_utf8_bytes() {
        let matcher = LineMatcher::new(&["café"], options(PatternMode::BasicRegex)).unwrap();
        assert_eq!(
            matcher.find_matches("un café".as_bytes()),
            vec![MatchSpan::new(3, 8)]
        );
    }

    fn line_strategy() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(
            prop_oneof![Just(b'a'), Just(b'b'), Just(b' '), any::<u8>()],
            0..24,
        )
    }

    fn check_spans(line: &[u8], found: &[MatchSpan]) -> std::result::Result<(), TestCaseError> {
        for span in found {
            prop_assert!(span.begin <= span.end && span.end <= line.len());
        }
        for pair in found.windows(2) {
            prop_assert!(pair[0] < pair[1], "{:?} not before {:?}", pair[0], pair[1]);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn fixed_spans_are_valid_sorted_and_unique(
            patterns in prop::collection::vec("[ab]{0,3}", 1..4),
            line in line_strategy(),
            ignore_case in any::<bool>(),
            word_regexp in any::<bool>(),
        ) {
            let opts = MatchOptions {
                mode: PatternMode::Fixed,
                ignore_case,
                word_regexp,
                line_regexp: false,
            };
            let matcher = LineMatcher::new(&patterns, opts).unwrap();
            let found = matcher.find_matches(&line);
            check_spans(&line, &found)?;
            for span in &found {
                let text = &line[span.begin..span.end];
                let hit = patterns.iter().any(|p| {
                    if ignore_case {
                        text.eq_ignore_ascii_case(p.as_bytes())
                    } else {
                        text == p.as_bytes()
                    }
                });
                prop_assert!(hit);
            }
        }

        #[test]
        fn regex_spans_are_valid_sorted_unique_and_non_empty(
            patterns in prop::collection::vec("[ab.]{1,3}\\*?", 1..4),
            line in line_strategy(),
            extended in any::<bool>(),
            word_regexp in any::<bool>(),
        ) {
            let mode = if extended {
                PatternMode::ExtendedRegex
            } else {
                PatternMode::BasicRegex
            };
            let opts = MatchOptions {
                mode,
                word_regexp,
                ..MatchOptions::default()
            };
            let matcher = LineMatcher::new(&patterns, opts).unwrap();
            let found = matcher.find_matches(&line);
            check_spans(&line, &found)?;
            prop_assert!(found.iter().all(|s| !s.is_empty()));
        }
    }
}
