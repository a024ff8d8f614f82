use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternMode {
    #[default]
    BasicRegex,
    ExtendedRegex,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    pub mode: PatternMode,
    pub ignore_case: bool,
    pub word_regexp: bool,
    pub line_regexp: bool,
}

/// Half-open byte range `[begin, end)` inside a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchSpan {
    pub begin: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// One step of an edit script turning file1 into file2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Keep { old: usize, new: usize },
    Delete { old: usize },
    Insert { new: usize },
}

impl Edit {
    pub fn is_change(&self) -> bool {
        !matches!(self, Edit::Keep { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hunk {
    /// File positions (0-based) of the first edit in `edits`.
    pub start1: usize,
    pub start2: usize,
    /// Range into the edit script, context keeps included.
    pub edits: Range<usize>,
    /// Lines the hunk covers in file1 and file2.
    pub old_len: usize,
    pub new_len: usize,
}

/// One body line of a unified hunk. Line bytes are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum HunkLine {
    Context(Vec<u8>),
    Add(Vec<u8>),
    Remove(Vec<u8>),
}

impl HunkLine {
    pub fn prefix(&self) -> u8 {
        match self {
            HunkLine::Context(_) => b' ',
            HunkLine::Add(_) => b'+',
            HunkLine::Remove(_) => b'-',
        }
    }

    pub fn text(&self) -> &[u8] {
        match self {
            HunkLine::Context(s) | HunkLine::Add(s) | HunkLine::Remove(s) => s,
        }
    }
}

impl fmt::Display for HunkLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.prefix() as char,
            String::from_utf8_lossy(self.text())
        )
    }
}
