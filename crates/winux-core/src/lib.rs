pub mod commands;
pub mod diff;
pub mod error;
pub mod matcher;
pub mod records;
pub mod types;

pub use commands::CommandIo;
pub use error::{Error, Result};
pub use matcher::{LineMatcher, Pattern};
pub use types::{Edit, Hunk, HunkLine, MatchOptions, MatchSpan, PatternMode};
