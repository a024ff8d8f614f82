pub mod line;
pub mod syntax;
pub mod wildcard;

pub use line::{find_matches, LineMatcher, Pattern};
