pub mod hunks;
pub mod lcs;
pub mod normal;

pub use lcs::diff;
