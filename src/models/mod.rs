pub mod artwork;
pub mod listing;

pub use artwork::*;
pub use listing::*;

// Canonical spec keys
pub const SPEC_MEDIUM: &str = "medium";
pub const SPEC_DIMENSIONS: &str = "dimensions";
pub const SPEC_STYLE: &str = "style";
pub const SPEC_FRAMING: &str = "framing";
