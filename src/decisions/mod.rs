pub mod breakdown;
pub mod extract;
pub mod motion;
pub mod powers;
pub mod text;
pub mod types;

pub use breakdown::{division_breakdowns, DivisionBreakdown, DivisionBreakdowns};
pub use extract::{analyse_vote, extract_motion, locate_vote, MotionExtraction, Speech};
pub use motion::categorise_motion;
pub use powers::is_nonaction_vote;
pub use types::*;
