pub mod roster_extractor;
pub mod viewer_driver;

pub use roster_extractor::RosterExtractor;
pub use viewer_driver::{ViewerDriver, ViewerDriverFactory};
