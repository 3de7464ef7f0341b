pub mod cancel;
pub mod enumerator;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use enumerator::{BracketEnumerator, RunLimits};
