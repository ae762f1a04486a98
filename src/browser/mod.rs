//! Browser session lifecycle and the evaluation capability used by the extractors.

pub mod evaluate;
pub mod scripts;
pub mod session;

pub use evaluate::{Evaluate, evaluate_as};
pub use scripts::Script;
pub use session::{PageSession, settle};
