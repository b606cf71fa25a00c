pub mod input;
pub mod render;
pub mod setup;
pub mod summary;

pub use input::{InputKind, load_input};
pub use setup::setup_logging;
pub use summary::{RunSummary, log_summary};
