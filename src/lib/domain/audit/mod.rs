pub mod sentinel;

pub use sentinel::{DEFAULT_SENTINEL, SentinelCount, SentinelReport, detect_sentinel};
