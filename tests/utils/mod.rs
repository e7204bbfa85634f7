pub mod record_builders;

// Re-export main utilities for use by test files
pub use record_builders::{RecordBuilder, PATIENT, GAME};
