//! Pattern tables and rotation.

pub mod library;
pub mod selector;

pub use library::PatternLibrary;
pub use selector::PatternSelector;
