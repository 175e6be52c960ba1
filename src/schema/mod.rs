//! Schema module - Canonical model shared by every input format

pub mod models;
pub mod slug;

// Re-export key types
pub use models::{CanonicalSchema, Component, LogicUnit, Message, Model};
pub use slug::slugify;
