//! Rendering - Templates and documentation output

pub mod docs;
pub mod template;

pub use docs::{DocGenerator, DocReport};
pub use template::Template;
