//! Rendering documents and sections for inspection.

mod json;
mod text;

pub use json::{sections_to_json, to_json, JsonFormat};
pub use text::to_text;
