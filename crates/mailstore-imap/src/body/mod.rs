//! Message MIME structure and part lookup.

mod locate;
mod structure;

pub use locate::{PartTarget, SectionPath, ignorable, locate, normalize_content_id};
pub use structure::{BodyFields, BodyStructure};
