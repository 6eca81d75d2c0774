//! Data model shared by the language holder, the coordinator and the repository.
//!
//! - `part`: translation parts (prefix + flat key/template map) and batches of them
//! - `text`: lookup requests (key plus optional named parameters)
//! - `event`: change notification tags

mod event;
mod part;
mod text;

pub use event::TranslationEvent;
pub use part::{
    merge_part, qualify, PartBatch, TranslationCollectedMap, TranslationPart,
    TranslationStringMap,
};
pub use text::TranslatorText;
