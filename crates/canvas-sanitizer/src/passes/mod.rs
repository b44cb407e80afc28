//! The individual repairs, in the order the sanitizer applies them.

mod fences;
mod helpers;
mod imports;
mod prose;
mod types;

pub use fences::strip_fences;
pub use helpers::nest_helpers;
pub use imports::{remove_external_imports, ImportRemoval};
pub use prose::{strip_trailing_prose, ProseRemoval};
pub use types::strip_type_annotations;
