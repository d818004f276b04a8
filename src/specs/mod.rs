//! Spec extraction: label tables, page and payload parsing, and synthesis of
//! plausible specs when nothing can be extracted.

mod extract;
mod labels;
mod synthesize;

pub use extract::{SpecExtractor, SpecLayout, specs_from_structured};
pub(crate) use extract::{element_text, json_text, parse_selector};
pub use labels::{FieldRule, LabelTable};
pub use synthesize::synthesize_specs;
