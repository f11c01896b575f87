//! Query request model and the validation/sanitization step.

pub mod model;
pub mod validate;

pub use model::{ModelVariant, QueryRequest, ReasoningEffort, Verbosity};
pub use validate::{RequestValidator, sanitize_text, truncate_if_needed};
