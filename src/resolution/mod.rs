//! Turning directory objects, or raw input, into permissions.
//!
//! The pipeline runs in three steps:
//!
//! 1. [`bypass`] decides whether the request can be answered from the input
//!    alone (always-resolve mode or a bypass prefix).
//! 2. Otherwise [`results`] matches the objects returned by the directory
//!    against the configs of the request and deduplicates the permissions.
//! 3. [`format`] builds the picker entities shown to the user.

pub mod bypass;
pub mod format;
pub mod matching;
pub mod results;

pub use bypass::resolve_without_lookup;
pub use format::{create_picker_entity, format_permission_display_text};
pub use results::{ResolvedEntity, config_value, process_directory_results};
