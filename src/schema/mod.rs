//! OTG OpenAPI schema access
//!
//! Bundled schema documents per API version, component lookup and
//! structural validation of request payloads.

mod document;
mod registry;
mod validate;

pub use document::SchemaDocument;
pub use registry::{display_version, normalize_version, SchemaRegistry};
pub use validate::{lookup_ref, validate_value, Violation};
